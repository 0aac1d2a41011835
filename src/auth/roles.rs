// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account roles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The binary role flag carried by every account.
///
/// The role only decides which directory an account shows up in; it grants no
/// extra permissions and plays no part in authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Person seeking care
    Patient,
    /// Care provider, listed in the psychologist directory
    Psychologist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Psychologist => "psychologist",
        }
    }

    pub fn is_psychologist(&self) -> bool {
        matches!(self, Role::Psychologist)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Patient
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_role_is_patient() {
        assert_eq!(Role::default(), Role::Patient);
        assert!(!Role::default().is_psychologist());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Psychologist).unwrap(),
            r#""psychologist""#
        );
        let parsed: Role = serde_json::from_str(r#""patient""#).unwrap();
        assert_eq!(parsed, Role::Patient);
    }
}
