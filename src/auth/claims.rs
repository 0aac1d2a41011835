// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session claims and the authenticated session representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims embedded in a session credential.
///
/// `exp` and `iat` are stamped by the issuer and are not part of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the account email
    pub sub: String,
}

impl SessionClaims {
    pub fn for_email(email: impl Into<String>) -> Self {
        Self { sub: email.into() }
    }
}

/// A verified session, as seen by handlers.
///
/// This only proves the holder was issued a credential for `email`. Handlers
/// re-load the account from the store before using any profile data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSession {
    /// Account email (token subject)
    pub email: String,
    /// When the presented credential stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl CurrentSession {
    pub fn from_claims(claims: SessionClaims, expires_at: DateTime<Utc>) -> Self {
        Self {
            email: claims.sub,
            expires_at,
        }
    }
}
