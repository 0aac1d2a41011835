// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! The persisted account document and the request/response structures used
//! by the REST API. API types derive `ToSchema` for OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Account**: the stored document, including credential and reset fields
//! - **Requests**: login, signup, password and profile payloads
//! - **Responses**: the public profile and plain message bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

// =============================================================================
// Account Document
// =============================================================================

/// Reference to a stored profile image blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileImageRef {
    /// Blob identifier in the image store
    pub id: String,
    /// MIME type the image was uploaded with
    pub content_type: String,
}

/// Account document as stored in the `user` collection.
///
/// `reset_code` and `reset_code_expiration` are only changed through
/// [`Account::begin_reset`] and [`Account::clear_reset`], so they are always
/// both set or both null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    reset_code: Option<String>,
    #[serde(default)]
    reset_code_expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profile_image: Option<ProfileImageRef>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            password_hash: password_hash.into(),
            role,
            reset_code: None,
            reset_code_expiration: None,
            profile_image: None,
            created_at,
        }
    }

    /// Record a pending reset, replacing any previous one.
    pub fn begin_reset(&mut self, code: impl Into<String>, expires_at: DateTime<Utc>) {
        self.reset_code = Some(code.into());
        self.reset_code_expiration = Some(expires_at);
    }

    /// Drop the pending reset, if any.
    pub fn clear_reset(&mut self) {
        self.reset_code = None;
        self.reset_code_expiration = None;
    }

    /// The pending reset code and its expiration.
    ///
    /// A half-written pair (only one field present) counts as no pending reset.
    pub fn pending_reset(&self) -> Option<(&str, DateTime<Utc>)> {
        match (&self.reset_code, self.reset_code_expiration) {
            (Some(code), Some(expires_at)) => Some((code.as_str(), expires_at)),
            _ => None,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Credentials for `/login` as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Credentials for `/login` as an OAuth2 password form; `username` is the email.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl From<LoginForm> for LoginRequest {
    fn from(form: LoginForm) -> Self {
        Self {
            email: form.username,
            password: form.password,
        }
    }
}

/// New account for `/signup`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    /// Defaults to `patient`
    #[serde(default)]
    pub role: Role,
}

/// Request a reset code by email.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Redeem a reset code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Change the password of the logged-in account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

// =============================================================================
// Responses
// =============================================================================

/// Public view of an account. Never includes credentials or reset state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccountProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    /// Where to fetch the profile image, when one is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            role: account.role,
            profile_image_url: account
                .profile_image
                .as_ref()
                .map(|_| format!("/users/{}/profile-image", account.id)),
        }
    }
}

impl From<Account> for AccountProfile {
    fn from(account: Account) -> Self {
        AccountProfile::from(&account)
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
