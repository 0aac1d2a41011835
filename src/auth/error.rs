// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::token::TokenError;

/// Message returned for every session failure.
///
/// Missing, invalid and expired credentials are indistinguishable to the
/// client; the variant is only kept for logging and tests.
pub const LOGIN_AGAIN: &str = "Session is missing or no longer valid, please log in again";

/// Authentication error type.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No `access_token` cookie on the request
    MissingCredential,
    /// Signature, key or structure check failed
    InvalidCredential,
    /// Credential is past its expiry
    ExpiredCredential,
    /// Credential was valid but the account it names no longer exists
    UnknownAccount,
    /// Internal error while resolving the session
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    ///
    /// All client-caused session failures share one code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential
            | AuthError::InvalidCredential
            | AuthError::ExpiredCredential
            | AuthError::UnknownAccount => "login_required",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::ExpiredCredential,
            TokenError::Invalid => AuthError::InvalidCredential,
            TokenError::Signing(msg) => AuthError::InternalError(msg),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "Session cookie is missing"),
            AuthError::InvalidCredential => write!(f, "Session credential is invalid"),
            AuthError::ExpiredCredential => write!(f, "Session credential has expired"),
            AuthError::UnknownAccount => write!(f, "Session names an unknown account"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthError::InternalError(msg) => {
                tracing::error!(error = %msg, "session resolution failed");
                "Internal server error"
            }
            other => {
                tracing::debug!(reason = %other, "session rejected");
                LOGIN_AGAIN
            }
        };
        let body = Json(AuthErrorBody {
            error: message.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
