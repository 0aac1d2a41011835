// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for cookie sessions.
//!
//! Use the `Auth` extractor in handlers to require a session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(session): Auth) -> impl IntoResponse {
//!     // session.email names the logged-in account
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, CurrentSession};
use crate::state::AppState;

/// Extractor for a verified session.
///
/// Reads the `access_token` cookie and verifies it. Rejections render the
/// generic "log in again" response.
pub struct Auth(pub CurrentSession);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<CurrentSession>().cloned() {
            return Ok(Auth(session));
        }

        let session = state.sessions.extract_and_verify(&parts.headers)?;
        parts.extensions.insert(session.clone());
        Ok(Auth(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionClaims;
    use axum::http::Request;
    use chrono::Utc;

    fn parts_with_cookie(cookie: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/validate-cookie");
        if let Some(cookie) = cookie {
            builder = builder.header("Cookie", cookie);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_cookie() {
        let state = AppState::for_tests();
        let mut parts = parts_with_cookie(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn auth_extractor_accepts_issued_cookie() {
        let state = AppState::for_tests();
        let token = state
            .sessions
            .issuer()
            .issue_default(&SessionClaims::for_email("a@x.com"))
            .unwrap();
        let mut parts = parts_with_cookie(Some(format!("access_token={token}")));

        let Auth(session) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.email, "a@x.com");
        assert!(parts.extensions.get::<CurrentSession>().is_some());
    }

    #[tokio::test]
    async fn auth_extractor_rejects_forged_cookie() {
        let state = AppState::for_tests();
        let mut parts = parts_with_cookie(Some("access_token=eyJhbGciOiJIUzI1NiJ9.e30.x".into()));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = AppState::for_tests();
        let mut parts = parts_with_cookie(None);
        parts.extensions.insert(CurrentSession {
            email: "cached@x.com".to_string(),
            expires_at: Utc::now(),
        });

        let Auth(session) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.email, "cached@x.com");
    }
}
