// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session transport over the `access_token` cookie.
//!
//! The cookie carries the whole session: there is no server-side session
//! table. Clearing the cookie on logout only asks the browser to forget it;
//! a copy of the token keeps verifying until its own `exp`.
//!
//! ## Cookie attributes
//!
//! | Policy | Attributes |
//! |--------|------------|
//! | [`CookiePolicy::CrossSite`] (production) | `Path=/; HttpOnly; SameSite=None; Secure` |
//! | [`CookiePolicy::SameSite`] (development) | `Path=/; HttpOnly; SameSite=Lax` |
//!
//! Setting and clearing always use the same attribute set; browsers ignore a
//! deletion whose Path/SameSite/Secure differ from the original cookie.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use super::{
    claims::{CurrentSession, SessionClaims},
    token::{TokenIssuer, DEFAULT_TTL_SECS},
    AuthError,
};

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "access_token";

/// Cross-site transport attributes for the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookiePolicy {
    /// Front-end served from another origin over HTTPS
    CrossSite,
    /// Local development over plain HTTP
    SameSite,
}

impl CookiePolicy {
    fn attributes(&self) -> &'static str {
        match self {
            CookiePolicy::CrossSite => "Path=/; HttpOnly; SameSite=None; Secure",
            CookiePolicy::SameSite => "Path=/; HttpOnly; SameSite=Lax",
        }
    }
}

/// Binds issued credentials to the session cookie and reads them back.
#[derive(Clone)]
pub struct SessionTransport {
    issuer: TokenIssuer,
    policy: CookiePolicy,
}

impl SessionTransport {
    pub fn new(issuer: TokenIssuer, policy: CookiePolicy) -> Self {
        Self { issuer, policy }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Issue a 7-day credential for `email` and add it as a `Set-Cookie` header.
    pub fn attach_session(&self, headers: &mut HeaderMap, email: &str) -> Result<(), AuthError> {
        let token = self.issuer.issue_default(&SessionClaims::for_email(email))?;
        let cookie = self
            .cookie(&token, DEFAULT_TTL_SECS)
            .map_err(|e| AuthError::InternalError(format!("invalid session cookie: {e}")))?;
        headers.append(SET_COOKIE, cookie);
        Ok(())
    }

    /// Read the session cookie from a request and verify it.
    pub fn extract_and_verify(&self, headers: &HeaderMap) -> Result<CurrentSession, AuthError> {
        let token = extract_session_token(headers).ok_or(AuthError::MissingCredential)?;
        let (claims, expires_at) = self.issuer.verify_with_expiry::<SessionClaims>(&token)?;
        Ok(CurrentSession::from_claims(claims, expires_at))
    }

    /// Ask the client to drop the session cookie.
    ///
    /// This does not revoke the credential.
    pub fn clear_session(&self, headers: &mut HeaderMap) {
        if let Ok(cookie) = self.cookie("", 0) {
            headers.append(SET_COOKIE, cookie);
        }
    }

    fn cookie(&self, value: &str, max_age: i64) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={value}; Max-Age={max_age}; {}",
            self.policy.attributes()
        );
        if max_age == 0 {
            cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        }
        HeaderValue::from_str(&cookie)
    }
}

/// Find the session token among the request's `Cookie` headers.
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
