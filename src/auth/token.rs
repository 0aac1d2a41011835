// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed, time-limited session credentials.
//!
//! Tokens are compact HS256 JWTs. The caller's claims are flattened into the
//! payload next to `iat` and `exp` (unix seconds, UTC).
//!
//! ## Verification order
//!
//! 1. Structure and signature are checked by `jsonwebtoken`. Any failure here
//!    (bad signature, wrong key, malformed token, wrong algorithm) is
//!    [`TokenError::Invalid`].
//! 2. Expiry is checked against the injected [`Clock`], not the library's own
//!    system-time check, so issuance and verification share one UTC source.
//!    A token whose `exp` lies in the past is [`TokenError::Expired`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::clock::Clock;

/// The only algorithm tokens are signed or accepted with.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Default credential lifetime (7 days), shared with the session cookie's Max-Age.
pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("credential is invalid")]
    Invalid,

    #[error("credential has expired")]
    Expired,

    #[error("failed to sign credential: {0}")]
    Signing(String),
}

#[derive(Serialize)]
struct OutgoingClaims<'a, C> {
    #[serde(flatten)]
    claims: &'a C,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct IncomingClaims<C> {
    #[serde(flatten)]
    claims: C,
    exp: i64,
}

/// Issues and verifies session credentials with the process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            clock,
        }
    }

    /// Sign `claims` with an expiry of now + `ttl`.
    pub fn issue<C: Serialize>(&self, claims: &C, ttl: Duration) -> Result<String, TokenError> {
        let now = self.clock.now();
        let payload = OutgoingClaims {
            claims,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(ALGORITHM), &payload, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Sign `claims` with the default 7-day lifetime.
    pub fn issue_default<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        self.issue(claims, Duration::seconds(DEFAULT_TTL_SECS))
    }

    /// Check a token and return the claims it was issued with.
    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C, TokenError> {
        self.verify_with_expiry(token).map(|(claims, _)| claims)
    }

    /// Like [`verify`](Self::verify), also returning the embedded expiry.
    pub fn verify_with_expiry<C: DeserializeOwned>(
        &self,
        token: &str,
    ) -> Result<(C, DateTime<Utc>), TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<IncomingClaims<C>>(token, &self.decoding_key, &validation).map_err(
            |e| {
                tracing::debug!(error = %e, "credential rejected");
                TokenError::Invalid
            },
        )?;

        let expires_at =
            DateTime::<Utc>::from_timestamp(data.claims.exp, 0).ok_or(TokenError::Invalid)?;

        // `exp` has whole-second precision; compare at the same granularity.
        if self.clock.now().timestamp() > data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok((data.claims.claims, expires_at))
    }
}
