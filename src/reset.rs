// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Password Reset Flow
//!
//! Each account is either without a pending reset or with exactly one:
//!
//! ```text
//! NoPendingReset --request_reset--> ResetPending --confirm_reset(ok)--> NoPendingReset
//!                                     |    ^
//!                                     +----+ request_reset (new code replaces old)
//! ```
//!
//! - Codes are 6 characters drawn uniformly from `[A-Za-z0-9]`.
//! - A code expires 15 minutes after it was issued. Expiry is checked lazily
//!   when the code is redeemed; nothing sweeps stale codes.
//! - A wrong guess leaves the pending code in place and there is no attempt
//!   limit.
//! - If the email cannot be sent the code stays written on the account.

use std::sync::Arc;

use chrono::Duration;
use rand::{distributions::Alphanumeric, Rng};
use tracing::{debug, info};

use crate::{
    auth::{hash_password, PasswordError},
    clock::Clock,
    email::{reset_code_message, EmailError, EmailSender},
    storage::{AccountStore, StoreError},
};

/// Length of a reset code.
pub const RESET_CODE_LEN: usize = 6;

/// How long a reset code stays redeemable.
pub fn reset_code_ttl() -> Duration {
    Duration::minutes(15)
}

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("account not found")]
    AccountNotFound,

    #[error("invalid reset code")]
    InvalidResetCode,

    #[error("reset code expired")]
    ResetCodeExpired,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to deliver reset code: {0}")]
    Delivery(#[from] EmailError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_CODE_LEN)
        .map(char::from)
        .collect()
}

fn not_found_as_missing(error: StoreError) -> ResetError {
    match error {
        StoreError::NotFound(_) => ResetError::AccountNotFound,
        other => ResetError::Store(other),
    }
}

pub struct PasswordResetFlow {
    accounts: Arc<dyn AccountStore>,
    mailer: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
}

impl PasswordResetFlow {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        mailer: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            mailer,
            clock,
        }
    }

    /// Issue a fresh code for `email`, store it, and email it.
    pub async fn request_reset(&self, email: &str) -> Result<(), ResetError> {
        let mut account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(ResetError::AccountNotFound)?;

        let code = generate_code();
        let expires_at = self.clock.now() + reset_code_ttl();
        account.begin_reset(code.as_str(), expires_at);
        self.accounts
            .replace(&account)
            .await
            .map_err(not_found_as_missing)?;

        self.mailer.send(&reset_code_message(email, &code)).await?;

        info!(account_id = %account.id, %expires_at, "Password reset code issued");
        Ok(())
    }

    /// Redeem `code` and set `new_password`.
    pub async fn confirm_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ResetError> {
        let mut account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(ResetError::AccountNotFound)?;

        let expires_at = match account.pending_reset() {
            Some((pending, expires_at)) if pending == code => expires_at,
            _ => {
                debug!(account_id = %account.id, "Reset code mismatch");
                return Err(ResetError::InvalidResetCode);
            }
        };

        if self.clock.now() > expires_at {
            debug!(account_id = %account.id, "Reset code expired");
            return Err(ResetError::ResetCodeExpired);
        }

        account.password_hash = hash_password(new_password)?;
        account.clear_reset();
        self.accounts
            .replace(&account)
            .await
            .map_err(not_found_as_missing)?;

        info!(account_id = %account.id, "Password reset completed");
        Ok(())
    }
}
