// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence is delegated to an external document database. This module
//! only defines the calls the service makes against it, plus the backends.
//!
//! ## Backends
//!
//! | Trait | Production | Tests / local dev |
//! |-------|------------|-------------------|
//! | [`AccountStore`] | [`MongoAccountStore`] (`user` collection) | [`MemoryAccountStore`] |
//! | [`ImageStore`] | [`GridFsImageStore`] (GridFS bucket) | [`MemoryImageStore`] |
//!
//! ## Consistency
//!
//! Every write replaces a whole document. Read-then-write sequences (reset
//! confirmation, password change) rely on per-document atomicity only; there
//! is no cross-request locking. Email uniqueness is enforced by the backend
//! and surfaces as [`StoreError::DuplicateEmail`].

pub mod gridfs;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::{auth::Role, models::Account};

pub use gridfs::GridFsImageStore;
pub use memory::{MemoryAccountStore, MemoryImageStore};
pub use mongo::MongoAccountStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Create/read/update access to account documents.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>>;

    /// Insert a new account. Fails with `DuplicateEmail` if the email is taken.
    async fn insert(&self, account: &Account) -> StoreResult<()>;

    /// Replace the stored document with the same id.
    ///
    /// Fails with `NotFound` if no such document exists and with
    /// `DuplicateEmail` if the new email belongs to another account.
    async fn replace(&self, account: &Account) -> StoreResult<()>;

    /// Accounts with `role`, oldest first (see [`sort_by_creation`]).
    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<Account>>;

    /// Cheap connectivity check for health probes.
    async fn ping(&self) -> StoreResult<()>;
}

/// Binary blob storage for profile images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` and return the new blob id.
    async fn put(&self, filename: &str, bytes: Vec<u8>) -> StoreResult<String>;

    async fn get(&self, id: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Order accounts by creation instant, ties broken by id.
///
/// `created_at` is stored as an RFC 3339 string with a variable number of
/// fractional digits, so a backend's string ordering cannot be used.
pub(crate) fn sort_by_creation(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn creation_order_follows_instants_within_a_second() {
        let whole = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let at = |email: &str, created_at| {
            Account::new("Name", email, "600", "hash", Role::Psychologist, created_at)
        };
        let later = at("b@x.com", whole + Duration::milliseconds(500));
        let earlier = at("a@x.com", whole);

        // As strings the whole second sorts last: "...:00Z" > "...:00.500Z".
        assert!(earlier.created_at.to_rfc3339() > later.created_at.to_rfc3339());

        let mut accounts = vec![later.clone(), earlier.clone()];
        sort_by_creation(&mut accounts);
        assert_eq!(accounts, vec![earlier, later]);
    }
}
