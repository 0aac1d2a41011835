// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! MongoDB account store.
//!
//! Accounts live in the `user` collection, one document per account, keyed
//! by the UUID in `_id`. A unique index on `email` turns concurrent signups
//! for the same address into a duplicate-key error (code 11000), which is
//! reported as [`StoreError::DuplicateEmail`].

use async_trait::async_trait;
use bson::doc;
use futures_util::TryStreamExt;
use mongodb::{
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, Database, IndexModel,
};
use tracing::info;

use super::{sort_by_creation, AccountStore, StoreError, StoreResult};
use crate::{auth::Role, models::Account};

/// Collection holding account documents.
pub const ACCOUNT_COLLECTION: &str = "user";

/// MongoDB server error code for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoAccountStore {
    db: Database,
    accounts: Collection<Account>,
}

impl MongoAccountStore {
    /// Connect, check the server answers, and make sure the email index exists.
    pub async fn connect(uri: &str, db_name: &str) -> StoreResult<Self> {
        info!(database = %db_name, "Connecting to MongoDB");

        // Fail fast instead of hanging on an unreachable server.
        let timeout_uri = if uri.contains('?') {
            format!("{uri}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        } else {
            format!("{uri}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to connect to MongoDB: {e}")))?;

        let store = Self::from_database(client.database(db_name));
        store.ping().await?;
        store.ensure_indexes().await?;

        info!(database = %db_name, "Connected to MongoDB");
        Ok(store)
    }

    pub fn from_database(db: Database) -> Self {
        let accounts = db.collection::<Account>(ACCOUNT_COLLECTION);
        Self { db, accounts }
    }

    /// The underlying database, shared with the GridFS image store.
    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        let email_unique = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();

        self.accounts
            .create_index(email_unique)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to create indexes: {e}")))?;
        Ok(())
    }
}

fn is_duplicate_key(error: &MongoError) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn write_error(error: MongoError, email: &str) -> StoreError {
    if is_duplicate_key(&error) {
        StoreError::DuplicateEmail(email.to_string())
    } else {
        StoreError::Backend(error.to_string())
    }
}

fn read_error(error: MongoError) -> StoreError {
    StoreError::Backend(error.to_string())
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.accounts
            .find_one(doc! { "email": email })
            .await
            .map_err(read_error)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        self.accounts
            .find_one(doc! { "_id": id })
            .await
            .map_err(read_error)
    }

    async fn insert(&self, account: &Account) -> StoreResult<()> {
        self.accounts
            .insert_one(account)
            .await
            .map(|_| ())
            .map_err(|e| write_error(e, &account.email))
    }

    async fn replace(&self, account: &Account) -> StoreResult<()> {
        let result = self
            .accounts
            .replace_one(doc! { "_id": account.id.as_str() }, account)
            .await
            .map_err(|e| write_error(e, &account.email))?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound(format!("Account {}", account.id)));
        }
        Ok(())
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<Account>> {
        let cursor = self
            .accounts
            .find(doc! { "role": role.as_str() })
            .await
            .map_err(read_error)?;

        let mut accounts: Vec<Account> = cursor.try_collect().await.map_err(read_error)?;
        sort_by_creation(&mut accounts);
        Ok(accounts)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(format!("MongoDB ping failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn account_document_shape() {
        let account = Account::new("Ana", "a@x.com", "600", "hash", Role::Psychologist, Utc::now());
        let document = bson::to_document(&account).unwrap();

        assert_eq!(document.get_str("_id").unwrap(), account.id);
        assert_eq!(document.get_str("email").unwrap(), "a@x.com");
        assert_eq!(document.get_str("role").unwrap(), "psychologist");
        assert!(document.contains_key("reset_code"));
        assert!(document.contains_key("reset_code_expiration"));
    }

    #[test]
    fn account_document_round_trips() {
        let mut account = Account::new("Ana", "a@x.com", "600", "hash", Role::Patient, Utc::now());
        account.begin_reset("Q1w2E3", Utc::now());

        let document = bson::to_document(&account).unwrap();
        let parsed: Account = bson::from_document(document).unwrap();
        assert_eq!(parsed, account);
    }
}
