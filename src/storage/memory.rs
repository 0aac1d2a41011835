// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory stores for tests and local development.
//!
//! Data lives only as long as the process. Used when `MONGO_URI` is unset.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{sort_by_creation, AccountStore, ImageStore, StoreError, StoreResult};
use crate::{auth::Role, models::Account};

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn insert(&self, account: &Account) -> StoreResult<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail(account.email.clone()));
        }
        if accounts.contains_key(&account.id) {
            return Err(StoreError::Backend(format!(
                "duplicate account id {}",
                account.id
            )));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn replace(&self, account: &Account) -> StoreResult<()> {
        let mut accounts = self.accounts.write().await;
        if !accounts.contains_key(&account.id) {
            return Err(StoreError::NotFound(format!("Account {}", account.id)));
        }
        if accounts
            .values()
            .any(|a| a.id != account.id && a.email == account.email)
        {
            return Err(StoreError::DuplicateEmail(account.email.clone()));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        let mut matching: Vec<Account> = accounts
            .values()
            .filter(|a| a.role == role)
            .cloned()
            .collect();
        sort_by_creation(&mut matching);
        Ok(matching)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryImageStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn put(&self, _filename: &str, bytes: Vec<u8>) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.blobs.write().await.insert(id.clone(), bytes);
        Ok(id)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        match self.blobs.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("Image {id}"))),
        }
    }
}
