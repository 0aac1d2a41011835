// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Service
//!
//! Registration, login, profile maintenance and profile images. Sessions are
//! handled by the HTTP layer; this service only deals in accounts, keyed by
//! the email carried in the session.
//!
//! ## Duplicate emails
//!
//! Signup checks for an existing account first and reports
//! [`AccountError::EmailAlreadyRegistered`]. Two concurrent signups can both
//! pass that check; the loser is then rejected by the store's unique index
//! and gets [`AccountError::EmailConflict`]. Changing the email of an account
//! to one that is already taken also yields `EmailConflict`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    auth::{hash_password, verify_password, PasswordError, Role},
    clock::Clock,
    models::{Account, ProfileImageRef, SignupRequest, UpdateUserRequest},
    storage::{AccountStore, ImageStore, StoreError},
};

/// Largest accepted profile image, in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("account not found")]
    AccountNotFound,

    #[error("email already registered")]
    EmailAlreadyRegistered,

    #[error("email belongs to another account")]
    EmailConflict,

    #[error("incorrect email or password")]
    BadCredentials,

    #[error("{0}")]
    InvalidInput(String),

    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("image is empty")]
    EmptyImage,

    #[error("image exceeds 5 MiB")]
    ImageTooLarge,

    #[error("no profile image")]
    ImageNotFound,

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<StoreError> for AccountError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail(_) => AccountError::EmailConflict,
            StoreError::NotFound(_) => AccountError::AccountNotFound,
            other => AccountError::Store(other),
        }
    }
}

pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    images: Arc<dyn ImageStore>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        images: Arc<dyn ImageStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            images,
            clock,
        }
    }

    async fn by_email(&self, email: &str) -> Result<Account, AccountError> {
        self.accounts
            .find_by_email(email)
            .await?
            .ok_or(AccountError::AccountNotFound)
    }

    // =========================================================================
    // Registration & Credentials
    // =========================================================================

    pub async fn signup(&self, request: SignupRequest) -> Result<Account, AccountError> {
        if request.email.trim().is_empty() {
            return Err(AccountError::InvalidInput("Email is required".into()));
        }
        if request.password.is_empty() {
            return Err(AccountError::InvalidInput("Password is required".into()));
        }

        if self.accounts.find_by_email(&request.email).await?.is_some() {
            return Err(AccountError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(&request.password)?;
        let account = Account::new(
            request.name,
            request.email,
            request.phone,
            password_hash,
            request.role,
            self.clock.now(),
        );
        self.accounts.insert(&account).await?;

        info!(account_id = %account.id, role = %account.role, "Account created");
        Ok(account)
    }

    /// Check credentials. Unknown email and wrong password look the same.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            return Err(AccountError::BadCredentials);
        };

        if !password_matches(&account, password)? {
            return Err(AccountError::BadCredentials);
        }
        Ok(account)
    }

    pub async fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let mut account = self.by_email(email).await?;

        if !password_matches(&account, old_password)? {
            return Err(AccountError::BadCredentials);
        }
        if new_password.is_empty() {
            return Err(AccountError::InvalidInput("Password is required".into()));
        }

        account.password_hash = hash_password(new_password)?;
        self.accounts.replace(&account).await?;

        info!(account_id = %account.id, "Password changed");
        Ok(())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Apply the fields present in `update`.
    ///
    /// The session subject is the email, so a caller that changes it must
    /// issue a new session for the returned account.
    pub async fn update_profile(
        &self,
        email: &str,
        update: UpdateUserRequest,
    ) -> Result<Account, AccountError> {
        let mut account = self.by_email(email).await?;

        if let Some(new_email) = update.email {
            if new_email.trim().is_empty() {
                return Err(AccountError::InvalidInput("Email is required".into()));
            }
            if new_email != account.email {
                if let Some(other) = self.accounts.find_by_email(&new_email).await? {
                    if other.id != account.id {
                        return Err(AccountError::EmailConflict);
                    }
                }
                account.email = new_email;
            }
        }
        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(phone) = update.phone {
            account.phone = phone;
        }
        if let Some(role) = update.role {
            account.role = role;
        }

        self.accounts.replace(&account).await?;
        Ok(account)
    }

    pub async fn current(&self, email: &str) -> Result<Account, AccountError> {
        self.by_email(email).await
    }

    // =========================================================================
    // Psychologist Directory
    // =========================================================================

    pub async fn list_psychologists(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.accounts.list_by_role(Role::Psychologist).await?)
    }

    /// Look up one psychologist. Patients are reported as not found.
    pub async fn psychologist(&self, id: &str) -> Result<Account, AccountError> {
        match self.accounts.find_by_id(id).await? {
            Some(account) if account.role.is_psychologist() => Ok(account),
            _ => Err(AccountError::AccountNotFound),
        }
    }

    // =========================================================================
    // Profile Images
    // =========================================================================

    /// Store a new profile image, replacing any previous one.
    pub async fn set_profile_image(
        &self,
        email: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Account, AccountError> {
        if !content_type.starts_with("image/") {
            return Err(AccountError::UnsupportedImageType(content_type.to_string()));
        }
        if bytes.is_empty() {
            return Err(AccountError::EmptyImage);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AccountError::ImageTooLarge);
        }

        let mut account = self.by_email(email).await?;
        let filename = format!("{}-profile", account.id);
        let blob_id = self.images.put(&filename, bytes).await?;

        let previous = account.profile_image.replace(ProfileImageRef {
            id: blob_id.clone(),
            content_type: content_type.to_string(),
        });

        if let Err(e) = self.accounts.replace(&account).await {
            if let Err(cleanup) = self.images.delete(&blob_id).await {
                warn!(blob_id = %blob_id, error = %cleanup, "Failed to remove orphaned image");
            }
            return Err(e.into());
        }

        if let Some(old) = previous {
            self.discard_blob(&old.id).await;
        }

        info!(account_id = %account.id, "Profile image updated");
        Ok(account)
    }

    /// Image bytes and content type for the account with `account_id`.
    pub async fn profile_image(
        &self,
        account_id: &str,
    ) -> Result<(String, Vec<u8>), AccountError> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AccountError::AccountNotFound)?;
        let image = account.profile_image.ok_or(AccountError::ImageNotFound)?;

        let bytes = self
            .images
            .get(&image.id)
            .await?
            .ok_or(AccountError::ImageNotFound)?;
        Ok((image.content_type, bytes))
    }

    pub async fn remove_profile_image(&self, email: &str) -> Result<Account, AccountError> {
        let mut account = self.by_email(email).await?;
        let image = account
            .profile_image
            .take()
            .ok_or(AccountError::ImageNotFound)?;

        self.accounts.replace(&account).await?;
        self.discard_blob(&image.id).await;

        info!(account_id = %account.id, "Profile image removed");
        Ok(account)
    }

    /// Delete a blob that is no longer referenced. Failures only leave garbage.
    async fn discard_blob(&self, blob_id: &str) {
        match self.images.delete(blob_id).await {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(e) => warn!(blob_id = %blob_id, error = %e, "Failed to delete image blob"),
        }
    }
}

/// A stored hash argon2 cannot parse (such as a legacy bcrypt hash) never
/// matches; the account holder has to recover the password.
fn password_matches(account: &Account, password: &str) -> Result<bool, AccountError> {
    match verify_password(password, &account.password_hash) {
        Ok(matches) => Ok(matches),
        Err(PasswordError::MalformedHash(reason)) => {
            warn!(account_id = %account.id, %reason, "Stored password hash is not argon2");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        storage::{MemoryAccountStore, MemoryImageStore},
    };
    use chrono::Utc;

    struct Harness {
        images: Arc<MemoryImageStore>,
        service: AccountService,
    }

    fn harness() -> Harness {
        let images = Arc::new(MemoryImageStore::new());
        let service = AccountService::new(
            Arc::new(MemoryAccountStore::new()),
            images.clone(),
            Arc::new(ManualClock::starting_now()),
        );
        Harness { images, service }
    }

    fn signup(email: &str, role: Role) -> SignupRequest {
        SignupRequest {
            name: "Ana".into(),
            email: email.into(),
            phone: "600".into(),
            password: "secret-pw".into(),
            role,
        }
    }

    #[tokio::test]
    async fn signup_then_login() {
        let h = harness();
        let created = h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();
        assert_ne!(created.password_hash, "secret-pw");

        let logged_in = h.service.login("a@x.com", "secret-pw").await.unwrap();
        assert_eq!(logged_in.id, created.id);
    }

    #[tokio::test]
    async fn legacy_hash_is_a_bad_credential() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = AccountService::new(
            store.clone(),
            Arc::new(MemoryImageStore::new()),
            Arc::new(ManualClock::starting_now()),
        );
        let legacy = Account::new(
            "Ana",
            "a@x.com",
            "600",
            "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW",
            Role::Patient,
            Utc::now(),
        );
        store.insert(&legacy).await.unwrap();

        assert!(matches!(
            service.login("a@x.com", "secret-pw").await,
            Err(AccountError::BadCredentials)
        ));
        assert!(matches!(
            service.change_password("a@x.com", "secret-pw", "new-pw").await,
            Err(AccountError::BadCredentials)
        ));
    }

    #[tokio::test]
    async fn signup_rejects_existing_email() {
        let h = harness();
        h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();

        let result = h.service.signup(signup("a@x.com", Role::Psychologist)).await;
        assert!(matches!(result, Err(AccountError::EmailAlreadyRegistered)));
    }

    #[tokio::test]
    async fn signup_requires_email_and_password() {
        let h = harness();
        let mut request = signup("", Role::Patient);
        assert!(matches!(
            h.service.signup(request.clone()).await,
            Err(AccountError::InvalidInput(_))
        ));

        request.email = "a@x.com".into();
        request.password = String::new();
        assert!(matches!(
            h.service.signup(request).await,
            Err(AccountError::InvalidInput(_))
        ));
    }

    #[test]
    fn unique_index_violation_is_a_conflict() {
        let error = AccountError::from(StoreError::DuplicateEmail("a@x.com".into()));
        assert!(matches!(error, AccountError::EmailConflict));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let h = harness();
        h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();

        let wrong_password = h.service.login("a@x.com", "nope").await.unwrap_err();
        let unknown_email = h.service.login("b@x.com", "secret-pw").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AccountError::BadCredentials));
    }

    #[tokio::test]
    async fn change_password_checks_old_password() {
        let h = harness();
        h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();

        let result = h.service.change_password("a@x.com", "wrong", "next-pw").await;
        assert!(matches!(result, Err(AccountError::BadCredentials)));

        h.service
            .change_password("a@x.com", "secret-pw", "next-pw")
            .await
            .unwrap();
        assert!(h.service.login("a@x.com", "next-pw").await.is_ok());
        assert!(h.service.login("a@x.com", "secret-pw").await.is_err());
    }

    #[tokio::test]
    async fn update_profile_applies_present_fields() {
        let h = harness();
        h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();

        let updated = h
            .service
            .update_profile(
                "a@x.com",
                UpdateUserRequest {
                    name: Some("Ana María".into()),
                    role: Some(Role::Psychologist),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ana María");
        assert_eq!(updated.phone, "600");
        assert_eq!(updated.role, Role::Psychologist);
    }

    #[tokio::test]
    async fn update_profile_email_change_and_conflict() {
        let h = harness();
        h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();
        h.service.signup(signup("b@x.com", Role::Patient)).await.unwrap();

        let taken = UpdateUserRequest {
            email: Some("b@x.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            h.service.update_profile("a@x.com", taken).await,
            Err(AccountError::EmailConflict)
        ));

        let moved = UpdateUserRequest {
            email: Some("c@x.com".into()),
            ..Default::default()
        };
        h.service.update_profile("a@x.com", moved).await.unwrap();
        assert!(h.service.current("c@x.com").await.is_ok());
        assert!(matches!(
            h.service.current("a@x.com").await,
            Err(AccountError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn psychologist_directory() {
        let h = harness();
        let psy = h
            .service
            .signup(signup("p@x.com", Role::Psychologist))
            .await
            .unwrap();
        let patient = h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();

        let listed = h.service.list_psychologists().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, psy.id);

        assert_eq!(h.service.psychologist(&psy.id).await.unwrap().id, psy.id);
        assert!(matches!(
            h.service.psychologist(&patient.id).await,
            Err(AccountError::AccountNotFound)
        ));
        assert!(matches!(
            h.service.psychologist("missing").await,
            Err(AccountError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn profile_image_lifecycle() {
        let h = harness();
        let account = h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();

        assert!(matches!(
            h.service.profile_image(&account.id).await,
            Err(AccountError::ImageNotFound)
        ));

        h.service
            .set_profile_image("a@x.com", "image/png", vec![1, 2, 3])
            .await
            .unwrap();
        h.service
            .set_profile_image("a@x.com", "image/jpeg", vec![4, 5])
            .await
            .unwrap();
        assert_eq!(h.images.len().await, 1);

        let (content_type, bytes) = h.service.profile_image(&account.id).await.unwrap();
        assert_eq!(content_type, "image/jpeg");
        assert_eq!(bytes, vec![4, 5]);

        h.service.remove_profile_image("a@x.com").await.unwrap();
        assert_eq!(h.images.len().await, 0);
        assert!(matches!(
            h.service.remove_profile_image("a@x.com").await,
            Err(AccountError::ImageNotFound)
        ));
    }

    #[tokio::test]
    async fn profile_image_validation() {
        let h = harness();
        h.service.signup(signup("a@x.com", Role::Patient)).await.unwrap();

        assert!(matches!(
            h.service
                .set_profile_image("a@x.com", "application/pdf", vec![1])
                .await,
            Err(AccountError::UnsupportedImageType(_))
        ));
        assert!(matches!(
            h.service.set_profile_image("a@x.com", "image/png", vec![]).await,
            Err(AccountError::EmptyImage)
        ));
        assert!(matches!(
            h.service
                .set_profile_image("a@x.com", "image/png", vec![0; MAX_IMAGE_BYTES + 1])
                .await,
            Err(AccountError::ImageTooLarge)
        ));
        assert_eq!(h.images.len().await, 0);
    }
}
