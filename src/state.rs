// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    accounts::AccountService,
    auth::{CookiePolicy, SessionTransport, TokenIssuer},
    clock::Clock,
    email::EmailSender,
    reset::PasswordResetFlow,
    storage::{AccountStore, ImageStore, MemoryAccountStore, MemoryImageStore},
};

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub resets: Arc<PasswordResetFlow>,
    pub sessions: Arc<SessionTransport>,
    /// Kept for readiness probes.
    pub store: Arc<dyn AccountStore>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AccountStore>,
        images: Arc<dyn ImageStore>,
        mailer: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        secret: &[u8],
        policy: CookiePolicy,
    ) -> Self {
        let issuer = TokenIssuer::new(secret, clock.clone());
        Self {
            accounts: Arc::new(AccountService::new(store.clone(), images, clock.clone())),
            resets: Arc::new(PasswordResetFlow::new(store.clone(), mailer, clock)),
            sessions: Arc::new(SessionTransport::new(issuer, policy)),
            store,
        }
    }

    /// State backed by process-local stores.
    pub fn in_memory(
        mailer: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        secret: &[u8],
        policy: CookiePolicy,
    ) -> Self {
        Self::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::new(MemoryImageStore::new()),
            mailer,
            clock,
            secret,
            policy,
        )
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::{clock::ManualClock, email::MemoryEmailSender};

    pub const TEST_SECRET: &[u8] = b"test-secret-key";

    /// State plus handles on its fakes.
    pub struct TestApp {
        pub state: AppState,
        pub mailer: Arc<MemoryEmailSender>,
        pub clock: Arc<ManualClock>,
    }

    impl TestApp {
        pub fn new() -> Self {
            let mailer = Arc::new(MemoryEmailSender::new());
            let clock = Arc::new(ManualClock::starting_now());
            let state = AppState::in_memory(
                mailer.clone(),
                clock.clone(),
                TEST_SECRET,
                CookiePolicy::CrossSite,
            );
            Self {
                state,
                mailer,
                clock,
            }
        }
    }

    impl AppState {
        pub fn for_tests() -> Self {
            TestApp::new().state
        }
    }
}
