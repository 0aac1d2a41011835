// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cookie sessions backed by self-contained HS256 credentials.
//!
//! ## Auth Flow
//!
//! 1. `/login` or `/signup` checks credentials and calls
//!    [`SessionTransport::attach_session`], which mints a 7-day credential
//!    (`sub` = account email) and sets it as the `access_token` cookie.
//! 2. Later requests present the cookie. The [`Auth`] extractor calls
//!    [`SessionTransport::extract_and_verify`], which checks signature and expiry.
//! 3. Handlers re-load the account named by the session from the store.
//!
//! ## Security
//!
//! - The signing secret is loaded once at startup and never changes
//! - All session failures produce the same "log in again" response
//! - Logout only clears the cookie; there is no revocation list

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod roles;
pub mod session;
pub mod token;

pub use claims::{CurrentSession, SessionClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use password::{hash_password, verify_password, PasswordError};
pub use roles::Role;
pub use session::{CookiePolicy, SessionTransport, SESSION_COOKIE_NAME};
pub use token::{TokenError, TokenIssuer};
