// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exhala - Patient / Psychologist Account Service
//!
//! Account registration, cookie-carried sessions, password recovery through
//! emailed one-time codes, profile updates and profile images for the Exhala
//! tele-health app.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and OpenAPI document
//! - `auth` - Session tokens, session cookie, password hashing
//! - `accounts` - Registration, login and profile operations
//! - `reset` - Password reset codes
//! - `email` - Outgoing email senders
//! - `storage` - Account and image stores (MongoDB, GridFS, in-memory)

pub mod accounts;
pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod email;
pub mod error;
pub mod models;
pub mod reset;
pub mod state;
pub mod storage;
pub mod telemetry;
