// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Token Gate - Bearer Token Authentication Service
//!
//! Issues HMAC-signed identity tokens, verifies them statelessly on every
//! request, enforces role requirements per route and lets tokens be revoked
//! before they expire through a shared revocation store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Token codec, revocation, gate and authorization
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup
//! - `state` - Shared application state and startup wiring

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;
