// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Revocation Store
//!
//! Shared key-value store recording revoked tokens until their natural expiry.
//!
//! ## Contract
//!
//! - Keys are token fingerprints (see [`crate::auth::fingerprint::fingerprint`])
//! - `put(key, ttl)` makes `contains(key)` true until `ttl` elapses, after
//!   which the store forgets the key without any manual cleanup
//! - All methods are safe under concurrent use; the store owns its locking
//! - `clear` and `count` walk every entry and are for admin tooling only
//!
//! ## Backends
//!
//! The backend is chosen once at startup:
//!
//! - [`MemoryRevocationStore`] - in-process map with lazy expiry plus a
//!   background [`RevocationSweeper`]
//! - [`DisabledRevocationStore`] - null object used when revocation is
//!   switched off

mod disabled;
mod memory;

use std::time::Duration;

use async_trait::async_trait;

pub use disabled::DisabledRevocationStore;
pub use memory::{MemoryRevocationStore, RevocationSweeper, DEFAULT_SWEEP_INTERVAL};

/// Revocation store failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("revocation store unreachable: {0}")]
    Unavailable(String),

    #[error("revocation store did not answer within {0:?}")]
    Timeout(Duration),
}

/// Storage interface for revoked token fingerprints.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record `key` as revoked for `ttl`.
    ///
    /// Re-revoking an existing key extends it to the later deadline.
    async fn put(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Whether `key` is currently revoked.
    async fn contains(&self, key: &str) -> Result<bool, StoreError>;

    /// Forget `key`. Removing an unknown key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Forget every key, returning how many live entries were dropped.
    async fn clear(&self) -> Result<usize, StoreError>;

    /// Number of live (unexpired) entries.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;
}
