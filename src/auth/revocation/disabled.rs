// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Null-object revocation store.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{RevocationStore, StoreError};

/// Store used when revocation is switched off.
///
/// Nothing is ever revoked; writes are accepted and dropped with a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRevocationStore;

#[async_trait]
impl RevocationStore for DisabledRevocationStore {
    async fn put(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
        warn!("Revocation is disabled; token stays valid until it expires");
        Ok(())
    }

    async fn contains(&self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        Ok(0)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(0)
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }
}
