// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process revocation store.
//!
//! Deadlines are kept on the tokio clock so TTL behaviour can be tested with
//! a paused runtime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{RevocationStore, StoreError};

/// Default interval between expired-entry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// In-memory revocation store with per-key TTL.
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    entries: RwLock<HashMap<String, Instant>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry whose deadline has passed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, deadline| *deadline > now);
        before - entries.len()
    }

    /// Number of stored entries, including ones waiting to be purged.
    pub async fn raw_len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        if ttl.is_zero() {
            return Ok(());
        }
        let deadline = Instant::now() + ttl;
        let mut entries = self.entries.write().await;
        let slot = entries.entry(key.to_string()).or_insert(deadline);
        if *slot < deadline {
            *slot = deadline;
        }
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(false),
                Some(deadline) if *deadline > now => return Ok(true),
                Some(_) => {}
            }
        }

        // Expired; drop it unless a concurrent put extended it
        let mut entries = self.entries.write().await;
        if let Some(deadline) = entries.get(key) {
            if *deadline > now {
                return Ok(true);
            }
            entries.remove(key);
        }
        Ok(false)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let live = entries.values().filter(|deadline| **deadline > now).count();
        entries.clear();
        Ok(live)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries.values().filter(|deadline| **deadline > now).count())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Background task that periodically purges expired revocation entries.
pub struct RevocationSweeper {
    store: Arc<MemoryRevocationStore>,
    interval: Duration,
}

impl RevocationSweeper {
    pub fn new(store: Arc<MemoryRevocationStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Revocation sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Revocation sweeper shutting down");
                    return;
                }
            }

            let purged = self.store.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Revocation sweeper purged expired entries");
            }
        }
    }
}
