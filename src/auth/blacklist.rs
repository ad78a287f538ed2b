// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token blacklist on top of a [`RevocationStore`].
//!
//! Works on raw tokens, stores fingerprints, bounds every store round-trip by
//! a timeout and applies the fail-open / fail-closed policy to revocation
//! checks.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use super::error::AuthError;
use super::revocation::{RevocationStore, StoreError};
use super::fingerprint::{fingerprint, short_fingerprint};

/// Default bound on a single revocation store round-trip.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Clone)]
pub struct TokenBlacklist {
    store: Arc<dyn RevocationStore>,
    check_timeout: Duration,
    store_required: bool,
}

impl TokenBlacklist {
    pub fn new(store: Arc<dyn RevocationStore>, check_timeout: Duration, store_required: bool) -> Self {
        Self {
            store,
            check_timeout,
            store_required,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn store_required(&self) -> bool {
        self.store_required
    }

    /// Revoke `token` for `ttl`.
    pub async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), AuthError> {
        let key = fingerprint(token);
        self.bounded(self.store.put(&key, ttl))
            .await
            .map_err(|e| self.write_failed("put", token, e))
    }

    /// Whether `token` is revoked.
    ///
    /// When the store fails or times out, `strict` checks (routes with a role
    /// requirement) and deployments with a required store reject with
    /// [`AuthError::StoreUnavailable`]; everything else is admitted with a
    /// warning.
    pub async fn is_revoked(&self, token: &str, strict: bool) -> Result<bool, AuthError> {
        let key = fingerprint(token);
        match self.bounded(self.store.contains(&key)).await {
            Ok(revoked) => Ok(revoked),
            Err(e) if strict || self.store_required => {
                error!(
                    backend = self.backend(),
                    token = %short_fingerprint(token),
                    error = %e,
                    "Revocation check failed, rejecting request"
                );
                Err(AuthError::StoreUnavailable)
            }
            Err(e) => {
                warn!(
                    backend = self.backend(),
                    token = %short_fingerprint(token),
                    error = %e,
                    "Revocation check failed, admitting request"
                );
                Ok(false)
            }
        }
    }

    /// Lift the revocation of `token`.
    pub async fn remove(&self, token: &str) -> Result<(), AuthError> {
        let key = fingerprint(token);
        self.bounded(self.store.remove(&key))
            .await
            .map_err(|e| self.write_failed("remove", token, e))
    }

    /// Drop every revocation entry.
    pub async fn clear(&self) -> Result<usize, AuthError> {
        self.bounded(self.store.clear()).await.map_err(|e| {
            error!(backend = self.backend(), error = %e, "Failed to clear revocation store");
            AuthError::StoreUnavailable
        })
    }

    /// Number of currently revoked tokens.
    pub async fn count(&self) -> Result<usize, AuthError> {
        self.bounded(self.store.count()).await.map_err(|e| {
            error!(backend = self.backend(), error = %e, "Failed to count revocation entries");
            AuthError::StoreUnavailable
        })
    }

    /// One bounded round-trip to the store, for health checks.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.bounded(self.store.contains("health-check")).await.map(|_| ())
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.check_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.check_timeout)),
        }
    }

    fn write_failed(&self, op: &'static str, token: &str, e: StoreError) -> AuthError {
        error!(
            backend = self.backend(),
            op,
            token = %short_fingerprint(token),
            error = %e,
            "Revocation store write failed"
        );
        AuthError::StoreUnavailable
    }
}

impl std::fmt::Debug for TokenBlacklist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBlacklist")
            .field("backend", &self.store.backend())
            .field("check_timeout", &self.check_timeout)
            .field("store_required", &self.store_required)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::revocation::{DisabledRevocationStore, MemoryRevocationStore};
    use async_trait::async_trait;

    /// Store whose every call fails.
    pub(crate) struct FailingStore;

    #[async_trait]
    impl RevocationStore for FailingStore {
        async fn put(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn contains(&self, _key: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn clear(&self) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn count(&self) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    /// Store that answers `contains` only after a long delay.
    struct SlowStore;

    #[async_trait]
    impl RevocationStore for SlowStore {
        async fn put(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
            Ok(())
        }
        async fn contains(&self, _key: &str) -> Result<bool, StoreError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(true)
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
            "slow"
        }
    }

    fn blacklist(store: impl RevocationStore + 'static, required: bool) -> TokenBlacklist {
        TokenBlacklist::new(Arc::new(store), DEFAULT_CHECK_TIMEOUT, required)
    }

    #[tokio::test]
    async fn revoked_token_is_reported_and_can_be_removed() {
        let bl = blacklist(MemoryRevocationStore::new(), false);
        bl.revoke("token-a", Duration::from_secs(60)).await.unwrap();

        assert!(bl.is_revoked("token-a", false).await.unwrap());
        assert!(!bl.is_revoked("token-b", false).await.unwrap());
        assert_eq!(bl.count().await.unwrap(), 1);

        bl.remove("token-a").await.unwrap();
        assert!(!bl.is_revoked("token-a", false).await.unwrap());
    }

    #[tokio::test]
    async fn store_keeps_fingerprints_not_raw_tokens() {
        let store = Arc::new(MemoryRevocationStore::new());
        let bl = TokenBlacklist::new(store.clone(), DEFAULT_CHECK_TIMEOUT, false);
        bl.revoke("raw.token.value", Duration::from_secs(60)).await.unwrap();

        assert!(!store.contains("raw.token.value").await.unwrap());
        assert!(store.contains(&fingerprint("raw.token.value")).await.unwrap());
    }

    #[tokio::test]
    async fn failing_store_fails_open_on_ordinary_routes() {
        let bl = blacklist(FailingStore, false);
        assert!(!bl.is_revoked("token", false).await.unwrap());
    }

    #[tokio::test]
    async fn failing_store_fails_closed_on_strict_checks() {
        let bl = blacklist(FailingStore, false);
        assert_eq!(
            bl.is_revoked("token", true).await,
            Err(AuthError::StoreUnavailable)
        );
    }

    #[tokio::test]
    async fn failing_store_fails_closed_when_required() {
        let bl = blacklist(FailingStore, true);
        assert_eq!(
            bl.is_revoked("token", false).await,
            Err(AuthError::StoreUnavailable)
        );
    }

    #[tokio::test]
    async fn failing_store_surfaces_write_errors() {
        let bl = blacklist(FailingStore, false);
        assert_eq!(
            bl.revoke("token", Duration::from_secs(60)).await,
            Err(AuthError::StoreUnavailable)
        );
        assert_eq!(bl.count().await, Err(AuthError::StoreUnavailable));
        assert_eq!(bl.clear().await, Err(AuthError::StoreUnavailable));
        assert!(bl.health_check().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out_and_applies_policy() {
        let open = blacklist(SlowStore, false);
        assert!(!open.is_revoked("token", false).await.unwrap());

        let closed = blacklist(SlowStore, true);
        assert_eq!(
            closed.is_revoked("token", false).await,
            Err(AuthError::StoreUnavailable)
        );
    }

    #[tokio::test]
    async fn disabled_store_never_revokes() {
        let bl = blacklist(DisabledRevocationStore, true);
        bl.revoke("token", Duration::from_secs(60)).await.unwrap();
        assert!(!bl.is_revoked("token", true).await.unwrap());
        assert_eq!(bl.backend(), "disabled");
    }
}
