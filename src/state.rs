// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state and its startup wiring.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::auth::{
    blacklist::TokenBlacklist,
    clock::{Clock, SystemClock},
    codec::{TokenCodec, TokenSettings},
    directory::{DirectoryError, InMemoryUserDirectory, UserDirectory},
    gate::AuthenticationGate,
    password::{Argon2Hasher, CredentialHasher, HashError},
    policy::RoutePolicy,
    revocation::{DisabledRevocationStore, MemoryRevocationStore, RevocationStore, RevocationSweeper},
    service::AuthService,
    Role, RoleSet,
};
use crate::config::{GateConfig, RevocationBackend};

#[derive(Clone)]
pub struct AppState {
    pub gate: AuthenticationGate,
    pub auth: Arc<AuthService>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("token validity does not fit a signed duration")]
    Validity,
}

/// Everything `main` needs: the state plus the background sweeper, if the
/// backend has one.
pub struct Components {
    pub state: AppState,
    pub sweeper: Option<RevocationSweeper>,
}

/// Wires [`AppState`] from a [`GateConfig`].
pub struct AppStateBuilder {
    config: GateConfig,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn CredentialHasher>,
    directory: Option<Arc<dyn UserDirectory>>,
    store: Option<Arc<dyn RevocationStore>>,
}

impl AppStateBuilder {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            hasher: Arc::new(Argon2Hasher::new()),
            directory: None,
            store: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Use this directory instead of loading one from the configuration.
    pub fn directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Use this store instead of the configured backend.
    pub fn store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<Components, StartupError> {
        let config = &self.config;

        let validity = chrono::Duration::from_std(config.token_validity)
            .map_err(|_| StartupError::Validity)?;
        let codec = Arc::new(TokenCodec::new(
            config.signing_secret.as_bytes(),
            self.clock.clone(),
            TokenSettings {
                issuer: config.issuer.clone(),
                audience: config.audience.clone(),
                validity,
            },
        ));

        let (store, sweeper): (Arc<dyn RevocationStore>, Option<RevocationSweeper>) =
            match (self.store, config.revocation_backend) {
                (Some(store), _) => (store, None),
                (None, RevocationBackend::Memory) => {
                    let store = Arc::new(MemoryRevocationStore::new());
                    let sweeper = RevocationSweeper::new(store.clone())
                        .with_interval(config.revocation_sweep_interval);
                    (store, Some(sweeper))
                }
                (None, RevocationBackend::Disabled) => {
                    warn!("Token revocation is disabled; logout will not invalidate tokens");
                    (Arc::new(DisabledRevocationStore), None)
                }
            };
        let blacklist = TokenBlacklist::new(
            store,
            config.revocation_check_timeout,
            config.revocation_store_required,
        );

        let directory = match self.directory {
            Some(directory) => directory,
            None => Arc::new(load_directory(config, self.hasher.as_ref())?),
        };

        let policy = config
            .public_routes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>();
        let policy = RoutePolicy::new(policy).require("/api/admin/**", RoleSet::from([Role::ADMIN]));

        let auth = Arc::new(AuthService::new(
            codec.clone(),
            blacklist.clone(),
            directory,
            self.hasher,
        )?);
        let gate = AuthenticationGate::new(codec, blacklist, policy);

        info!(
            backend = gate.blacklist().backend(),
            store_required = config.revocation_store_required,
            validity_secs = config.token_validity.as_secs(),
            "Authentication gate ready"
        );

        Ok(Components {
            state: AppState {
                gate,
                auth,
                started_at: self.clock.now(),
            },
            sweeper,
        })
    }
}

fn load_directory(
    config: &GateConfig,
    hasher: &dyn CredentialHasher,
) -> Result<InMemoryUserDirectory, DirectoryError> {
    let mut directory = match &config.user_directory_file {
        Some(path) => InMemoryUserDirectory::from_file(path)?,
        None => InMemoryUserDirectory::new(),
    };
    if config.seed_demo_users {
        directory.seed_demo_users(hasher)?;
    }
    if directory.is_empty() {
        warn!("User directory is empty; every login will fail");
    }
    Ok(directory)
}
