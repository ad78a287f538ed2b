// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User directory: username → password hash and roles.
//!
//! The gate never stores credentials itself; it asks a [`UserDirectory`].
//! [`InMemoryUserDirectory`] is loaded at startup from a JSON file and/or the
//! demo accounts.
//!
//! ## File format
//!
//! ```json
//! [
//!   { "username": "admin", "passwordHash": "$argon2id$...", "roles": ["ADMIN", "USER"] }
//! ]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::password::{CredentialHasher, HashError};
use super::roles::{Role, RoleSet};

/// Accounts seeded by `SEED_DEMO_USERS`: username, password, roles.
const DEMO_USERS: &[(&str, &str, &[&str])] = &[
    ("admin", "password", &["ADMIN", "USER"]),
    ("user1", "password", &["USER"]),
    ("guest", "password", &["GUEST"]),
    ("jwt_user", "password", &["USER"]),
    ("jwt_admin", "admin123", &["ADMIN", "USER"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub roles: RoleSet,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read user directory {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse user directory {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid user record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Hash(#[from] HashError),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user; `Ok(None)` when the username is unknown.
    async fn lookup(&self, username: &str) -> Result<Option<UserRecord>, DirectoryError>;
}

/// Directory held in memory for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, UserRecord>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record.
    pub fn insert(&mut self, record: UserRecord) -> Result<(), DirectoryError> {
        if record.username.trim().is_empty() {
            return Err(DirectoryError::InvalidRecord("empty username".into()));
        }
        self.users.insert(record.username.clone(), record);
        Ok(())
    }

    /// Hash `password` and add the user.
    pub fn insert_with_password(
        &mut self,
        username: &str,
        password: &str,
        roles: RoleSet,
        hasher: &dyn CredentialHasher,
    ) -> Result<(), DirectoryError> {
        let password_hash = hasher.hash(password)?;
        self.insert(UserRecord {
            username: username.to_string(),
            password_hash,
            roles,
        })
    }

    /// Load records from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| DirectoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<UserRecord> =
            serde_json::from_str(&raw).map_err(|source| DirectoryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut directory = Self::new();
        for record in records {
            directory.insert(record)?;
        }
        info!(path = %path.display(), users = directory.len(), "Loaded user directory");
        Ok(directory)
    }

    /// Add the demo accounts (`admin/password`, `user1/password`, ...).
    pub fn seed_demo_users(&mut self, hasher: &dyn CredentialHasher) -> Result<(), DirectoryError> {
        for (username, password, roles) in DEMO_USERS {
            let roles: RoleSet = roles.iter().filter_map(|r| Role::parse(r)).collect();
            self.insert_with_password(username, password, roles, hasher)?;
        }
        info!(users = DEMO_USERS.len(), "Seeded demo users");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup(&self, username: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.users.get(username).cloned())
    }
}
