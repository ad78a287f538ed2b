// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication with server-side revocation.
//!
//! ## Auth Flow
//!
//! 1. Client posts credentials to `/api/auth/login`
//! 2. [`AuthService`] checks them against the [`UserDirectory`] and issues an
//!    HS256 token through the [`TokenCodec`]
//! 3. Client sends `Authorization: Bearer <token>` on every request
//! 4. The [`middleware::authentication_gate`]:
//!    - skips paths on the public allow-list
//!    - checks the [`TokenBlacklist`] (revocation before verification)
//!    - verifies signature, expiry, issuer and audience
//!    - enforces the role table of the [`RoutePolicy`]
//!    - attaches an [`IdentityContext`] to the request
//! 5. Logout revokes the token until its natural expiry
//!
//! ## Security
//!
//! - Signature is checked before any claim is trusted
//! - Revocation entries are keyed by a SHA-256 fingerprint, never the raw token
//! - Revocation checks are bounded by a timeout; admin routes fail closed
//! - Unknown users and wrong passwords cost the same password hash

pub mod authorization;
pub mod blacklist;
pub mod claims;
pub mod clock;
pub mod codec;
pub mod directory;
pub mod error;
pub mod fingerprint;
pub mod extractor;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod revocation;
pub mod roles;
pub mod service;

pub use authorization::{authorize, require_role};
pub use blacklist::TokenBlacklist;
pub use claims::{Claims, IdentityContext, IssuedToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{TokenCodec, TokenSettings};
pub use directory::{InMemoryUserDirectory, UserDirectory, UserRecord};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use gate::{AuthenticationGate, GateDecision};
pub use password::{Argon2Hasher, CredentialHasher};
pub use policy::RoutePolicy;
pub use revocation::{DisabledRevocationStore, MemoryRevocationStore, RevocationStore};
pub use roles::{Role, RoleSet};
pub use service::{AuthService, RevocationOutcome, TokenResponse};
