// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request authentication decision.
//!
//! ```text
//! public path ──────────────────────────────────────────────► Public
//! no / bad header ──────────────────────────────────────────► NoCredentials
//! token ─► revocation check ─► revoked ─────────────────────► Revoked
//!                           └► verify ─► invalid ───────────► Malformed | SignatureInvalid | Expired | IssuerMismatch
//!                                     └► role rule ─► miss ─► InsufficientRole
//!                                                 └► ok ────► Authenticated(IdentityContext)
//! ```

use std::sync::Arc;

use axum::http::HeaderValue;

use super::authorization::authorize;
use super::blacklist::TokenBlacklist;
use super::claims::{Claims, IdentityContext};
use super::codec::TokenCodec;
use super::error::AuthError;
use super::policy::RoutePolicy;

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of a successful gate pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Path is on the public allow-list; no token was looked at
    Public,
    /// Token accepted
    Authenticated(IdentityContext),
}

/// Extract the raw token from an `Authorization` header value.
///
/// The `Bearer ` prefix is matched case-sensitively.
pub fn extract_bearer(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header
        .ok_or(AuthError::NoCredentials)?
        .to_str()
        .map_err(|_| AuthError::NoCredentials)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::NoCredentials)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token)
}

#[derive(Debug, Clone)]
pub struct AuthenticationGate {
    codec: Arc<TokenCodec>,
    blacklist: TokenBlacklist,
    policy: Arc<RoutePolicy>,
}

impl AuthenticationGate {
    pub fn new(codec: Arc<TokenCodec>, blacklist: TokenBlacklist, policy: RoutePolicy) -> Self {
        Self {
            codec,
            blacklist,
            policy: Arc::new(policy),
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub fn blacklist(&self) -> &TokenBlacklist {
        &self.blacklist
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Decide whether a request for `path` carrying `authorization` may proceed.
    pub async fn admit(
        &self,
        path: &str,
        authorization: Option<&HeaderValue>,
    ) -> Result<GateDecision, AuthError> {
        if self.policy.is_public(path) {
            return Ok(GateDecision::Public);
        }

        let token = extract_bearer(authorization)?;
        let required = self.policy.required_roles(path);
        let claims = self.authenticate_token(token, required.is_some()).await?;
        let context = IdentityContext::from_claims(claims);

        if let Some(required) = required {
            authorize(&context, required)?;
        }
        Ok(GateDecision::Authenticated(context))
    }

    /// Revocation check followed by full verification.
    ///
    /// `strict` makes a store failure reject the token regardless of the
    /// configured policy.
    pub async fn authenticate_token(&self, raw: &str, strict: bool) -> Result<Claims, AuthError> {
        if self.blacklist.is_revoked(raw, strict).await? {
            return Err(AuthError::Revoked);
        }
        self.codec.verify(raw)
    }
}
