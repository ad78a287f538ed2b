// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the request-scoped identity built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::{Role, RoleSet};

/// Token type marker carried in every issued token.
pub const ACCESS_TOKEN_TYPE: &str = "ACCESS_TOKEN";

/// Claims carried in the token payload.
///
/// Timestamps are NumericDate seconds, as in a standard JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal identifier, never empty)
    pub sub: String,

    /// Granted roles
    #[serde(default)]
    pub roles: RoleSet,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Always [`ACCESS_TOKEN_TYPE`] for tokens issued here
    #[serde(default)]
    pub token_type: String,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the token's natural lifetime is over at `now`.
    ///
    /// A token is still valid at exactly `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(exp) => now > exp,
            // Unrepresentable expiry never counts as "never expires"
            None => true,
        }
    }

    /// Remaining lifetime at `now`, `None` when already expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        let exp = self.expires_at()?;
        (exp - now).to_std().ok().filter(|d| !d.is_zero())
    }
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Identity of the caller for the duration of one request.
///
/// Built by the authentication gate after a token verifies, placed in the
/// request extensions, and dropped together with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdentityContext {
    /// Principal identifier (token `sub`)
    pub subject: String,

    /// Granted roles
    #[schema(value_type = Vec<String>)]
    pub roles: RoleSet,

    /// Always true for contexts produced by the gate
    pub authenticated: bool,
}

impl IdentityContext {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            roles: claims.roles,
            authenticated: true,
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::ADMIN)
    }
}
