// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Login, Logout and Blacklist Administration
//!
//! ## Login
//!
//! 1. Look the user up in the [`UserDirectory`]
//! 2. Verify the password on a blocking worker; unknown users are verified
//!    against a decoy hash so both failure paths cost one full hash
//! 3. Issue a token through the [`TokenCodec`]
//!
//! Unknown user and wrong password both return
//! [`AuthError::InvalidCredentials`].
//!
//! ## Logout / Forced Revocation
//!
//! The token must carry a valid signature but may already be expired. Its
//! remaining lifetime becomes the revocation TTL; a token with no lifetime
//! left is not written to the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::authorization::authorize;
use super::blacklist::TokenBlacklist;
use super::claims::{Claims, IdentityContext, IssuedToken};
use super::codec::TokenCodec;
use super::directory::UserDirectory;
use super::error::AuthError;
use super::password::{CredentialHasher, HashError};
use super::roles::{Role, RoleSet};
use super::fingerprint::short_fingerprint;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-users";

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
    pub subject: String,
    #[schema(value_type = Vec<String>)]
    pub roles: RoleSet,
    pub expires_at: DateTime<Utc>,
    /// Seconds until expiry
    pub expires_in: i64,
}

impl TokenResponse {
    fn from_issued(issued: IssuedToken) -> Result<Self, AuthError> {
        let expires_at = issued.claims.expires_at().ok_or_else(|| {
            AuthError::Internal(format!("token expiry {} is out of range", issued.claims.exp))
        })?;
        Ok(Self {
            token: issued.token,
            token_type: "Bearer".to_string(),
            subject: issued.claims.sub,
            roles: issued.claims.roles,
            expires_at,
            expires_in: issued.claims.exp - issued.claims.iat,
        })
    }
}

/// What a logout or forced revocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationOutcome {
    /// Token recorded in the store until its natural expiry
    Revoked { expires_at: DateTime<Utc> },
    /// Token had no lifetime left; nothing written
    AlreadyExpired,
}

impl RevocationOutcome {
    pub fn is_revoked(&self) -> bool {
        matches!(self, RevocationOutcome::Revoked { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistStats {
    pub count: usize,
    pub backend: &'static str,
}

pub struct AuthService {
    codec: Arc<TokenCodec>,
    blacklist: TokenBlacklist,
    directory: Arc<dyn UserDirectory>,
    hasher: Arc<dyn CredentialHasher>,
    decoy_hash: Arc<str>,
}

impl AuthService {
    /// Build the service. Hashes the decoy password once, so this is slow
    /// with production hasher parameters.
    pub fn new(
        codec: Arc<TokenCodec>,
        blacklist: TokenBlacklist,
        directory: Arc<dyn UserDirectory>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Result<Self, HashError> {
        let decoy_hash = hasher.hash(DECOY_PASSWORD)?;
        Ok(Self {
            codec,
            blacklist,
            directory,
            hasher,
            decoy_hash: decoy_hash.into(),
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn blacklist(&self) -> &TokenBlacklist {
        &self.blacklist
    }

    /// Exchange credentials for a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, AuthError> {
        let record = self.directory.lookup(username).await.map_err(|e| {
            error!(error = %e, "User directory lookup failed");
            AuthError::DirectoryUnavailable(e.to_string())
        })?;

        let hash: Arc<str> = match &record {
            Some(record) => record.password_hash.as_str().into(),
            None => self.decoy_hash.clone(),
        };
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))?;

        let record = match record {
            Some(record) if matches => record,
            _ => {
                warn!(username, "Login failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let issued = self.codec.issue(&record.username, record.roles)?;
        info!(
            subject = %issued.claims.sub,
            roles = %issued.claims.roles,
            token = %short_fingerprint(&issued.token),
            "Login succeeded"
        );
        TokenResponse::from_issued(issued)
    }

    /// Revoke the caller's own token.
    ///
    /// Expired tokens succeed as [`RevocationOutcome::AlreadyExpired`]; tokens
    /// with a bad signature or structure are rejected.
    pub async fn logout(&self, raw: &str) -> Result<RevocationOutcome, AuthError> {
        let claims = self.codec.inspect(raw)?;
        let outcome = self.revoke_until_expiry(raw, &claims).await?;
        info!(
            subject = %claims.sub,
            token = %short_fingerprint(raw),
            revoked = outcome.is_revoked(),
            "Logout"
        );
        Ok(outcome)
    }

    /// Revoke any token on behalf of an administrator.
    pub async fn force_revoke(
        &self,
        actor: &IdentityContext,
        raw: &str,
    ) -> Result<RevocationOutcome, AuthError> {
        require_admin(actor)?;
        let claims = self.codec.inspect(raw)?;
        let outcome = self.revoke_until_expiry(raw, &claims).await?;
        info!(
            actor = %actor.subject,
            subject = %claims.sub,
            token = %short_fingerprint(raw),
            revoked = outcome.is_revoked(),
            "Token force-revoked"
        );
        Ok(outcome)
    }

    /// Lift a revocation.
    pub async fn unrevoke(&self, actor: &IdentityContext, raw: &str) -> Result<(), AuthError> {
        require_admin(actor)?;
        let claims = self.codec.inspect(raw)?;
        self.blacklist.remove(raw).await?;
        info!(
            actor = %actor.subject,
            subject = %claims.sub,
            token = %short_fingerprint(raw),
            "Token revocation lifted"
        );
        Ok(())
    }

    pub async fn blacklist_stats(&self, actor: &IdentityContext) -> Result<BlacklistStats, AuthError> {
        require_admin(actor)?;
        Ok(BlacklistStats {
            count: self.blacklist.count().await?,
            backend: self.blacklist.backend(),
        })
    }

    /// Drop every revocation, returning how many were live.
    pub async fn clear_blacklist(&self, actor: &IdentityContext) -> Result<usize, AuthError> {
        require_admin(actor)?;
        let cleared = self.blacklist.clear().await?;
        warn!(actor = %actor.subject, cleared, "Token blacklist cleared");
        Ok(cleared)
    }

    async fn revoke_until_expiry(
        &self,
        raw: &str,
        claims: &Claims,
    ) -> Result<RevocationOutcome, AuthError> {
        let now = self.codec.clock().now();
        match (claims.remaining_at(now), claims.expires_at()) {
            (Some(ttl), Some(expires_at)) => {
                self.blacklist.revoke(raw, ttl).await?;
                Ok(RevocationOutcome::Revoked { expires_at })
            }
            _ => Ok(RevocationOutcome::AlreadyExpired),
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("codec", &self.codec)
            .field("blacklist", &self.blacklist)
            .finish_non_exhaustive()
    }
}

fn require_admin(actor: &IdentityContext) -> Result<(), AuthError> {
    authorize(actor, &RoleSet::from([Role::ADMIN]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::blacklist::DEFAULT_CHECK_TIMEOUT;
    use crate::auth::clock::{Clock, ManualClock};
    use crate::auth::codec::TokenSettings;
    use crate::auth::directory::InMemoryUserDirectory;
    use crate::auth::gate::{AuthenticationGate, GateDecision};
    use crate::auth::password::Argon2Hasher;
    use crate::auth::policy::RoutePolicy;
    use crate::auth::revocation::MemoryRevocationStore;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use std::time::Instant;

    const SECRET: &str = "service-test-secret-at-least-thirty-two-bytes";

    struct Fixture {
        service: AuthService,
        gate: AuthenticationGate,
        clock: Arc<ManualClock>,
    }

    fn fixture_with(hasher: Argon2Hasher) -> Fixture {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_750_000_000, 0).unwrap(),
        ));
        let codec = Arc::new(TokenCodec::new(
            SECRET,
            clock.clone(),
            TokenSettings {
                issuer: "relational-token-gate".into(),
                audience: "api.relational-token-gate".into(),
                validity: Duration::hours(1),
            },
        ));
        let blacklist = TokenBlacklist::new(
            Arc::new(MemoryRevocationStore::new()),
            DEFAULT_CHECK_TIMEOUT,
            false,
        );

        let mut directory = InMemoryUserDirectory::new();
        directory.seed_demo_users(&hasher).unwrap();

        let service = AuthService::new(
            codec.clone(),
            blacklist.clone(),
            Arc::new(directory),
            Arc::new(hasher),
        )
        .unwrap();
        let gate = AuthenticationGate::new(codec, blacklist, RoutePolicy::with_defaults());
        Fixture {
            service,
            gate,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Argon2Hasher::with_params(64, 1, 1).unwrap())
    }

    fn admin() -> IdentityContext {
        IdentityContext {
            subject: "admin".into(),
            roles: RoleSet::from([Role::ADMIN, Role::USER]),
            authenticated: true,
        }
    }

    fn user() -> IdentityContext {
        IdentityContext {
            subject: "user1".into(),
            roles: RoleSet::from([Role::USER]),
            authenticated: true,
        }
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    #[tokio::test]
    async fn login_issues_token_with_directory_roles() {
        let f = fixture();
        let response = f.service.login("admin", "password").await.unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.subject, "admin");
        assert_eq!(response.roles, RoleSet::from([Role::ADMIN, Role::USER]));
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.expires_at, f.clock.now() + Duration::hours(1));

        let claims = f.service.codec().verify(&response.token).unwrap();
        assert_eq!(claims.sub, "admin");
    }

    #[test]
    fn token_response_rejects_out_of_range_expiry() {
        let issued = IssuedToken {
            token: "t".into(),
            claims: Claims {
                sub: "admin".into(),
                roles: RoleSet::from([Role::ADMIN]),
                iat: 1_750_000_000,
                exp: i64::MAX,
                iss: "issuer".into(),
                aud: "audience".into(),
                token_type: "ACCESS_TOKEN".into(),
            },
        };
        assert!(matches!(
            TokenResponse::from_issued(issued),
            Err(AuthError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let f = fixture();
        assert_eq!(
            f.service.login("admin", "wrong").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            f.service.login("nobody", "password").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn logout_then_request_is_revoked() {
        let f = fixture();
        let token = f.service.login("user1", "password").await.unwrap().token;

        let outcome = f.service.logout(&token).await.unwrap();
        assert_eq!(
            outcome,
            RevocationOutcome::Revoked {
                expires_at: f.clock.now() + Duration::hours(1)
            }
        );
        assert_eq!(
            f.gate.admit("/api/auth/me", Some(&bearer(&token))).await,
            Err(AuthError::Revoked)
        );
    }

    #[tokio::test]
    async fn logout_of_expired_token_writes_nothing() {
        let f = fixture();
        let token = f.service.login("user1", "password").await.unwrap().token;
        let before = f.service.blacklist().count().await.unwrap();

        f.clock.advance(Duration::hours(2));
        assert_eq!(
            f.service.logout(&token).await,
            Ok(RevocationOutcome::AlreadyExpired)
        );
        assert_eq!(f.service.blacklist().count().await.unwrap(), before);
    }

    #[tokio::test]
    async fn logout_rejects_forged_tokens() {
        let f = fixture();
        let token = f.service.login("user1", "password").await.unwrap().token;
        let forged = format!("{}x", token);

        assert_eq!(f.service.logout(&forged).await, Err(AuthError::SignatureInvalid));
        assert_eq!(f.service.logout("garbage").await, Err(AuthError::Malformed));
        assert_eq!(f.service.blacklist().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let f = fixture();
        let token = f.service.login("user1", "password").await.unwrap().token;
        assert!(f.service.logout(&token).await.unwrap().is_revoked());
        assert!(f.service.logout(&token).await.unwrap().is_revoked());
        assert_eq!(f.service.blacklist().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn admin_operations_require_admin() {
        let f = fixture();
        let token = f.service.login("user1", "password").await.unwrap().token;

        assert!(matches!(
            f.service.force_revoke(&user(), &token).await,
            Err(AuthError::InsufficientRole { .. })
        ));
        assert!(matches!(
            f.service.blacklist_stats(&user()).await,
            Err(AuthError::InsufficientRole { .. })
        ));
        assert!(matches!(
            f.service.clear_blacklist(&user()).await,
            Err(AuthError::InsufficientRole { .. })
        ));
        assert!(matches!(
            f.service.unrevoke(&user(), &token).await,
            Err(AuthError::InsufficientRole { .. })
        ));
    }

    #[tokio::test]
    async fn force_revoke_unrevoke_stats_and_clear() {
        let f = fixture();
        let first = f.service.login("user1", "password").await.unwrap().token;
        let second = f.service.login("guest", "password").await.unwrap().token;

        assert!(f.service.force_revoke(&admin(), &first).await.unwrap().is_revoked());
        assert!(f.service.force_revoke(&admin(), &second).await.unwrap().is_revoked());
        assert_eq!(
            f.service.blacklist_stats(&admin()).await.unwrap(),
            BlacklistStats {
                count: 2,
                backend: "memory"
            }
        );

        f.service.unrevoke(&admin(), &first).await.unwrap();
        assert!(matches!(
            f.gate.admit("/api/auth/me", Some(&bearer(&first))).await,
            Ok(GateDecision::Authenticated(_))
        ));

        assert_eq!(f.service.clear_blacklist(&admin()).await.unwrap(), 1);
        assert_eq!(f.service.clear_blacklist(&admin()).await.unwrap(), 0);
        assert!(matches!(
            f.gate.admit("/api/auth/me", Some(&bearer(&second))).await,
            Ok(GateDecision::Authenticated(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_login_latency_does_not_reveal_unknown_users() {
        let f = fixture_with(Argon2Hasher::with_params(1024, 2, 1).unwrap());
        const SAMPLES: u32 = 20;

        // Warm up both paths
        let _ = f.service.login("admin", "wrong").await;
        let _ = f.service.login("nobody", "wrong").await;

        let mut wrong_password = std::time::Duration::ZERO;
        let mut unknown_user = std::time::Duration::ZERO;
        for _ in 0..SAMPLES {
            let started = Instant::now();
            let _ = f.service.login("admin", "wrong").await;
            wrong_password += started.elapsed();

            let started = Instant::now();
            let _ = f.service.login("nobody", "wrong").await;
            unknown_user += started.elapsed();
        }

        let ratio = wrong_password.as_secs_f64() / unknown_user.as_secs_f64();
        assert!(
            (0.33..=3.0).contains(&ratio),
            "mean latencies diverge: wrong password {:?}, unknown user {:?}",
            wrong_password / SAMPLES,
            unknown_user / SAMPLES
        );
    }
}
