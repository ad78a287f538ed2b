// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the caller's identity.
//!
//! Use the `Auth` extractor in handlers behind the authentication gate:
//!
//! ```rust,ignore
//! async fn me(Auth(identity): Auth) -> Json<IdentityContext> {
//!     Json(identity)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::authorization::authorize;
use super::{AuthError, IdentityContext, Role, RoleSet};

/// Identity placed in the request extensions by the gate middleware.
///
/// Rejects with [`AuthError::NoCredentials`] when the gate did not run or the
/// route is public and no identity was attached.
pub struct Auth(pub IdentityContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::NoCredentials)
    }
}

/// Extractor that requires the `ADMIN` role.
pub struct AdminOnly(pub IdentityContext);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(identity) = Auth::from_request_parts(parts, state).await?;
        authorize(&identity, &RoleSet::from([Role::ADMIN]))?;
        Ok(AdminOnly(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn identity(roles: RoleSet) -> IdentityContext {
        IdentityContext {
            subject: "someone".to_string(),
            roles,
            authenticated: true,
        }
    }

    #[tokio::test]
    async fn auth_requires_gate_context() {
        let mut parts = parts();
        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::NoCredentials)));
    }

    #[tokio::test]
    async fn auth_reads_extensions() {
        let mut parts = parts();
        parts.extensions.insert(identity(RoleSet::from([Role::USER])));

        let Auth(found) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.subject, "someone");
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let mut parts = parts();
        parts.extensions.insert(identity(RoleSet::from([Role::USER])));

        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::InsufficientRole { .. })));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin() {
        let mut parts = parts();
        parts
            .extensions
            .insert(identity(RoleSet::from([Role::ADMIN, Role::USER])));

        assert!(AdminOnly::from_request_parts(&mut parts, &()).await.is_ok());
    }
}
