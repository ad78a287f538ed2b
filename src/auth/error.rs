// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::roles::RoleSet;

/// Authentication and authorization error type.
///
/// Every variant stays distinguishable through [`AuthError::kind`], which is
/// what the logs record. The client-visible [`AuthError::error_code`] folds
/// the token-forgery variants into one generic `invalid_token` code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header present
    #[error("Authentication is required")]
    NoCredentials,
    /// Token is structurally invalid
    #[error("Token is malformed")]
    Malformed,
    /// Token signature does not match its content
    #[error("Token signature is invalid")]
    SignatureInvalid,
    /// Token lifetime is over
    #[error("Token has expired")]
    Expired,
    /// Token issuer or audience does not match this service
    #[error("Token issuer or audience is invalid")]
    IssuerMismatch,
    /// Token was revoked before its natural expiry
    #[error("Token has been revoked")]
    Revoked,
    /// Username or password is wrong (deliberately not distinguished)
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Caller lacks every one of the roles the operation accepts
    #[error("Insufficient role: requires one of {required}, caller has {actual}")]
    InsufficientRole { required: RoleSet, actual: RoleSet },
    /// Revocation store unreachable or too slow
    #[error("Revocation store is unavailable")]
    StoreUnavailable,
    /// User directory unreachable
    #[error("User directory is unavailable: {0}")]
    DirectoryUnavailable(String),
    /// Internal error
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthErrorBody {
    error: String,
    error_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_roles: Option<Vec<String>>,
}

impl AuthError {
    /// Internal reason code (logs and diagnostics).
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::NoCredentials => "no_credentials",
            AuthError::Malformed => "malformed",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::Expired => "expired",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::Revoked => "revoked",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InsufficientRole { .. } => "insufficient_role",
            AuthError::StoreUnavailable => "store_unavailable",
            AuthError::DirectoryUnavailable(_) => "directory_unavailable",
            AuthError::Internal(_) => "internal",
        }
    }

    /// Error code returned to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NoCredentials => "no_credentials",
            AuthError::Malformed | AuthError::SignatureInvalid | AuthError::IssuerMismatch => {
                "invalid_token"
            }
            AuthError::Expired => "token_expired",
            AuthError::Revoked => "token_revoked",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InsufficientRole { .. } => "insufficient_role",
            AuthError::StoreUnavailable => "revocation_check_unavailable",
            AuthError::DirectoryUnavailable(_) => "directory_unavailable",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Message returned to clients.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Malformed | AuthError::SignatureInvalid | AuthError::IssuerMismatch => {
                "Invalid token".to_string()
            }
            AuthError::DirectoryUnavailable(_) => "User directory is unavailable".to_string(),
            AuthError::Internal(_) => "Internal authentication error".to_string(),
            other => other.to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            AuthError::DirectoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Whether the token itself was rejected (as opposed to the caller lacking
    /// a token, a role, or the infrastructure failing).
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::Malformed
                | AuthError::SignatureInvalid
                | AuthError::Expired
                | AuthError::IssuerMismatch
                | AuthError::Revoked
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (required_roles, actual_roles) = match &self {
            AuthError::InsufficientRole { required, actual } => {
                (Some(required.names()), Some(actual.names()))
            }
            _ => (None, None),
        };
        let body = Json(AuthErrorBody {
            error: self.public_message(),
            error_code: self.error_code(),
            required_roles,
            actual_roles,
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn no_credentials_returns_401() {
        let response = AuthError::NoCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["errorCode"], "no_credentials");
    }

    #[tokio::test]
    async fn forgery_details_are_generic_for_clients() {
        for err in [
            AuthError::Malformed,
            AuthError::SignatureInvalid,
            AuthError::IssuerMismatch,
        ] {
            let response = err.clone().into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert_eq!(body["errorCode"], "invalid_token");
            assert_eq!(body["error"], "Invalid token");
        }
    }

    #[test]
    fn internal_kinds_stay_distinct() {
        let kinds = [
            AuthError::NoCredentials.kind(),
            AuthError::Malformed.kind(),
            AuthError::SignatureInvalid.kind(),
            AuthError::Expired.kind(),
            AuthError::IssuerMismatch.kind(),
            AuthError::Revoked.kind(),
            AuthError::InvalidCredentials.kind(),
            AuthError::StoreUnavailable.kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }

    #[tokio::test]
    async fn insufficient_role_returns_403_with_roles() {
        let err = AuthError::InsufficientRole {
            required: RoleSet::from([Role::ADMIN]),
            actual: RoleSet::from([Role::USER]),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["errorCode"], "insufficient_role");
        assert_eq!(body["requiredRoles"], serde_json::json!(["ADMIN"]));
        assert_eq!(body["actualRoles"], serde_json::json!(["USER"]));
    }

    #[test]
    fn store_unavailable_is_401_at_the_gate() {
        assert_eq!(
            AuthError::StoreUnavailable.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
