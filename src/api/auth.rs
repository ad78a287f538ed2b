// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, logout, token validation and current identity.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{gate::extract_bearer, Auth, AuthError, IdentityContext, RevocationOutcome, TokenResponse},
    error::ApiError,
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub message: String,
    /// False when the token had already expired and nothing was stored.
    pub revoked: bool,
    /// Until when the token stays revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Why the token is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Exchange a username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let response = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(response))
}

/// Revoke the presented token until its natural expiry.
///
/// Succeeds for already-expired tokens without storing anything.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 400, description = "No bearer token provided"),
        (status = 401, description = "Token was not issued by this service"),
        (status = 503, description = "Revocation store unavailable")
    ),
    security(("bearer" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = match extract_bearer(headers.get(AUTHORIZATION)) {
        Ok(token) => token,
        Err(AuthError::NoCredentials | AuthError::Malformed) => {
            return Err(ApiError::bad_request("No token provided").with_code("no_credentials"))
        }
        Err(e) => return Err(e.into()),
    };

    let outcome = state.auth.logout(token).await?;
    let (message, expires_at) = match outcome {
        RevocationOutcome::Revoked { expires_at } => ("Logged out", Some(expires_at)),
        RevocationOutcome::AlreadyExpired => ("Logged out; token had already expired", None),
    };

    Ok(Json(LogoutResponse {
        message: message.to_string(),
        revoked: outcome.is_revoked(),
        expires_at,
        timestamp: state.gate.codec().clock().now(),
    }))
}

/// Current identity.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Caller identity", body = IdentityContext),
        (status = 401, description = "Missing, invalid, expired or revoked token")
    ),
    security(("bearer" = []))
)]
pub async fn me(Auth(identity): Auth) -> Json<IdentityContext> {
    Json(identity)
}

/// Check a token without rejecting the request.
#[utoipa::path(
    get,
    path = "/api/auth/validate",
    tag = "Auth",
    responses(
        (status = 200, description = "Validation result", body = ValidateResponse)
    ),
    security(("bearer" = []))
)]
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<ValidateResponse>) {
    let result = match extract_bearer(headers.get(AUTHORIZATION)) {
        Ok(token) => state.gate.authenticate_token(token, false).await,
        Err(e) => Err(e),
    };

    let response = match result {
        Ok(claims) => ValidateResponse {
            valid: true,
            expires_at: claims.expires_at(),
            roles: Some(claims.roles.names()),
            subject: Some(claims.sub),
            error_code: None,
        },
        Err(e) => ValidateResponse {
            error_code: Some(e.error_code().to_string()),
            ..Default::default()
        },
    };
    (StatusCode::OK, Json(response))
}
