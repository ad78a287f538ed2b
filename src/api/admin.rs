// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints for token blacklist management.
//!
//! These endpoints require the Admin role and provide:
//! - Service information with the blacklist size
//! - Forced revocation of arbitrary tokens and its reversal
//! - Blacklist statistics and reset

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::health::ENDPOINTS;
use crate::{
    auth::{gate::extract_bearer, AdminOnly, AuthError, RevocationOutcome},
    error::ApiError,
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// A token supplied in the request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminInfoResponse {
    pub application: String,
    pub version: String,
    /// Admin who asked.
    pub admin: String,
    /// Number of currently revoked tokens.
    pub blacklist_count: usize,
    /// Revocation store backend.
    pub backend: String,
    pub endpoints: Vec<String>,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeResponse {
    pub message: String,
    /// False when the token had already expired and nothing was stored.
    pub revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistStatsResponse {
    pub blacklist_count: usize,
    pub backend: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearBlacklistResponse {
    /// Number of live revocations dropped.
    pub cleared_count: usize,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A token passed as an argument is a bad request, not an authentication
/// failure of the caller.
fn token_argument_error(err: AuthError) -> ApiError {
    if err.is_token_rejection() {
        ApiError::bad_request(format!("Token argument rejected: {}", err.public_message()))
            .with_code(err.error_code())
    } else {
        err.into()
    }
}

fn revoke_response(outcome: RevocationOutcome, now: DateTime<Utc>) -> RevokeResponse {
    match outcome {
        RevocationOutcome::Revoked { expires_at } => RevokeResponse {
            message: "Token revoked".to_string(),
            revoked: true,
            expires_at: Some(expires_at),
            timestamp: now,
        },
        RevocationOutcome::AlreadyExpired => RevokeResponse {
            message: "Token had already expired; nothing to revoke".to_string(),
            revoked: false,
            expires_at: None,
            timestamp: now,
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Admin service information.
#[utoipa::path(
    get,
    path = "/api/admin/info",
    tag = "Admin",
    responses(
        (status = 200, description = "Admin information", body = AdminInfoResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer" = []))
)]
pub async fn admin_info(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<AdminInfoResponse>, ApiError> {
    let stats = state.auth.blacklist_stats(&admin).await?;
    let now = state.gate.codec().clock().now();

    Ok(Json(AdminInfoResponse {
        application: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        admin: admin.subject,
        blacklist_count: stats.count,
        backend: stats.backend.to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        uptime_seconds: (now - state.started_at).num_seconds().max(0),
        timestamp: now,
    }))
}

/// Force-revoke a token until its natural expiry.
#[utoipa::path(
    post,
    path = "/api/admin/blacklist/token",
    tag = "Admin",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token revoked (or already expired)", body = RevokeResponse),
        (status = 400, description = "Token argument is not a token issued here"),
        (status = 403, description = "Admin role required"),
        (status = 503, description = "Revocation store unavailable")
    ),
    security(("bearer" = []))
)]
pub async fn force_revoke(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<RevokeResponse>, ApiError> {
    let outcome = state
        .auth
        .force_revoke(&admin, request.token.trim())
        .await
        .map_err(token_argument_error)?;
    Ok(Json(revoke_response(outcome, state.gate.codec().clock().now())))
}

/// Lift the revocation of a token.
#[utoipa::path(
    delete,
    path = "/api/admin/blacklist/token",
    tag = "Admin",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Revocation lifted", body = MessageResponse),
        (status = 400, description = "Token argument is not a token issued here"),
        (status = 403, description = "Admin role required"),
        (status = 503, description = "Revocation store unavailable")
    ),
    security(("bearer" = []))
)]
pub async fn unrevoke(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth
        .unrevoke(&admin, request.token.trim())
        .await
        .map_err(token_argument_error)?;
    Ok(Json(MessageResponse {
        message: "Token revocation lifted".to_string(),
        timestamp: state.gate.codec().clock().now(),
    }))
}

/// Revoke the token used for this request.
#[utoipa::path(
    post,
    path = "/api/admin/blacklist/current",
    tag = "Admin",
    responses(
        (status = 200, description = "Caller token revoked", body = RevokeResponse),
        (status = 403, description = "Admin role required"),
        (status = 503, description = "Revocation store unavailable")
    ),
    security(("bearer" = []))
)]
pub async fn revoke_current(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RevokeResponse>, ApiError> {
    let token = extract_bearer(headers.get(AUTHORIZATION))?;
    let outcome = state.auth.force_revoke(&admin, token).await?;
    Ok(Json(revoke_response(outcome, state.gate.codec().clock().now())))
}

/// Blacklist statistics.
#[utoipa::path(
    get,
    path = "/api/admin/blacklist/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Blacklist statistics", body = BlacklistStatsResponse),
        (status = 403, description = "Admin role required"),
        (status = 503, description = "Revocation store unavailable")
    ),
    security(("bearer" = []))
)]
pub async fn blacklist_stats(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<BlacklistStatsResponse>, ApiError> {
    let stats = state.auth.blacklist_stats(&admin).await?;
    Ok(Json(BlacklistStatsResponse {
        blacklist_count: stats.count,
        backend: stats.backend.to_string(),
        message: format!("{} token(s) currently revoked", stats.count),
        timestamp: state.gate.codec().clock().now(),
    }))
}

/// Drop every revocation.
#[utoipa::path(
    delete,
    path = "/api/admin/blacklist/clear",
    tag = "Admin",
    responses(
        (status = 200, description = "Blacklist cleared", body = ClearBlacklistResponse),
        (status = 403, description = "Admin role required"),
        (status = 503, description = "Revocation store unavailable")
    ),
    security(("bearer" = []))
)]
pub async fn clear_blacklist(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<ClearBlacklistResponse>, ApiError> {
    let cleared = state.auth.clear_blacklist(&admin).await?;
    Ok(Json(ClearBlacklistResponse {
        cleared_count: cleared,
        message: "Blacklist cleared".to_string(),
        timestamp: state.gate.codec().clock().now(),
    }))
}
