// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall health status ("UP" or "DEGRADED").
    pub status: String,
    /// Revocation store status ("ok", "unavailable" or "disabled").
    pub revocation_store: String,
    /// Seconds since the service started.
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}

/// Public service description.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub application: String,
    pub version: String,
    pub description: String,
    pub features: Vec<String>,
    pub endpoints: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Endpoints listed by `/api/info` and `/api/admin/info`.
pub(crate) const ENDPOINTS: &[&str] = &[
    "GET /api/info - service information (public)",
    "GET /api/health - health check (public)",
    "POST /api/auth/login - exchange credentials for a token",
    "POST /api/auth/logout - revoke the presented token",
    "GET /api/auth/me - current identity",
    "GET /api/auth/validate - check a token",
    "GET /api/admin/info - admin information (ADMIN)",
    "POST /api/admin/blacklist/token - force-revoke a token (ADMIN)",
    "DELETE /api/admin/blacklist/token - lift a revocation (ADMIN)",
    "POST /api/admin/blacklist/current - revoke the caller's token (ADMIN)",
    "GET /api/admin/blacklist/stats - blacklist statistics (ADMIN)",
    "DELETE /api/admin/blacklist/clear - clear the blacklist (ADMIN)",
];

/// Health check endpoint handler.
///
/// Returns 503 when the revocation store does not answer.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Revocation store unavailable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let blacklist = state.gate.blacklist();
    let store_status = if blacklist.backend() == "disabled" {
        "disabled"
    } else if blacklist.health_check().await.is_ok() {
        "ok"
    } else {
        "unavailable"
    };
    let healthy = store_status != "unavailable";

    let now = state.gate.codec().clock().now();
    let response = HealthResponse {
        status: if healthy { "UP" } else { "DEGRADED" }.to_string(),
        revocation_store: store_status.to_string(),
        uptime_seconds: (now - state.started_at).num_seconds().max(0),
        timestamp: now,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Service information.
#[utoipa::path(
    get,
    path = "/api/info",
    tag = "Health",
    responses(
        (status = 200, description = "Service information", body = InfoResponse)
    )
)]
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        application: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Stateless bearer-token authentication with server-side revocation"
            .to_string(),
        features: vec![
            "HS256 signed access tokens".to_string(),
            "Token revocation until natural expiry".to_string(),
            "Role-based route access".to_string(),
        ],
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        timestamp: state.gate.codec().clock().now(),
    })
}
