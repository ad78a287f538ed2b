// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{middleware::authentication_gate, IdentityContext, TokenResponse},
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;

pub fn router(state: AppState) -> Router {
    // Outermost first: the request id exists before the trace span opens,
    // CORS sits inside the trace layer and the gate runs right before the
    // handler, so rejections still carry CORS headers.
    let middleware_stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn_with_state(state.clone(), authentication_gate));

    Router::new()
        .route("/api/info", get(health::info))
        .route("/api/health", get(health::health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/validate", get(auth::validate))
        .route("/api/admin/info", get(admin::admin_info))
        .route(
            "/api/admin/blacklist/token",
            post(admin::force_revoke).delete(admin::unrevoke),
        )
        .route("/api/admin/blacklist/current", post(admin::revoke_current))
        .route("/api/admin/blacklist/stats", get(admin::blacklist_stats))
        .route(
            "/api/admin/blacklist/clear",
            axum::routing::delete(admin::clear_blacklist),
        )
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware_stack)
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::info,
        health::health,
        auth::login,
        auth::logout,
        auth::me,
        auth::validate,
        admin::admin_info,
        admin::force_revoke,
        admin::unrevoke,
        admin::revoke_current,
        admin::blacklist_stats,
        admin::clear_blacklist
    ),
    components(
        schemas(
            health::HealthResponse,
            health::InfoResponse,
            auth::LoginRequest,
            auth::LogoutResponse,
            auth::ValidateResponse,
            admin::TokenRequest,
            admin::AdminInfoResponse,
            admin::RevokeResponse,
            admin::MessageResponse,
            admin::BlacklistStatsResponse,
            admin::ClearBlacklistResponse,
            IdentityContext,
            TokenResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service information and health"),
        (name = "Auth", description = "Login, logout and token validation"),
        (name = "Admin", description = "Token blacklist administration")
    )
)]
struct ApiDoc;

/// Registers the `bearer` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
