// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Runs the [`AuthenticationGate`](super::gate::AuthenticationGate) in front
//! of every route and places the resulting
//! [`IdentityContext`](super::claims::IdentityContext) in the request
//! extensions, where the `Auth` extractor picks it up.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/api/auth/me", get(me))
//!     .layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         authentication_gate,
//!     ))
//!     .with_state(state);
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use super::gate::{extract_bearer, GateDecision};
use super::fingerprint::short_fingerprint;
use crate::state::AppState;

/// Header carrying the per-request id set by the request-id layer.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Gate every request; reject with the gate's error or continue with an
/// identity context attached.
pub async fn authentication_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    let authorization = request.headers().get(AUTHORIZATION);
    let token = extract_bearer(authorization)
        .ok()
        .map(short_fingerprint)
        .unwrap_or_default();
    let decision = state.gate.admit(&path, authorization).await;

    match decision {
        Ok(GateDecision::Public) => {
            debug!(%path, %request_id, "Public route, gate skipped");
            next.run(request).await
        }
        Ok(GateDecision::Authenticated(context)) => {
            info!(
                %path,
                %request_id,
                subject = %context.subject,
                roles = %context.roles,
                %token,
                "Request authenticated"
            );
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => {
            warn!(
                %path,
                %request_id,
                reason = e.kind(),
                %token,
                "Request rejected"
            );
            e.into_response()
        }
    }
}
