// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use relational_token_gate::{
    api::router,
    config::GateConfig,
    logging,
    state::{AppStateBuilder, Components},
};

/// Time in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let config = match GateConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.log_format);

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    let addr: SocketAddr = match config.bind_address().parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(address = %config.bind_address(), error = %e, "Invalid bind address");
            return ExitCode::FAILURE;
        }
    };
    let tls = config.tls.clone();

    let Components { state, sweeper } = match AppStateBuilder::new(config).build() {
        Ok(components) => components,
        Err(e) => {
            error!(error = %e, "Failed to initialise application state");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let sweeper_task = sweeper.map(|sweeper| tokio::spawn(sweeper.run(shutdown.clone())));

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone(), shutdown.clone()));

    let app = router(state).into_make_service();
    let served = match tls {
        Some(paths) => {
            let tls_config = match RustlsConfig::from_pem_file(&paths.cert, &paths.key).await {
                Ok(tls_config) => tls_config,
                Err(e) => {
                    error!(
                        cert = %paths.cert.display(),
                        key = %paths.key.display(),
                        error = %e,
                        "Failed to load TLS certificate"
                    );
                    return ExitCode::FAILURE;
                }
            };
            info!(%addr, "Token gate listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app)
                .await
        }
        None => {
            info!(%addr, "Token gate listening on http (docs at /docs)");
            axum_server::bind(addr).handle(handle).serve(app).await
        }
    };

    shutdown.cancel();
    if let Some(task) = sweeper_task {
        let _ = task.await;
    }

    match served {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_on_signal(handle: Handle<SocketAddr>, shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
