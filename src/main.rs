// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use seamless_cilogon::{
    api::router,
    config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    session::SessionSweeper,
    state::AppState,
};

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env();
    init_tracing(config.log_format);

    match &config.cilogon {
        Some(cilogon) => {
            if cilogon.redirect_uri.is_none() {
                warn!("CILOGON_REDIRECT_URI is not set; seamless redirects will fail");
            }
            info!(client_id = %cilogon.client_id, "CILogon client installed");
        }
        None => warn!("CILOGON_CLIENT_ID is not set; seamless login will never redirect"),
    }

    let state = AppState::from_config(&config);
    let app = router(state.clone());

    let shutdown = CancellationToken::new();
    let sweeper = SessionSweeper::new(Arc::clone(&state.sessions), config.session_ttl)
        .with_pending_ttl(config.session_pending_ttl);
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");

    let handle = Handle::new();
    {
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });
    }

    match config.tls_paths() {
        Some((cert, key)) => {
            // Install the ring crypto provider for rustls (must be done before any TLS operations)
            rustls::crypto::ring::default_provider()
                .install_default()
                .expect("Failed to install rustls crypto provider");

            let tls_config = RustlsConfig::from_pem_file(cert, key)
                .await
                .expect("Failed to load TLS certificate and key");

            info!(%addr, "Seamless CILogon gate listening on https");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            info!(%addr, "Seamless CILogon gate listening on http");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTP server failed");
        }
    }

    shutdown.cancel();
    if let Err(e) = sweeper_task.await {
        warn!(error = %e, "Session sweeper task failed");
    }
}
