// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use copyright_auction_server::{
    api::router,
    blockchain::EvmChain,
    config::{AppConfig, LogFormat, TlsPaths},
    state::AppState,
};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
    token.cancel();
}

async fn serve_tls(app: Router, addr: SocketAddr, tls: &TlsPaths, shutdown: CancellationToken) {
    let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
        .await
        .expect("Failed to load TLS certificate and key");

    let handle: axum_server::Handle<SocketAddr> = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    tracing::info!(%addr, "Listening on https (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .expect("HTTPS server failed");
}

async fn serve_plain(app: Router, addr: SocketAddr, shutdown: CancellationToken) {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(%addr, "Listening on http (docs at /docs)");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .expect("HTTP server failed");
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Invalid configuration");
    init_tracing(config.log_format);

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("rustls crypto provider already installed");
    }

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .expect("Failed to parse bind address");

    let chain = Arc::new(EvmChain::new(
        config.rpc_url.clone(),
        config.nft_contract,
        config.token_contract,
    ));
    tracing::info!(
        rpc_url = %config.rpc_url,
        nft_contract = %config.nft_contract,
        token_contract = %config.token_contract,
        operator = %config.operator_username,
        "Chain client configured"
    );

    let tls = config.tls.clone();
    let state = AppState::open(config, chain).expect("Failed to initialize storage");
    let app = router(state);

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    match tls {
        Some(tls) => serve_tls(app, addr, &tls, shutdown).await,
        None => serve_plain(app, addr, shutdown).await,
    }

    tracing::info!("Server stopped");
}
