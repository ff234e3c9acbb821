// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Gateward Authors

use std::{env, net::SocketAddr};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gateward::api::router;
use gateward::auth::TokenAuthenticator;
use gateward::config::{AuthConfig, HOST_ENV, LOG_FORMAT_ENV, PORT_ENV};
use gateward::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    // Configuration is loaded once; a broken configuration is fatal here,
    // never a classified auth outcome later.
    let config = AuthConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    });
    let authenticator = TokenAuthenticator::new(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build authenticator");
        std::process::exit(1);
    });

    let state = AppState::new(authenticator);
    let app = router(state);

    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    tracing::info!(%addr, "gateward listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .expect("server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
