// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, sync::Arc};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use converse_server::{
    api::router,
    auth::AuthConfig,
    config::{Config, LOG_FORMAT_ENV},
    deposit_poller::DepositPoller,
    providers::anchor::Sep24AnchorClient,
    state::AppState,
    stellar::HorizonClient,
    storage::Database,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = Config::from_env()?;
    info!(
        network = config.network.network.as_str(),
        horizon = %config.network.horizon_url,
        anchor = %config.anchor_domain,
        "Configuration loaded"
    );

    std::fs::create_dir_all(&config.data_dir)?;
    let db = Database::open(&config.database_path())?;
    info!(path = %config.database_path().display(), "Database opened");

    let ledger = Arc::new(HorizonClient::new(&config.network)?);
    let anchor = Arc::new(Sep24AnchorClient::new(&config.anchor_domain)?);
    let state = AppState::new(
        db,
        ledger,
        anchor,
        config.network.clone(),
        AuthConfig::from_secret(&config.jwt_secret),
    );

    let shutdown = CancellationToken::new();
    let poller = match config.deposit_poll_interval {
        Some(interval) => {
            let poller = DepositPoller::new(state.deposits.clone(), interval);
            Some(tokio::spawn(poller.run(shutdown.clone())))
        }
        None => {
            info!("Deposit poller disabled");
            None
        }
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), "Converse server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Some(handle) = poller {
        if let Err(e) = handle.await {
            warn!(error = %e, "Deposit poller task failed");
        }
    }
    info!("Converse server stopped");
    Ok(())
}
