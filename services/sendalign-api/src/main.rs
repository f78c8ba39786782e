// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SendAlign API Service
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (an optional `.env`
//! file is read first):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `APP_URL`: Public origin used in unsubscribe links
//! - `UNSUBSCRIBE_SECRET`: HMAC key for unsubscribe tokens
//! - `RATE_LIMIT_CAPACITY` / `RATE_LIMIT_REFILL_PER_SEC`: token bucket shape
//! - `MAILERLITE_API_KEY` / `MAILERLITE_GROUP_ID`: waitlist provider
//! - `DNS_TIMEOUT_MS`: per-lookup DNS timeout
//!
//! See `config.rs` for the full list.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sendalign_api::{
    clock::{Clock, SystemClock},
    config::Config,
    dns::HickoryTxtResolver,
    handlers::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        app_url = %config.app_url,
        capacity = config.rate_limit.capacity,
        refill_per_sec = config.rate_limit.refill_per_sec,
        metrics_enabled = config.metrics.enabled,
        "Starting SendAlign API"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let resolver = Arc::new(HickoryTxtResolver::from_system(config.dns.timeout()));
    let state = Arc::new(AppState::new(config, clock, resolver)?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_state.config.rate_limit.prune_interval());
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup(cleanup_state.clock.now_secs());
        }
    });

    let addr: SocketAddr = state.config.bind_addr.parse()?;
    let app = sendalign_api::router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
