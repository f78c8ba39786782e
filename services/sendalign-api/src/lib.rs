// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SendAlign API
//!
//! Backend for the SendAlign marketing site:
//!
//! - One-click unsubscribe links signed with HMAC-SHA-256 (RFC 8058 headers)
//! - Per-client token-bucket rate limiting on the unsubscribe routes
//! - SPF/DKIM/DMARC presence check for a sending domain
//! - Waitlist signups proxied to MailerLite

pub mod clock;
pub mod config;
pub mod dns;
pub mod error;
pub mod events;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::ApiError;
pub use handlers::AppState;
pub use limiter::{RateDecision, RateLimiter};

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Build the HTTP router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/healthz", get(handlers::health))
        .route("/api/ping", get(handlers::ping_get).post(handlers::ping_post))
        .route("/api/generate-unsub", post(handlers::generate_unsub))
        .route(
            "/api/unsubscribe",
            get(handlers::unsubscribe).post(handlers::unsubscribe),
        )
        .route("/api/subscribe", post(handlers::subscribe))
        .route("/api/check-domain", post(handlers::check_domain));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(handlers::render_metrics));
    }

    app.layer(cors_layer(&state.config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
