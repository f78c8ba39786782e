// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the SendAlign API.
//!
//! Unsubscribe links are stateless: the token in the query string is the
//! whole capability, so verification needs nothing but the secret. The
//! rate limiter runs before any token work.

use crate::clock::Clock;
use crate::config::Config;
use crate::dns::{DeliverabilityReport, DomainChecker, TxtResolver};
use crate::error::{ApiError, Result};
use crate::events::{log_unsub, UnsubEvent};
use crate::limiter::RateLimiter;
use crate::mailer::{MailerClient, MailerError};
use crate::metrics::Metrics;
use crate::validator::{
    validate_domain, validate_email, validate_list, validate_unsubscribe_params, ValidationError,
};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sendalign_common::unsub::{self, TokenSigner};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Route labels used for rate-limit keys and metrics.
pub mod route {
    pub const GENERATE_UNSUB: &str = "generate_unsub";
    pub const UNSUBSCRIBE: &str = "unsubscribe";
    pub const SUBSCRIBE: &str = "subscribe";
    pub const CHECK_DOMAIN: &str = "check_domain";
}

/// Rate-limit key prefixes; keys are `<prefix>:<client ip>`.
pub mod bucket {
    pub const UNSUB: &str = "unsub";
    pub const UNSUB_LINK: &str = "unsub-link";
}

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// `None` while `UNSUBSCRIBE_SECRET` is unset
    pub signer: Option<TokenSigner>,
    /// Absolute URL of the unsubscribe endpoint
    pub unsubscribe_endpoint: Url,
    pub limiter: RateLimiter,
    pub checker: DomainChecker,
    /// `None` while MailerLite credentials are unset
    pub mailer: Option<MailerClient>,
    pub metrics: Metrics,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Assemble state from configuration.
    ///
    /// Missing secrets do not fail startup; the affected routes answer 500
    /// and a warning is logged here so the misconfiguration is visible.
    pub fn new(
        config: Config,
        clock: Arc<dyn Clock>,
        resolver: Arc<dyn TxtResolver>,
    ) -> anyhow::Result<Self> {
        let signer = match config.unsubscribe.secret.as_deref() {
            Some(secret) => Some(TokenSigner::new(secret)?.with_max_skew(config.unsubscribe.max_skew())),
            None => {
                warn!("UNSUBSCRIBE_SECRET is not set; unsubscribe routes will return 500");
                None
            }
        };

        let mailer = match MailerClient::from_config(&config.mailer) {
            Ok(client) => Some(client),
            Err(MailerError::NotConfigured) => {
                warn!("MailerLite credentials are not set; /api/subscribe will return 500");
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            signer,
            unsubscribe_endpoint: unsub::endpoint_url(&config.app_url)?,
            limiter: RateLimiter::new(&config.rate_limit),
            checker: DomainChecker::new(resolver, config.dns.timeout()),
            mailer,
            metrics: Metrics::new()?,
            clock,
            config,
        })
    }

    fn signer(&self) -> Result<&TokenSigner> {
        self.signer
            .as_ref()
            .ok_or(ApiError::Configuration("missing UNSUBSCRIBE_SECRET"))
    }

    /// Consult the limiter for the `prefix:ip` bucket.
    fn rate_limit(&self, route: &str, prefix: &str, ip: &str) -> Result<()> {
        let key = format!("{prefix}:{ip}");
        let decision = self.limiter.check(&key, self.clock.now_secs());
        if decision.allowed {
            return Ok(());
        }

        info!(
            ip,
            route,
            retry_after_secs = decision.retry_after_secs,
            "Request rate limited"
        );
        self.metrics.record(route, "rate_limited");
        Err(ApiError::RateLimited {
            retry_after_secs: decision.retry_after_secs,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Issuance request body.
#[derive(Debug, Deserialize)]
pub struct GenerateUnsubRequest {
    #[serde(default)]
    pub email: Option<serde_json::Value>,
    #[serde(default)]
    pub list: Option<serde_json::Value>,
}

/// Issuance response body.
#[derive(Debug, Serialize)]
pub struct GenerateUnsubResponse {
    pub url: String,
    pub headers: OneClickHeaders,
}

#[derive(Debug, Serialize)]
pub struct OneClickHeaders {
    #[serde(rename = "List-Unsubscribe")]
    pub list_unsubscribe: String,
    #[serde(rename = "List-Unsubscribe-Post")]
    pub list_unsubscribe_post: &'static str,
}

/// Unsubscribe link query string.
#[derive(Debug, Default, Deserialize)]
pub struct UnsubscribeQuery {
    pub email: Option<String>,
    pub list: Option<String>,
    pub t: Option<String>,
    pub sig: Option<String>,
}

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub ok: bool,
}

/// Domain check request body.
#[derive(Debug, Deserialize)]
pub struct CheckDomainRequest {
    #[serde(default)]
    pub domain: Option<serde_json::Value>,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "sendalign-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn ping_get() -> &'static str {
    "PING GET OK"
}

pub async fn ping_post() -> &'static str {
    "PING POST OK"
}

/// Issue a signed unsubscribe link for an email address.
pub async fn generate_unsub(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: std::result::Result<Json<GenerateUnsubRequest>, JsonRejection>,
) -> Result<Json<GenerateUnsubResponse>> {
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    state.rate_limit(route::GENERATE_UNSUB, bucket::UNSUB_LINK, &ip)?;

    let signer = state.signer()?;
    let Json(req) = body.map_err(|e| ValidationError::MalformedBody(e.body_text()))?;

    let email = req
        .email
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or(ValidationError::InvalidEmail)
        .and_then(validate_email)?;
    // non-string and empty list ids fall back to the default list
    let list = validate_list(req.list.as_ref().and_then(|v| v.as_str()))?;

    let (token, link) = signer.issue_link(
        &state.unsubscribe_endpoint,
        &email,
        Some(&list),
        state.clock.now_ms(),
    );

    debug!(list_id = %token.scope, "Issued unsubscribe link");
    state.metrics.record(route::GENERATE_UNSUB, "ok");

    Ok(Json(GenerateUnsubResponse {
        url: link.url,
        headers: OneClickHeaders {
            list_unsubscribe: link.list_unsubscribe,
            list_unsubscribe_post: link.list_unsubscribe_post,
        },
    }))
}

/// One-click unsubscribe target (GET from a browser, POST per RFC 8058).
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    query: Option<Query<UnsubscribeQuery>>,
) -> Result<Response> {
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    state.rate_limit(route::UNSUBSCRIBE, bucket::UNSUB, &ip)?;

    let q = query.map(|Query(q)| q).unwrap_or_default();
    let params = match validate_unsubscribe_params(
        q.email.as_deref(),
        q.list.as_deref(),
        q.t.as_deref(),
        q.sig.as_deref(),
    ) {
        Ok(params) => params,
        Err(e) => {
            let email = q.email.as_deref().map(str::to_lowercase);
            let list = q.list.as_deref().unwrap_or(sendalign_common::DEFAULT_SCOPE);
            log_unsub(UnsubEvent::BadRequest, &ip, email.as_deref(), list, None);
            state.metrics.record(route::UNSUBSCRIBE, "bad_request");
            return Err(e.into());
        }
    };

    let signer = state.signer()?;
    let now_ms = state.clock.now_ms();

    if !signer.verify(&params.email, &params.list, params.issued_at_ms, &params.sig, now_ms) {
        log_unsub(
            UnsubEvent::InvalidSignature,
            &ip,
            Some(&params.email),
            &params.list,
            Some(params.issued_at_ms),
        );
        state.metrics.record(route::UNSUBSCRIBE, "invalid_signature");
        return Err(ApiError::Authentication);
    }

    if let Some(ttl) = state.config.unsubscribe.link_ttl() {
        let age_ms = now_ms.saturating_sub(params.issued_at_ms);
        if age_ms > 0 && age_ms as u128 > ttl.as_millis() {
            log_unsub(
                UnsubEvent::Expired,
                &ip,
                Some(&params.email),
                &params.list,
                Some(params.issued_at_ms),
            );
            state.metrics.record(route::UNSUBSCRIBE, "expired");
            return Err(ApiError::Expired);
        }
    }

    // TODO: persist the unsubscribe once a subscriber store exists
    log_unsub(UnsubEvent::Ok, &ip, Some(&params.email), &params.list, None);
    state.metrics.record(route::UNSUBSCRIBE, "ok");

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], "OK").into_response())
}

/// Add an email address to the waitlist.
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>> {
    let Json(req) = body.map_err(|e| ValidationError::MalformedBody(e.body_text()))?;
    let email = req
        .email
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or(ValidationError::InvalidEmail)
        .and_then(validate_email)?;

    let mailer = state
        .mailer
        .as_ref()
        .ok_or(ApiError::Configuration("missing MailerLite credentials"))?;

    match mailer.subscribe(&email).await {
        Ok(()) => {
            state.metrics.record(route::SUBSCRIBE, "ok");
            Ok(Json(SubscribeResponse { ok: true }))
        }
        Err(e @ MailerError::Rejected { .. }) => {
            state.metrics.record(route::SUBSCRIBE, "rejected");
            Err(ApiError::Upstream(e.to_string()))
        }
        Err(e) => {
            warn!(error = %e, "Subscribe failed");
            state.metrics.record(route::SUBSCRIBE, "error");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

/// Report SPF/DKIM/DMARC presence for a domain.
pub async fn check_domain(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CheckDomainRequest>, JsonRejection>,
) -> Result<Json<DeliverabilityReport>> {
    let Json(req) = body.map_err(|e| ValidationError::MalformedBody(e.body_text()))?;
    let domain = req
        .domain
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or(ValidationError::InvalidDomain)
        .and_then(validate_domain)?;

    let report = state.checker.check(&domain).await;
    state.metrics.record(route::CHECK_DOMAIN, "ok");
    Ok(Json(report))
}

/// Prometheus text exposition.
pub async fn render_metrics(State(state): State<Arc<AppState>>) -> Result<Response> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Client address for rate limiting and logs.
///
/// `X-Real-IP`, then the first `X-Forwarded-For` hop, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = ["x-real-ip", "x-forwarded-for"].iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    });

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
