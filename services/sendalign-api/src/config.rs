// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the SendAlign API.
//!
//! Every value can be supplied through the environment (see
//! [`Config::from_env`]); anything left unset falls back to the defaults
//! below.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the SendAlign API service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Public origin of the site, used to build unsubscribe links
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Browser origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Unsubscribe token configuration
    #[serde(default)]
    pub unsubscribe: UnsubscribeConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// MailerLite configuration
    #[serde(default)]
    pub mailer: MailerConfig,

    /// DNS lookup configuration
    #[serde(default)]
    pub dns: DnsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Unsubscribe token settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct UnsubscribeConfig {
    /// HMAC secret. Token routes answer 500 while this is unset.
    #[serde(default)]
    pub secret: Option<String>,

    /// Symmetric verification window in seconds (default: 86400)
    #[serde(default = "default_max_skew_secs")]
    pub max_skew_secs: u64,

    /// Optional narrower window after which a valid link is reported as
    /// expired (410) rather than accepted
    #[serde(default)]
    pub link_ttl_secs: Option<u64>,
}

/// Token bucket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Bucket capacity, i.e. the initial burst (default: 30)
    #[serde(default = "default_capacity")]
    pub capacity: f64,

    /// Tokens added per second (default: 0.5, about 30 requests a minute)
    #[serde(default = "default_refill_per_sec")]
    pub refill_per_sec: f64,

    /// How often idle buckets are pruned, in seconds (default: 60)
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

/// MailerLite API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// Bearer API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Group that new subscribers join (the waitlist)
    #[serde(default)]
    pub group_id: Option<String>,

    /// API origin (default: https://connect.mailerlite.com)
    #[serde(default = "default_mailer_api_url")]
    pub api_url: String,

    /// Request timeout in milliseconds (default: 10000)
    #[serde(default = "default_mailer_timeout_ms")]
    pub timeout_ms: u64,
}

/// DNS lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Per-lookup timeout in milliseconds (default: 5000)
    #[serde(default = "default_dns_timeout_ms")]
    pub timeout_ms: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![default_app_url()]
}

fn default_max_skew_secs() -> u64 {
    24 * 60 * 60
}

fn default_capacity() -> f64 {
    30.0
}

fn default_refill_per_sec() -> f64 {
    0.5
}

fn default_prune_interval_secs() -> u64 {
    60
}

fn default_mailer_api_url() -> String {
    "https://connect.mailerlite.com".to_string()
}

fn default_mailer_timeout_ms() -> u64 {
    10_000
}

fn default_dns_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            app_url: default_app_url(),
            allowed_origins: default_allowed_origins(),
            unsubscribe: UnsubscribeConfig::default(),
            rate_limit: RateLimitConfig::default(),
            mailer: MailerConfig::default(),
            dns: DnsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for UnsubscribeConfig {
    fn default() -> Self {
        Self {
            secret: None,
            max_skew_secs: default_max_skew_secs(),
            link_ttl_secs: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_per_sec: default_refill_per_sec(),
            prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            group_id: None,
            api_url: default_mailer_api_url(),
            timeout_ms: default_mailer_timeout_ms(),
        }
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_dns_timeout_ms(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for UnsubscribeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsubscribeConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("max_skew_secs", &self.max_skew_secs)
            .field("link_ttl_secs", &self.link_ttl_secs)
            .finish()
    }
}

impl std::fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("group_id", &self.group_id)
            .field("api_url", &self.api_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl UnsubscribeConfig {
    /// Get the verification window
    pub fn max_skew(&self) -> Duration {
        Duration::from_secs(self.max_skew_secs)
    }

    /// Get the optional link expiry window
    pub fn link_ttl(&self) -> Option<Duration> {
        self.link_ttl_secs.map(Duration::from_secs)
    }
}

impl RateLimitConfig {
    /// Get the prune interval
    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs.max(1))
    }
}

impl MailerConfig {
    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl DnsConfig {
    /// Get the per-lookup timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to their defaults; empty strings count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        fn parse<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }
        let parsed_u64 = |key: &str| parse::<u64>(var(key));
        let parsed_f64 = |key: &str| parse::<f64>(var(key));

        let defaults = Config::default();

        Config {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            app_url: var("APP_URL").unwrap_or(defaults.app_url),
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
            unsubscribe: UnsubscribeConfig {
                secret: var("UNSUBSCRIBE_SECRET"),
                max_skew_secs: parsed_u64("UNSUBSCRIBE_MAX_SKEW_SECS")
                    .unwrap_or(defaults.unsubscribe.max_skew_secs),
                link_ttl_secs: parsed_u64("UNSUBSCRIBE_LINK_TTL_SECS"),
            },
            rate_limit: RateLimitConfig {
                capacity: parsed_f64("RATE_LIMIT_CAPACITY")
                    .filter(|c: &f64| c.is_finite() && *c >= 1.0)
                    .unwrap_or(defaults.rate_limit.capacity),
                refill_per_sec: parsed_f64("RATE_LIMIT_REFILL_PER_SEC")
                    .filter(|r: &f64| r.is_finite() && *r > 0.0)
                    .unwrap_or(defaults.rate_limit.refill_per_sec),
                ..defaults.rate_limit
            },
            mailer: MailerConfig {
                api_key: var("MAILERLITE_API_KEY"),
                group_id: var("MAILERLITE_GROUP_ID"),
                api_url: var("MAILERLITE_API_URL").unwrap_or(defaults.mailer.api_url),
                ..defaults.mailer
            },
            dns: DnsConfig {
                timeout_ms: parsed_u64("DNS_TIMEOUT_MS").unwrap_or(defaults.dns.timeout_ms),
            },
            metrics: MetricsConfig {
                enabled: parse::<bool>(var("METRICS_ENABLED")).unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        }
    }
}
