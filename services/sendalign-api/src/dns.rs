// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SPF / DKIM / DMARC presence check over DNS TXT records.
//!
//! The checks are string matches on TXT contents, not full record parsers:
//! - SPF: any TXT at the domain containing `v=spf1`
//! - DKIM: TXT at `<selector>._domainkey.<domain>` for a few common
//!   selectors, containing `DKIM1` or `p=`
//! - DMARC: first TXT at `_dmarc.<domain>`, policy taken from `p=`
//!
//! Lookup failures become notes in the report, never errors.

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Selectors probed for DKIM, in order.
pub const DKIM_SELECTORS: &[&str] = &["selector1", "default", "k1", "s1", "s2", "mail"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("DNS lookup timed out")]
    Timeout,

    #[error("{0}")]
    Lookup(String),
}

/// Boxed future returned by [`TxtResolver::resolve_txt`].
pub type TxtFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>, DnsError>> + Send + 'a>>;

/// Resolves TXT records, each record's character-strings joined into one.
pub trait TxtResolver: Send + Sync {
    fn resolve_txt<'a>(&'a self, name: &'a str) -> TxtFuture<'a>;
}

/// [`TxtResolver`] backed by the system's resolver configuration.
pub struct HickoryTxtResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryTxtResolver {
    /// Use `/etc/resolv.conf` (or the platform equivalent), falling back to
    /// hickory's default upstreams if it cannot be read.
    pub fn from_system(timeout: Duration) -> Self {
        let (config, mut opts) = hickory_resolver::system_conf::read_system_conf()
            .unwrap_or_else(|e| {
                debug!(error = %e, "System resolver config unavailable, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            });
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

impl TxtResolver for HickoryTxtResolver {
    fn resolve_txt<'a>(&'a self, name: &'a str) -> TxtFuture<'a> {
        Box::pin(async move {
            let lookup = self
                .resolver
                .txt_lookup(name)
                .await
                .map_err(|e| DnsError::Lookup(e.to_string()))?;

            Ok(lookup
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|chunk| String::from_utf8_lossy(chunk))
                        .collect::<String>()
                })
                .collect())
        })
    }
}

/// DMARC `p=` policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DmarcPolicy {
    Reject,
    Quarantine,
    None,
    Missing,
}

/// Raw TXT values that drove the verdicts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Records {
    pub spf: Vec<String>,
    pub dkim: Vec<String>,
    pub dmarc: String,
}

/// Result of [`DomainChecker::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverabilityReport {
    pub domain: String,
    pub spf_pass: bool,
    pub dkim_pass: bool,
    pub dmarc_pass: bool,
    pub dmarc_policy: DmarcPolicy,
    pub records: Records,
    pub notes: Vec<String>,
}

impl DeliverabilityReport {
    fn empty(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            spf_pass: false,
            dkim_pass: false,
            dmarc_pass: false,
            dmarc_policy: DmarcPolicy::Missing,
            records: Records::default(),
            notes: Vec::new(),
        }
    }
}

/// Runs the three checks against a resolver, each lookup under a timeout.
#[derive(Clone)]
pub struct DomainChecker {
    resolver: Arc<dyn TxtResolver>,
    timeout: Duration,
}

impl DomainChecker {
    pub fn new(resolver: Arc<dyn TxtResolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    /// Check an already validated domain.
    pub async fn check(&self, domain: &str) -> DeliverabilityReport {
        let mut report = DeliverabilityReport::empty(domain);

        self.check_spf(domain, &mut report).await;
        self.check_dkim(domain, &mut report).await;
        self.check_dmarc(domain, &mut report).await;

        debug!(
            domain,
            spf = report.spf_pass,
            dkim = report.dkim_pass,
            dmarc = report.dmarc_pass,
            "Domain check complete"
        );
        report
    }

    async fn lookup(&self, name: &str) -> Result<Vec<String>, DnsError> {
        match tokio::time::timeout(self.timeout, self.resolver.resolve_txt(name)).await {
            Ok(result) => result,
            Err(_) => Err(DnsError::Timeout),
        }
    }

    async fn check_spf(&self, domain: &str, report: &mut DeliverabilityReport) {
        match self.lookup(domain).await {
            Ok(txt) => {
                report.records.spf = txt
                    .into_iter()
                    .filter(|v| v.to_lowercase().contains("v=spf1"))
                    .collect();
                report.spf_pass = !report.records.spf.is_empty();
                if !report.spf_pass {
                    report.notes.push("No SPF record with v=spf1 found.".to_string());
                }
            }
            Err(e) => report.notes.push(format!("SPF lookup failed: {e}")),
        }
    }

    async fn check_dkim(&self, domain: &str, report: &mut DeliverabilityReport) {
        for selector in DKIM_SELECTORS {
            let host = format!("{selector}._domainkey.{domain}");
            // individual selector failures are expected
            let Ok(txt) = self.lookup(&host).await else {
                continue;
            };

            let hits: Vec<String> = txt
                .into_iter()
                .filter(|v| v.to_uppercase().contains("DKIM1") || v.contains("p="))
                .map(|v| format!("{host}: {v}"))
                .collect();

            if !hits.is_empty() {
                report.dkim_pass = true;
                report.records.dkim = hits;
                break;
            }
        }

        if !report.dkim_pass {
            report.notes.push(
                "No DKIM TXT found on common selectors (e.g., selector1._domainkey).".to_string(),
            );
        }
    }

    async fn check_dmarc(&self, domain: &str, report: &mut DeliverabilityReport) {
        let host = format!("_dmarc.{domain}");
        match self.lookup(&host).await {
            Ok(txt) => match txt.into_iter().next() {
                Some(record) => {
                    let lower = record.to_lowercase();
                    report.dmarc_pass = lower.contains("v=dmarc1");
                    report.dmarc_policy = dmarc_policy(&lower);
                    report.records.dmarc = record;
                }
                None => report
                    .notes
                    .push(format!("No DMARC TXT record found at {host}")),
            },
            Err(e) => report.notes.push(format!("DMARC lookup failed: {e}")),
        }
    }
}

fn dmarc_policy(record_lower: &str) -> DmarcPolicy {
    if record_lower.contains("p=reject") {
        DmarcPolicy::Reject
    } else if record_lower.contains("p=quarantine") {
        DmarcPolicy::Quarantine
    } else if record_lower.contains("p=none") {
        DmarcPolicy::None
    } else {
        DmarcPolicy::Missing
    }
}
