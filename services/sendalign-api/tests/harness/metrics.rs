// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for attack simulation results.

use axum::http::StatusCode;
use std::collections::HashMap;

/// Collects outcomes during attack simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    outcomes: HashMap<Outcome, usize>,
    /// Count of requests by client address
    requests_per_ip: HashMap<String, usize>,
    /// Requests admitted past the limiter, by client address
    admitted_per_ip: HashMap<String, usize>,
    /// Simulated duration of the run
    elapsed_ms: i64,
}

/// Possible outcomes for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Unsubscribed,
    RateLimited,
    InvalidSignature,
    Expired,
    BadRequest,
    Other,
}

impl Outcome {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => Self::Unsubscribed,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::UNAUTHORIZED => Self::InvalidSignature,
            StatusCode::GONE => Self::Expired,
            StatusCode::BAD_REQUEST => Self::BadRequest,
            _ => Self::Other,
        }
    }
}

impl AttackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, ip: &str) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        if outcome != Outcome::RateLimited {
            *self.admitted_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        }
    }

    pub fn set_elapsed_ms(&mut self, elapsed_ms: i64) {
        self.elapsed_ms = elapsed_ms;
    }

    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Ratio of requests that did not unsubscribe anyone.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (total - self.count(Outcome::Unsubscribed)) as f64 / total as f64
    }

    /// Most requests any single client got past the limiter.
    pub fn max_admitted_per_ip(&self) -> usize {
        self.admitted_per_ip.values().copied().max().unwrap_or(0)
    }

    pub fn unique_ips(&self) -> usize {
        self.requests_per_ip.len()
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            unsubscribed: self.count(Outcome::Unsubscribed),
            rate_limited: self.count(Outcome::RateLimited),
            invalid_signature: self.count(Outcome::InvalidSignature),
            expired: self.count(Outcome::Expired),
            bad_request: self.count(Outcome::BadRequest),
            other: self.count(Outcome::Other),
            simulated_ms: self.elapsed_ms,
            block_rate: self.block_rate(),
            max_admitted_per_ip: self.max_admitted_per_ip(),
            unique_ips: self.unique_ips(),
        }
    }
}

/// Summary report of attack metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub unsubscribed: usize,
    pub rate_limited: usize,
    pub invalid_signature: usize,
    pub expired: usize,
    pub bad_request: usize,
    pub other: usize,
    pub simulated_ms: i64,
    pub block_rate: f64,
    pub max_admitted_per_ip: usize,
    pub unique_ips: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Attack Metrics Report ===")?;
        writeln!(f, "Simulated:         {} ms", self.simulated_ms)?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f)?;
        writeln!(f, "--- Outcomes ---")?;
        writeln!(f, "Unsubscribed:      {}", self.unsubscribed)?;
        writeln!(f, "Rate Limited:      {}", self.rate_limited)?;
        writeln!(f, "Invalid Signature: {}", self.invalid_signature)?;
        writeln!(f, "Expired:           {}", self.expired)?;
        writeln!(f, "Bad Request:       {}", self.bad_request)?;
        writeln!(f, "Other:             {}", self.other)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f)?;
        writeln!(f, "--- Distribution ---")?;
        writeln!(f, "Unique IPs:        {}", self.unique_ips)?;
        writeln!(f, "Max admitted/IP:   {}", self.max_admitted_per_ip)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = AttackMetrics::new();
        metrics.record(Outcome::Unsubscribed, "10.0.0.1");
        metrics.record(Outcome::InvalidSignature, "10.0.0.1");
        metrics.record(Outcome::RateLimited, "10.0.0.1");
        metrics.record(Outcome::Unsubscribed, "10.0.0.2");

        assert_eq!(metrics.total_requests(), 4);
        assert_eq!(metrics.count(Outcome::Unsubscribed), 2);
        assert_eq!(metrics.unique_ips(), 2);
        assert_eq!(metrics.max_admitted_per_ip(), 2);
        assert!((metrics.block_rate() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(Outcome::from_status(StatusCode::GONE), Outcome::Expired);
        assert_eq!(Outcome::from_status(StatusCode::IM_A_TEAPOT), Outcome::Other);
    }
}
