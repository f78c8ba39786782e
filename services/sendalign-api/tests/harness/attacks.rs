// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Attack patterns against the unsubscribe endpoint.

use std::time::Duration;

/// How each simulated request's token is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A genuine link issued by the server
    Genuine,
    /// Random hex of the right length
    Forged,
    /// Genuine signature presented for a different address
    Retargeted,
    /// Genuine link issued longer ago than the verification window
    Stale,
    /// Query string with parameters missing
    Truncated,
}

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Simulated request rate, across all clients
    pub requests_per_second: f64,
    /// Number of unique client addresses
    pub unique_ips: usize,
    /// Number of distinct victim addresses
    pub unique_emails: usize,
    pub token: TokenKind,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            requests_per_second: 10.0,
            unique_ips: 1,
            unique_emails: 1,
            token: TokenKind::Genuine,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// One client guessing signatures as fast as it can.
    pub fn signature_brute_force() -> Self {
        Self {
            total_requests: 500,
            requests_per_second: 200.0,
            token: TokenKind::Forged,
            ..Default::default()
        }
    }

    /// Many clients guessing signatures, spreading load across buckets.
    pub fn distributed_brute_force() -> Self {
        Self {
            total_requests: 1000,
            requests_per_second: 200.0,
            unique_ips: 100,
            unique_emails: 20,
            token: TokenKind::Forged,
        }
    }

    /// Reuse a genuine signature to unsubscribe somebody else.
    pub fn retargeting() -> Self {
        Self {
            total_requests: 50,
            requests_per_second: 5.0,
            unique_ips: 5,
            unique_emails: 10,
            token: TokenKind::Retargeted,
        }
    }

    /// Replay links older than the verification window.
    pub fn stale_replay() -> Self {
        Self {
            total_requests: 50,
            requests_per_second: 5.0,
            unique_ips: 5,
            unique_emails: 10,
            token: TokenKind::Stale,
        }
    }

    /// Malformed query strings.
    pub fn truncated_params() -> Self {
        Self {
            total_requests: 50,
            requests_per_second: 5.0,
            unique_ips: 5,
            unique_emails: 5,
            token: TokenKind::Truncated,
        }
    }

    /// A single client flooding genuine links.
    pub fn genuine_flood() -> Self {
        Self {
            total_requests: 200,
            requests_per_second: 100.0,
            unique_emails: 10,
            ..Default::default()
        }
    }

    /// Genuine traffic under the refill rate.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 100,
            requests_per_second: 0.4,
            unique_emails: 5,
            ..Default::default()
        }
    }

    /// Simulated time between consecutive requests.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.requests_per_second)
    }

    /// Calculate expected duration for the attack.
    pub fn expected_duration(&self) -> Duration {
        Duration::from_secs_f64(self.total_requests as f64 / self.requests_per_second)
    }

    /// Upper bound on requests the limiter can let through from one client
    /// over the run: the burst plus everything refilled meanwhile.
    pub fn max_admitted_per_ip(&self, capacity: f64, refill_per_sec: f64) -> usize {
        (capacity + refill_per_sec * self.expected_duration().as_secs_f64()).ceil() as usize
    }
}
