// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Token bucket rate limiter for the unsubscribe endpoints.
//!
//! One bucket per caller key (`unsub:<ip>` and friends), created full on
//! first use. Bucket state lives behind a [`BucketStore`]; the default
//! [`MemoryBucketStore`] keeps it in process memory, so limits reset on
//! restart and are not shared between instances.

use crate::config::RateLimitConfig;
use dashmap::DashMap;
use tracing::debug;

/// Capacity and refill rate applied to a bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketLimit {
    /// Maximum tokens (bucket capacity)
    pub capacity: f64,
    /// Token refill rate per second
    pub refill_per_sec: f64,
}

impl Default for BucketLimit {
    fn default() -> Self {
        Self {
            capacity: 30.0,
            refill_per_sec: 0.5,
        }
    }
}

impl From<&RateLimitConfig> for BucketLimit {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            capacity: config.capacity,
            refill_per_sec: config.refill_per_sec,
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Whole seconds until one token is available; 0 when allowed
    pub retry_after_secs: u64,
}

impl RateDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
        }
    }

    fn deny(retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            retry_after_secs,
        }
    }
}

/// Token bucket for one caller key.
#[derive(Debug, Clone, PartialEq)]
pub struct RateBucket {
    /// Available tokens, `0 <= tokens <= capacity`
    pub tokens: f64,
    /// Last time tokens were refilled (seconds since epoch)
    pub last_refill_at_sec: f64,
}

impl RateBucket {
    /// A full bucket as of `now`.
    pub fn full(limit: &BucketLimit, now: f64) -> Self {
        Self {
            tokens: limit.capacity,
            last_refill_at_sec: now,
        }
    }

    /// Refill tokens based on elapsed time. Clock steps backwards add nothing.
    fn refill(&mut self, limit: &BucketLimit, now: f64) {
        let elapsed = (now - self.last_refill_at_sec).max(0.0);
        self.tokens = (self.tokens + elapsed * limit.refill_per_sec).min(limit.capacity);
        self.last_refill_at_sec = now;
    }

    /// Refill, then consume one token if at least one is available.
    pub fn try_take(&mut self, limit: &BucketLimit, now: f64) -> RateDecision {
        self.refill(limit, now);

        if self.tokens < 1.0 {
            let needed = 1.0 - self.tokens;
            let retry_after = (needed / limit.refill_per_sec).ceil();
            return RateDecision::deny(retry_after as u64);
        }

        self.tokens -= 1.0;
        RateDecision::allow()
    }

    /// True once the bucket would have refilled to capacity by `now`.
    fn is_full_at(&self, limit: &BucketLimit, now: f64) -> bool {
        let elapsed = (now - self.last_refill_at_sec).max(0.0);
        self.tokens + elapsed * limit.refill_per_sec >= limit.capacity
    }
}

/// Storage backend for rate buckets.
///
/// `take` must apply refill-and-consume for one key as a single critical
/// section; calls for different keys must not wait on each other beyond
/// the store's own internal sharding.
pub trait BucketStore: Send + Sync {
    /// Look up or create the bucket for `key` and try to take one token.
    fn take(&self, key: &str, limit: &BucketLimit, now: f64) -> RateDecision;

    /// Drop buckets that would be back at capacity by `now`. Returns the
    /// number removed.
    fn prune(&self, limit: &BucketLimit, now: f64) -> usize;

    /// Number of live buckets.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process bucket store backed by a sharded `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryBucketStore {
    buckets: DashMap<String, RateBucket>,
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a bucket, for diagnostics and tests.
    pub fn get(&self, key: &str) -> Option<RateBucket> {
        self.buckets.get(key).map(|b| b.value().clone())
    }
}

impl BucketStore for MemoryBucketStore {
    fn take(&self, key: &str, limit: &BucketLimit, now: f64) -> RateDecision {
        // The entry guard holds the shard write lock for the whole
        // refill-and-consume step.
        let mut bucket = self
            .buckets
            .entry(key.to_owned())
            .or_insert_with(|| RateBucket::full(limit, now));
        bucket.try_take(limit, now)
    }

    fn prune(&self, limit: &BucketLimit, now: f64) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_full_at(limit, now));
        before.saturating_sub(self.buckets.len())
    }

    fn len(&self) -> usize {
        self.buckets.len()
    }
}

/// Per-key token bucket rate limiter.
pub struct RateLimiter<S: BucketStore = MemoryBucketStore> {
    /// Limit applied by [`RateLimiter::check`]
    limit: BucketLimit,
    store: S,
}

impl RateLimiter<MemoryBucketStore> {
    /// Create an in-memory rate limiter with the given configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_store(BucketLimit::from(config), MemoryBucketStore::new())
    }
}

impl<S: BucketStore> RateLimiter<S> {
    /// Create a rate limiter over an explicit store.
    pub fn with_store(limit: BucketLimit, store: S) -> Self {
        Self { limit, store }
    }

    pub fn limit(&self) -> BucketLimit {
        self.limit
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check `key` against an explicit capacity and refill rate.
    pub fn allow(&self, key: &str, capacity: f64, refill_per_sec: f64, now: f64) -> RateDecision {
        let limit = BucketLimit {
            capacity,
            refill_per_sec,
        };
        let decision = self.store.take(key, &limit, now);
        if !decision.allowed {
            debug!(key, retry_after_secs = decision.retry_after_secs, "Rate limit exceeded");
        }
        decision
    }

    /// Check `key` against the configured limit.
    pub fn check(&self, key: &str, now: f64) -> RateDecision {
        self.allow(key, self.limit.capacity, self.limit.refill_per_sec, now)
    }

    /// Clean up idle buckets (should be called periodically).
    pub fn cleanup(&self, now: f64) -> usize {
        let removed = self.store.prune(&self.limit, now);
        if removed > 0 {
            debug!(removed, remaining = self.store.len(), "Pruned idle rate buckets");
        }
        removed
    }
}
