// faultline-gateway/src/limits.rs
// ============================================================================
// Module: Gateway Rate Limiting
// Description: Token-bucket rate limiter with in-memory buckets.
// Purpose: Bound request rates per caller before handlers run.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Requests are limited by a token bucket keyed by the authenticated user id
//! when present, else the source IP. Buckets refill continuously at
//! `capacity / window`; a drained bucket yields a 429 decision carrying the
//! `X-RateLimit-*` header values and a `Retry-After` hint. Buckets live in a
//! mutex-guarded map and are swept opportunistically when the map grows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Map size above which a check also sweeps full, idle buckets.
const SWEEP_THRESHOLD: usize = 16_384;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Rate limit decision with the response header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request admitted.
    Allowed {
        /// Configured capacity (`X-RateLimit-Limit`).
        limit: u32,
        /// Tokens left after this request (`X-RateLimit-Remaining`).
        remaining: u32,
        /// Seconds until the bucket is full again (`X-RateLimit-Reset`).
        reset_secs: u64,
    },
    /// Request rejected.
    Limited {
        /// Configured capacity (`X-RateLimit-Limit`).
        limit: u32,
        /// Seconds until one token is available (`Retry-After`).
        retry_after_secs: u64,
    },
}

// ============================================================================
// SECTION: Limiter
// ============================================================================

/// Per-key token state.
struct Bucket {
    /// Tokens currently available.
    tokens: f64,
    /// Last refill instant.
    last_refill: Instant,
}

/// Token-bucket rate limiter.
pub struct RateLimiter {
    /// Bucket capacity.
    capacity: u32,
    /// Refill window for a full bucket.
    window: Duration,
    /// Buckets keyed by caller identity.
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Builds a limiter admitting `capacity` requests per `window` per key.
    #[must_use]
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self { capacity, window, buckets: Mutex::new(HashMap::new()) }
    }

    /// Checks (and consumes) one token for the key.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let refill_per_sec = f64::from(self.capacity) / self.window.as_secs_f64();
        let Ok(mut buckets) = self.buckets.lock() else {
            // A poisoned limiter admits traffic rather than taking the
            // gateway down.
            return RateLimitDecision::Allowed {
                limit: self.capacity,
                remaining: self.capacity,
                reset_secs: 0,
            };
        };
        if buckets.len() > SWEEP_THRESHOLD {
            let capacity = f64::from(self.capacity);
            buckets.retain(|_, bucket| bucket.tokens < capacity - 0.5);
        }
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: f64::from(self.capacity),
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens =
            (bucket.tokens + elapsed * refill_per_sec).min(f64::from(self.capacity));
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            let missing = f64::from(self.capacity) - bucket.tokens;
            let reset_secs = (missing / refill_per_sec).ceil().max(0.0);
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "Values are small non-negative seconds and token counts."
            )]
            let decision = RateLimitDecision::Allowed {
                limit: self.capacity,
                remaining: bucket.tokens.floor() as u32,
                reset_secs: reset_secs as u64,
            };
            decision
        } else {
            let deficit = 1.0 - bucket.tokens;
            let retry = (deficit / refill_per_sec).ceil().max(1.0);
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "Values are small non-negative seconds."
            )]
            let decision = RateLimitDecision::Limited {
                limit: self.capacity,
                retry_after_secs: retry as u64,
            };
            decision
        }
    }
}
