// faultline-gateway/tests/limits_tests.rs
// ============================================================================
// Module: Rate Limiter Tests
// Description: Token-bucket admission and refill tests.
// Purpose: Ensure per-key limits and header values behave as specified.
// Dependencies: faultline-gateway
// ============================================================================
//! Validates capacity exhaustion, per-key isolation, refill, and the header
//! values carried by both decisions.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use std::time::Duration;

use faultline_gateway::RateLimitDecision;
use faultline_gateway::RateLimiter;

/// Capacity admits exactly `capacity` immediate requests.
#[test]
fn capacity_bounds_burst() {
    let limiter = RateLimiter::new(3, Duration::from_secs(60));
    for _ in 0..3 {
        assert!(matches!(limiter.check("user:a"), RateLimitDecision::Allowed { .. }));
    }
    match limiter.check("user:a") {
        RateLimitDecision::Limited { limit, retry_after_secs } => {
            assert_eq!(limit, 3);
            assert!(retry_after_secs >= 1);
        }
        RateLimitDecision::Allowed { .. } => panic!("expected limited"),
    }
}

/// Keys are isolated: one caller's burst never limits another.
#[test]
fn keys_are_isolated() {
    let limiter = RateLimiter::new(1, Duration::from_secs(60));
    assert!(matches!(limiter.check("user:a"), RateLimitDecision::Allowed { .. }));
    assert!(matches!(limiter.check("user:a"), RateLimitDecision::Limited { .. }));
    assert!(matches!(limiter.check("ip:10.0.0.1"), RateLimitDecision::Allowed { .. }));
}

/// Remaining counts down as tokens drain.
#[test]
fn remaining_counts_down() {
    let limiter = RateLimiter::new(3, Duration::from_secs(60));
    let first = limiter.check("user:a");
    let second = limiter.check("user:a");
    match (first, second) {
        (
            RateLimitDecision::Allowed { remaining: first_remaining, .. },
            RateLimitDecision::Allowed { remaining: second_remaining, .. },
        ) => {
            assert_eq!(first_remaining, 2);
            assert_eq!(second_remaining, 1);
        }
        other => panic!("expected two allowed decisions, got {other:?}"),
    }
}

/// Tokens refill continuously over the window.
#[test]
fn tokens_refill_over_time() {
    // 50 tokens per second makes refill observable in a short sleep.
    let limiter = RateLimiter::new(50, Duration::from_secs(1));
    for _ in 0..50 {
        let _ = limiter.check("user:a");
    }
    assert!(matches!(limiter.check("user:a"), RateLimitDecision::Limited { .. }));
    std::thread::sleep(Duration::from_millis(100));
    assert!(matches!(limiter.check("user:a"), RateLimitDecision::Allowed { .. }));
}
