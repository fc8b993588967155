// faultline-core/tests/fingerprint.rs
// ============================================================================
// Module: Error Fingerprint Tests
// Description: Normalization and fingerprint determinism tests.
// Purpose: Ensure volatile tokens never split error groups.
// Dependencies: faultline-core, proptest
// ============================================================================
//! Validates message normalization and fingerprint idempotence.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use faultline_core::fingerprint;
use faultline_core::normalize_message;
use proptest::prelude::*;

/// Verifies UUIDs are replaced with a stable token.
#[test]
fn normalizes_uuids() {
    let message = "user 550e8400-e29b-41d4-a716-446655440000 not found";
    assert_eq!(normalize_message(message), "user <uuid> not found");
}

/// Verifies IPv4 addresses are replaced before digit runs split them.
#[test]
fn normalizes_ipv4_addresses() {
    let message = "connect to 10.0.42.117 refused";
    assert_eq!(normalize_message(message), "connect to <ip> refused");
}

/// Verifies long hex runs are replaced.
#[test]
fn normalizes_long_hex() {
    let message = "bad request id deadbeefcafe";
    assert_eq!(normalize_message(message), "bad request id <hex>");
}

/// Verifies digit runs are replaced.
#[test]
fn normalizes_digit_runs() {
    let message = "timeout after 30000 ms (attempt 3)";
    assert_eq!(normalize_message(message), "timeout after <num> ms (attempt <num>)");
}

/// Verifies messages differing only in volatile tokens share a fingerprint.
#[test]
fn volatile_tokens_share_fingerprint() {
    let left = fingerprint("api", "TimeoutError", "timeout calling 10.0.0.1 after 3000 ms");
    let right = fingerprint("api", "TimeoutError", "timeout calling 10.9.8.7 after 5000 ms");
    assert_eq!(left, right);
}

/// Verifies distinct services never collide on identical messages.
#[test]
fn service_is_part_of_the_identity() {
    let left = fingerprint("api", "ValueError", "bad input");
    let right = fingerprint("worker", "ValueError", "bad input");
    assert_ne!(left, right);
}

proptest! {
    /// Normalization is idempotent: a normalized message normalizes to itself.
    #[test]
    fn normalization_is_idempotent(message in ".{0,120}") {
        let once = normalize_message(&message);
        let twice = normalize_message(&once);
        prop_assert_eq!(once, twice);
    }

    /// Fingerprinting the same identity twice yields identical digests.
    #[test]
    fn fingerprint_is_deterministic(
        service in "[a-z]{1,12}",
        class in "[A-Za-z]{1,16}",
        message in ".{0,120}",
    ) {
        prop_assert_eq!(
            fingerprint(&service, &class, &message),
            fingerprint(&service, &class, &message)
        );
    }

    /// Normalized output never contains a digit outside placeholder tokens.
    #[test]
    fn normalized_output_has_no_bare_digit_runs(message in ".{0,120}") {
        let normalized = normalize_message(&message);
        let reduced = normalized
            .replace("<uuid>", "")
            .replace("<ip>", "")
            .replace("<hex>", "")
            .replace("<num>", "");
        prop_assert!(!reduced.chars().any(|c| c.is_ascii_digit()));
    }
}
