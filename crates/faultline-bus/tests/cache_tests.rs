// faultline-bus/tests/cache_tests.rs
// ============================================================================
// Module: Memory Cache Tests
// Description: TTL and single-flight semantics tests for the KV cache.
// Purpose: Ensure SET NX EX behavior and lazy expiry.
// Dependencies: faultline-bus, faultline-core
// ============================================================================
//! Validates TTL expiry, atomic replacement, and put-if-absent semantics.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use std::time::Duration;

use faultline_bus::MemoryKvCache;
use faultline_core::interfaces::KvCache;

/// Stored values are readable until their TTL elapses.
#[test]
fn values_live_until_ttl() {
    let cache = MemoryKvCache::new();
    cache.put_ttl("apikey:abc", "ctx", Duration::from_secs(60));
    assert_eq!(cache.get("apikey:abc").as_deref(), Some("ctx"));
}

/// Expired values read as misses and are dropped.
#[test]
fn expired_values_read_as_misses() {
    let cache = MemoryKvCache::new();
    cache.put_ttl("short", "v", Duration::from_millis(1));
    std::thread::sleep(Duration::from_millis(10));
    assert!(cache.get("short").is_none());
    assert_eq!(cache.live_len(), 0);
}

/// Puts replace existing values atomically.
#[test]
fn put_replaces_existing_value() {
    let cache = MemoryKvCache::new();
    cache.put_ttl("key", "old", Duration::from_secs(60));
    cache.put_ttl("key", "new", Duration::from_secs(60));
    assert_eq!(cache.get("key").as_deref(), Some("new"));
}

/// Exactly one caller wins a contended put-if-absent key.
#[test]
fn put_if_absent_admits_one_holder() {
    let cache = MemoryKvCache::new();
    assert!(cache.put_if_absent_ttl("ai:generating:inc-1", "1", Duration::from_secs(60)));
    assert!(!cache.put_if_absent_ttl("ai:generating:inc-1", "1", Duration::from_secs(60)));
    cache.remove("ai:generating:inc-1");
    assert!(cache.put_if_absent_ttl("ai:generating:inc-1", "1", Duration::from_secs(60)));
}

/// An expired lock can be re-acquired without explicit release.
#[test]
fn expired_locks_are_reacquirable() {
    let cache = MemoryKvCache::new();
    assert!(cache.put_if_absent_ttl("lock", "1", Duration::from_millis(1)));
    std::thread::sleep(Duration::from_millis(10));
    assert!(cache.put_if_absent_ttl("lock", "1", Duration::from_secs(60)));
}

/// Removal is idempotent.
#[test]
fn remove_is_idempotent() {
    let cache = MemoryKvCache::new();
    cache.put_ttl("key", "v", Duration::from_secs(60));
    cache.remove("key");
    cache.remove("key");
    assert!(cache.get("key").is_none());
}
