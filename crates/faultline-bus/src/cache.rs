// faultline-bus/src/cache.rs
// ============================================================================
// Module: Faultline Memory Cache
// Description: In-process key-value cache with per-entry TTL.
// Purpose: Back API-key lookups and the AI single-flight lock.
// Dependencies: faultline-core, std
// ============================================================================

//! ## Overview
//! [`MemoryKvCache`] implements the core [`KvCache`] seam over a mutex-guarded
//! map with per-entry expiry. `put_if_absent_ttl` provides `SET NX EX`
//! semantics under the same lock, so exactly one caller wins a contended key.
//! Expired entries are dropped lazily on access and swept opportunistically
//! when the map grows, so an idle cache never needs a background task.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use faultline_core::interfaces::KvCache;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Map size above which a put also sweeps expired entries.
const SWEEP_THRESHOLD: usize = 4_096;

// ============================================================================
// SECTION: Entry
// ============================================================================

/// Cache entry with its expiry instant.
#[derive(Debug, Clone)]
struct Entry {
    /// Stored value.
    value: String,
    /// Instant after which the entry is dead.
    expires_at: Instant,
}

impl Entry {
    /// Returns true when the entry is still live.
    fn is_live(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

// ============================================================================
// SECTION: Memory Cache
// ============================================================================

/// In-process TTL cache.
#[derive(Default)]
pub struct MemoryKvCache {
    /// Entries keyed by cache key.
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryKvCache {
    /// Builds an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries, for diagnostics.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|entry| entry.is_live()).count())
            .unwrap_or(0)
    }

    /// Drops expired entries when the map has grown past the threshold.
    fn sweep_if_large(entries: &mut HashMap<String, Entry>) {
        if entries.len() > SWEEP_THRESHOLD {
            entries.retain(|_, entry| entry.is_live());
        }
    }
}

impl KvCache for MemoryKvCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.is_live() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put_ttl(&self, key: &str, value: &str, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            Self::sweep_if_large(&mut entries);
            entries.insert(
                key.to_string(),
                Entry { value: value.to_string(), expires_at: Instant::now() + ttl },
            );
        }
    }

    fn put_if_absent_ttl(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        Self::sweep_if_large(&mut entries);
        if entries.get(key).is_some_and(Entry::is_live) {
            return false;
        }
        entries.insert(
            key.to_string(),
            Entry { value: value.to_string(), expires_at: Instant::now() + ttl },
        );
        true
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
