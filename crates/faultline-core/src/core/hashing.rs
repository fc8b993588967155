// faultline-core/src/core/hashing.rs
// ============================================================================
// Module: Faultline Hashing
// Description: Digest helpers for API keys and error fingerprints.
// Purpose: Provide one canonical one-way digest used across the platform.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! All one-way digests in Faultline are SHA-256 rendered as lowercase hex:
//! API key material at rest, error fingerprints, and webhook token
//! fingerprints. Keeping a single helper avoids algorithm drift between the
//! auth plane and the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Digest Helpers
// ============================================================================

/// Computes the lowercase hex SHA-256 digest of the provided bytes.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = std::fmt::Write::write_fmt(&mut out, format_args!("{byte:02x}"));
    }
    out
}
