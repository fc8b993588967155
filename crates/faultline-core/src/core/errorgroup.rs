// faultline-core/src/core/errorgroup.rs
// ============================================================================
// Module: Faultline Error Grouping
// Description: Error events, groups, occurrences, and fingerprinting.
// Purpose: Aggregate error events deterministically by normalized identity.
// Dependencies: serde, serde_json, crate::core::hashing
// ============================================================================

//! ## Overview
//! Error events are fingerprinted by `(service, class, normalized message)`
//! where normalization replaces volatile tokens (UUIDs, IPv4 addresses, long
//! hex runs, digit runs) with stable placeholders. The fingerprint is the
//! SHA-256 digest of the joined identity and is unique per project; all
//! occurrences of an identity aggregate under one group.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::hashing::sha256_hex;
use crate::core::identifiers::GroupId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum normalized-message length used for fingerprinting.
const NORMALIZED_MESSAGE_LIMIT: usize = 200;
/// Minimum hex-run length treated as a volatile token.
const LONG_HEX_MIN_LEN: usize = 8;
/// Occurrences retained per group; older rows are pruned by the store.
pub const OCCURRENCES_RETAINED: usize = 100;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Error event as submitted by agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Emitting service.
    pub service_name: String,
    /// Error class or exception type.
    pub error_class: String,
    /// Raw error message.
    pub message: String,
    /// Optional stack trace.
    #[serde(default)]
    pub stack_trace: Option<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Value,
    /// Event timestamp; the ingest plane stamps `now` when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Triage status of an error group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriageStatus {
    /// Not yet triaged.
    #[default]
    Unresolved,
    /// Actively being investigated.
    Investigating,
    /// Fixed or otherwise resolved.
    Resolved,
    /// Intentionally ignored.
    Ignored,
}

impl TriageStatus {
    /// Returns the stable status label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Investigating => "investigating",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }

    /// Parses a status label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unresolved" => Some(Self::Unresolved),
            "investigating" => Some(Self::Investigating),
            "resolved" => Some(Self::Resolved),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }
}

/// Aggregated error group.
///
/// # Invariants
/// - `fingerprint` is unique per project; the store enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorGroup {
    /// Group identifier.
    pub id: GroupId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Deterministic identity digest.
    pub fingerprint: String,
    /// Emitting service.
    pub service_name: String,
    /// Error class.
    pub error_class: String,
    /// Representative raw message (first seen).
    pub message: String,
    /// Total occurrences aggregated.
    pub occurrence_count: u64,
    /// First occurrence timestamp.
    pub first_seen: Timestamp,
    /// Latest occurrence timestamp.
    pub last_seen: Timestamp,
    /// Triage status.
    pub status: TriageStatus,
    /// Assignee, when triaged.
    #[serde(default)]
    pub assignee: Option<String>,
}

/// Single occurrence owned by an error group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorOccurrence {
    /// Owning group.
    pub group_id: GroupId,
    /// Stack trace captured with the event.
    #[serde(default)]
    pub stack_trace: Option<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Value,
    /// Occurrence timestamp.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes an error message for fingerprinting.
///
/// Volatile tokens are replaced in one left-to-right pass with the following
/// precedence at each position: UUID, IPv4 address, hex run of at least eight
/// characters containing a letter, digit run. The result is truncated to a
/// fixed limit so unbounded messages cannot produce unbounded identities.
#[must_use]
pub fn normalize_message(message: &str) -> String {
    let chars: Vec<char> = message.chars().collect();
    let mut out = String::with_capacity(message.len().min(NORMALIZED_MESSAGE_LIMIT));
    let mut written = 0_usize;
    let mut index = 0;
    while index < chars.len() && written < NORMALIZED_MESSAGE_LIMIT {
        if let Some(consumed) = match_uuid(&chars[index..]) {
            out.push_str("<uuid>");
            written += "<uuid>".len();
            index += consumed;
        } else if let Some(consumed) = match_ipv4(&chars[index..]) {
            out.push_str("<ip>");
            written += "<ip>".len();
            index += consumed;
        } else if let Some(consumed) = match_long_hex(&chars[index..]) {
            out.push_str("<hex>");
            written += "<hex>".len();
            index += consumed;
        } else if let Some(consumed) = match_digits(&chars[index..]) {
            out.push_str("<num>");
            written += "<num>".len();
            index += consumed;
        } else {
            out.push(chars[index]);
            written += 1;
            index += 1;
        }
    }
    out.chars().take(NORMALIZED_MESSAGE_LIMIT).collect()
}

/// Computes the group fingerprint for an error identity.
#[must_use]
pub fn fingerprint(service_name: &str, error_class: &str, message: &str) -> String {
    let identity = format!("{service_name}|{error_class}|{}", normalize_message(message));
    sha256_hex(identity.as_bytes())
}

/// Matches an 8-4-4-4-12 hex UUID at the slice start.
fn match_uuid(chars: &[char]) -> Option<usize> {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    let mut offset = 0;
    for (position, group_len) in GROUPS.iter().enumerate() {
        for _ in 0..*group_len {
            if !chars.get(offset).is_some_and(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            offset += 1;
        }
        if position < GROUPS.len() - 1 {
            if chars.get(offset) != Some(&'-') {
                return None;
            }
            offset += 1;
        }
    }
    // Reject when the UUID is embedded in a longer hex run.
    if chars.get(offset).is_some_and(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(offset)
}

/// Matches a dotted-quad IPv4 address at the slice start.
fn match_ipv4(chars: &[char]) -> Option<usize> {
    let mut offset = 0;
    for position in 0..4 {
        let start = offset;
        while chars.get(offset).is_some_and(char::is_ascii_digit) && offset - start < 3 {
            offset += 1;
        }
        if offset == start {
            return None;
        }
        let octet: String = chars[start..offset].iter().collect();
        if octet.parse::<u16>().ok()? > 255 {
            return None;
        }
        if position < 3 {
            if chars.get(offset) != Some(&'.') {
                return None;
            }
            offset += 1;
        }
    }
    if chars.get(offset).is_some_and(char::is_ascii_digit) {
        return None;
    }
    Some(offset)
}

/// Matches a hex run of at least eight characters containing a letter.
fn match_long_hex(chars: &[char]) -> Option<usize> {
    let mut offset = 0;
    let mut has_letter = false;
    while chars.get(offset).is_some_and(|c| c.is_ascii_hexdigit()) {
        if chars[offset].is_ascii_alphabetic() {
            has_letter = true;
        }
        offset += 1;
    }
    if offset >= LONG_HEX_MIN_LEN && has_letter { Some(offset) } else { None }
}

/// Matches a maximal digit run at the slice start.
fn match_digits(chars: &[char]) -> Option<usize> {
    let mut offset = 0;
    while chars.get(offset).is_some_and(char::is_ascii_digit) {
        offset += 1;
    }
    if offset > 0 { Some(offset) } else { None }
}
