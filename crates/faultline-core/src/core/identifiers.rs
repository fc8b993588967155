// faultline-core/src/core/identifiers.rs
// ============================================================================
// Module: Faultline Identifiers
// Description: Canonical opaque identifiers for Faultline entities.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! Faultline. Identifiers are opaque and serialize as strings. Freshly minted
//! identifiers are UUID v4 values; validation of externally supplied values is
//! handled at API boundaries rather than within these simple wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Defines an opaque string identifier with the shared wrapper surface.
macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from an existing string form.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mints a fresh UUID v4 identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_id! {
    /// Tenant identifier, the root isolation unit.
    TenantId
}

string_id! {
    /// Project identifier scoped to a tenant.
    ProjectId
}

string_id! {
    /// API key identifier (not the key material itself).
    ApiKeyId
}

string_id! {
    /// Incident identifier.
    IncidentId
}

string_id! {
    /// Alert condition identifier.
    ConditionId
}

string_id! {
    /// Alert policy identifier.
    PolicyId
}

string_id! {
    /// Notification channel identifier.
    ChannelId
}

string_id! {
    /// Muting rule identifier.
    RuleId
}

string_id! {
    /// Active alert identifier.
    AlertId
}

string_id! {
    /// Error group identifier.
    GroupId
}

string_id! {
    /// Hypothesis identifier.
    HypothesisId
}

string_id! {
    /// Analysis step identifier.
    StepId
}

string_id! {
    /// Incident activity identifier.
    ActivityId
}

string_id! {
    /// AI request audit record identifier.
    AiRequestId
}

string_id! {
    /// Realtime client session identifier.
    ClientId
}

string_id! {
    /// CI/CD webhook connection identifier.
    ConnectionId
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Returns true when the value parses as a UUID.
///
/// API boundaries use this to normalize malformed identifiers into
/// validation errors before touching the store.
#[must_use]
pub fn is_valid_uuid(value: &str) -> bool {
    uuid::Uuid::parse_str(value.trim()).is_ok()
}
