// faultline-contract/src/envelope.rs
// ============================================================================
// Module: API Envelope
// Description: Standard JSON success and error envelopes.
// Purpose: Keep every HTTP surface on one response shape.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Success responses are `{status: "success", data, total?, message?}`; list
//! endpoints carry `total` so clients know the full match count. Error
//! responses are `{status: "error", detail, error_code}` with a stable code
//! from a fixed enumeration. Validation failures are always normalized to
//! HTTP 400.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Stable error codes carried by error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// `project_id` missing from the request.
    MissingProjectId,
    /// `tenant_id` missing from the request.
    MissingTenantId,
    /// An identifier failed UUID validation.
    InvalidUuid,
    /// A required field is missing or empty.
    MissingRequiredField,
    /// A field value is outside its allowed set.
    InvalidFieldValue,
    /// The addressed resource does not exist.
    ResourceNotFound,
    /// Request body failed validation.
    ValidationError,
    /// Caller is not authenticated or not authorized.
    Unauthorized,
    /// A dependency is unavailable.
    ServiceUnavailable,
    /// A conflicting operation is already in progress.
    Conflict,
    /// Caller exceeded the rate limit.
    RateLimited,
}

impl ErrorCode {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingProjectId => "MISSING_PROJECT_ID",
            Self::MissingTenantId => "MISSING_TENANT_ID",
            Self::InvalidUuid => "INVALID_UUID",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::InvalidFieldValue => "INVALID_FIELD_VALUE",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
        }
    }
}

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Standard success envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Always `success`.
    pub status: String,
    /// Response payload.
    pub data: T,
    /// Total matches for list endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Optional human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Wraps a payload in a success envelope.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self { status: "success".to_string(), data, total: None, message: None }
    }

    /// Wraps a list payload carrying its total match count.
    #[must_use]
    pub fn ok_with_total(data: T, total: u64) -> Self {
        Self { status: "success".to_string(), data, total: Some(total), message: None }
    }

    /// Attaches a message to the envelope.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Standard error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `error`.
    pub status: String,
    /// Human-readable failure description.
    pub detail: String,
    /// Stable machine-readable code.
    pub error_code: ErrorCode,
}

impl ErrorBody {
    /// Builds an error envelope.
    #[must_use]
    pub fn new(detail: impl Into<String>, error_code: ErrorCode) -> Self {
        Self { status: "error".to_string(), detail: detail.into(), error_code }
    }
}
