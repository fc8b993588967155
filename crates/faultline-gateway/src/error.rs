// faultline-gateway/src/error.rs
// ============================================================================
// Module: Gateway Error Mapping
// Description: Result-typed handler errors translated to HTTP at the edge.
// Purpose: Keep every failure on the standard error envelope.
// Dependencies: axum, faultline-contract, faultline-core
// ============================================================================

//! ## Overview
//! Handlers return [`ApiError`] instead of raising; translation to HTTP
//! happens only here, at the outermost boundary. Internal failures are
//! redacted to a generic message, validation failures normalize to 400 with a
//! stable error code, single-flight collisions map to 409, and upstream
//! transport failures map to 502/504.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use faultline_contract::ErrorBody;
use faultline_contract::ErrorCode;
use faultline_core::interfaces::ModelError;
use faultline_core::interfaces::StoreError;
use faultline_core::runtime::EnrichmentError;
use faultline_core::runtime::OrchestratorError;
use tracing::error;

// ============================================================================
// SECTION: API Error
// ============================================================================

/// Handler error carrying the HTTP status and the standard error body.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Error envelope.
    pub body: ErrorBody,
}

impl ApiError {
    /// Builds an error from parts.
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>, code: ErrorCode) -> Self {
        Self { status, body: ErrorBody::new(detail, code) }
    }

    /// 400 validation failure.
    #[must_use]
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail, ErrorCode::ValidationError)
    }

    /// 400 invalid field value.
    #[must_use]
    pub fn invalid_field(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail, ErrorCode::InvalidFieldValue)
    }

    /// 400 missing project id.
    #[must_use]
    pub fn missing_project_id() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "project_id is required",
            ErrorCode::MissingProjectId,
        )
    }

    /// 400 malformed UUID.
    #[must_use]
    pub fn invalid_uuid(field: &str, value: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            format!("{field} must be a valid UUID, got: {value:?}"),
            ErrorCode::InvalidUuid,
        )
    }

    /// 401 authentication failure.
    #[must_use]
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail, ErrorCode::Unauthorized)
    }

    /// 403 authorization failure.
    #[must_use]
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, detail, ErrorCode::Unauthorized)
    }

    /// 404 missing resource.
    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail, ErrorCode::ResourceNotFound)
    }

    /// 409 conflicting operation in progress.
    #[must_use]
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, detail, ErrorCode::Conflict)
    }

    /// 503 dependency unavailable.
    #[must_use]
    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, detail, ErrorCode::ServiceUnavailable)
    }

    /// 500 with redacted detail; the cause is logged, never returned.
    #[must_use]
    pub fn internal(cause: &dyn std::fmt::Display) -> Self {
        error!(error = %cause, "internal failure");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error",
            ErrorCode::ServiceUnavailable,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(detail) => Self::not_found(detail),
            StoreError::Conflict(detail) => Self::conflict(detail),
            StoreError::Invalid(detail) => Self::validation(detail),
            other => Self::internal(&other),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(error: OrchestratorError) -> Self {
        match error {
            OrchestratorError::NotFound(_) => Self::not_found("Incident not found"),
            OrchestratorError::InvalidTransition { from, to } => {
                Self::invalid_field(format!("invalid state transition: {from} -> {to}"))
            }
            OrchestratorError::Store(inner) => inner.into(),
        }
    }
}

impl From<EnrichmentError> for ApiError {
    fn from(error: EnrichmentError) -> Self {
        match error {
            EnrichmentError::NotFound(_) => Self::not_found("Incident not found"),
            EnrichmentError::InProgress(incident) => Self::conflict(format!(
                "hypothesis generation already in progress for incident {incident}"
            )),
            EnrichmentError::BatchSize(size) => {
                Self::validation(format!("invalid batch size: {size} (max 10)"))
            }
            EnrichmentError::Model(inner) => inner.into(),
            EnrichmentError::Parse(detail) => {
                Self::internal(&format!("model response unusable: {detail}"))
            }
            EnrichmentError::Store(inner) => inner.into(),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::Unreachable(detail) => {
                Self::new(StatusCode::BAD_GATEWAY, detail, ErrorCode::ServiceUnavailable)
            }
            ModelError::Timeout(detail) => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, detail, ErrorCode::ServiceUnavailable)
            }
            ModelError::InvalidResponse(detail) => Self::internal(&detail),
        }
    }
}
