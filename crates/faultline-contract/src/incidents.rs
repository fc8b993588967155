// faultline-contract/src/incidents.rs
// ============================================================================
// Module: Incident Wire Contract
// Description: Request bodies for the incident API surface.
// Purpose: Define the JWT-authenticated incident mutation payloads.
// Dependencies: faultline-core, serde
// ============================================================================

//! ## Overview
//! Incident API requests carry user-supplied fields only; actor identity is
//! taken from the validated JWT, project scope from the `project_id` query
//! parameter, and everything else from the store. Responses serialize the
//! core records directly inside the standard envelope.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::Incident;
use faultline_core::IncidentSeverity;
use faultline_core::IncidentState;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted incident title length.
pub const TITLE_LIMIT: usize = 200;
/// Maximum accepted incident description length.
pub const BODY_LIMIT: usize = 5_000;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `POST /incidents` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIncidentRequest {
    /// Short title; at most [`TITLE_LIMIT`] characters.
    pub title: String,
    /// Longer description; at most [`BODY_LIMIT`] characters.
    #[serde(default)]
    pub description: String,
    /// Affected service.
    pub service_name: String,
    /// Initial severity.
    #[serde(default)]
    pub severity: IncidentSeverity,
}

/// `PATCH /incidents/{id}/state` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStateRequest {
    /// Requested lifecycle state.
    pub state: IncidentState,
    /// Optional activity comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// `PATCH /incidents/{id}/severity` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSeverityRequest {
    /// Requested severity.
    pub severity: IncidentSeverity,
    /// Optional activity comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// `POST /incidents/{id}/comments` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCommentRequest {
    /// Comment body; at most [`BODY_LIMIT`] characters.
    pub content: String,
}

/// `POST /ai/generate-hypotheses` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateHypothesesRequest {
    /// Target incident.
    pub incident_id: String,
}

/// `POST /ai/generate-hypotheses-batch` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateHypothesesBatchRequest {
    /// Target incidents, at most the batch limit.
    pub incident_ids: Vec<String>,
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Paginated incident listing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentPage {
    /// Incidents on this page, newest detection first.
    pub items: Vec<Incident>,
    /// Total matches across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total page count.
    pub pages: u64,
}
