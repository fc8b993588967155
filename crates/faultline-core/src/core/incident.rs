// faultline-core/src/core/incident.rs
// ============================================================================
// Module: Faultline Incident Model
// Description: Incidents, lifecycle states, activities, hypotheses, and
//              analysis bookkeeping.
// Purpose: Define the ticket-like incident aggregate and its owned children.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An incident is a ticket-like aggregate driven through a fixed lifecycle
//! state machine. It exclusively owns its activities, hypotheses, analysis
//! steps, and AI request records; deleting the incident deletes them all.
//! Every state or severity change writes an [`Activity`] row so the timeline
//! is a total order per incident.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::core::identifiers::ActivityId;
use crate::core::identifiers::AiRequestId;
use crate::core::identifiers::HypothesisId;
use crate::core::identifiers::IncidentId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::StepId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Field Limits
// ============================================================================

/// Maximum stored hypothesis claim length.
pub const CLAIM_LIMIT: usize = 500;
/// Maximum stored hypothesis description length.
pub const DESCRIPTION_LIMIT: usize = 2000;
/// Maximum stored evidence entry length.
pub const EVIDENCE_ITEM_LIMIT: usize = 500;
/// Maximum evidence entries stored per hypothesis.
pub const EVIDENCE_COUNT_LIMIT: usize = 10;

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Incident lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentState {
    /// Automatically detected, not yet picked up.
    Detected,
    /// Analysis workflow running.
    Investigating,
    /// A responder has taken ownership.
    Acknowledged,
    /// Impact contained, not yet fully resolved.
    Mitigated,
    /// Resolved; root cause addressed.
    Resolved,
    /// Closed; terminal.
    Closed,
}

impl IncidentState {
    /// Returns the stable state label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::Investigating => "investigating",
            Self::Acknowledged => "acknowledged",
            Self::Mitigated => "mitigated",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Parses a state label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "detected" => Some(Self::Detected),
            "investigating" => Some(Self::Investigating),
            "acknowledged" => Some(Self::Acknowledged),
            "mitigated" => Some(Self::Mitigated),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Returns the states reachable from this one.
    #[must_use]
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Detected => &[Self::Investigating, Self::Acknowledged],
            Self::Investigating => &[Self::Acknowledged, Self::Mitigated, Self::Resolved],
            Self::Acknowledged => &[Self::Mitigated, Self::Resolved],
            Self::Mitigated => &[Self::Resolved],
            Self::Resolved => &[Self::Closed],
            Self::Closed => &[],
        }
    }

    /// Returns true when the transition to `next` is legal.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }
}

/// Incident severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    /// Full outage or data loss.
    Critical,
    /// Major degradation.
    High,
    /// Partial degradation.
    #[default]
    Medium,
    /// Minor issue.
    Low,
}

impl IncidentSeverity {
    /// Returns the stable severity label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parses a severity label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Incident
// ============================================================================

/// Production incident aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Incident identifier.
    pub id: IncidentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Affected service.
    pub service_name: String,
    /// Lifecycle state.
    pub state: IncidentState,
    /// Severity level.
    pub severity: IncidentSeverity,
    /// Detection timestamp.
    pub detected_at: Timestamp,
    /// When a responder acknowledged, if ever.
    pub acknowledged_at: Option<Timestamp>,
    /// When the incident was resolved, if ever.
    pub resolved_at: Option<Timestamp>,
    /// Row creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Activities
// ============================================================================

/// Kinds of timeline activity entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Incident created.
    Created,
    /// Lifecycle state changed.
    StateChanged,
    /// Severity changed.
    SeverityChanged,
    /// Free-form comment added.
    Comment,
}

impl ActivityKind {
    /// Returns the stable kind label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StateChanged => "state_changed",
            Self::SeverityChanged => "severity_changed",
            Self::Comment => "comment",
        }
    }
}

/// Actor identity attached to activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User identifier, when performed by a user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Display name.
    pub user_name: String,
    /// Email address, when known.
    #[serde(default)]
    pub user_email: String,
}

impl Actor {
    /// Returns the platform actor used for automated transitions.
    #[must_use]
    pub fn system() -> Self {
        Self { user_id: None, user_name: "system".to_string(), user_email: String::new() }
    }
}

/// Timeline entry owned by an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity identifier.
    pub id: ActivityId,
    /// Owning incident.
    pub incident_id: IncidentId,
    /// Entry kind.
    pub kind: ActivityKind,
    /// Human-readable content or comment body.
    pub content: String,
    /// Previous value for change entries.
    #[serde(default)]
    pub old_value: Option<String>,
    /// New value for change entries.
    #[serde(default)]
    pub new_value: Option<String>,
    /// Actor who performed the action.
    pub actor: Actor,
    /// Entry timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Hypotheses
// ============================================================================

/// Root-cause hypothesis owned by an incident.
///
/// # Invariants
/// - `rank` values for one incident form a contiguous run starting at 1.
/// - `confidence_score` is clamped to `[0, 1]` before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Hypothesis identifier.
    pub id: HypothesisId,
    /// Owning incident.
    pub incident_id: IncidentId,
    /// One-sentence claim.
    pub claim: String,
    /// Longer explanation.
    pub description: String,
    /// Model confidence in `[0, 1]`.
    pub confidence_score: f64,
    /// Supporting evidence snippets.
    pub supporting_evidence: Vec<String>,
    /// 1-based rank in descending confidence order.
    pub rank: u32,
    /// Row creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Analysis Steps
// ============================================================================

/// Stages of the per-incident analysis workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Triggering alert received.
    AlertReceived,
    /// Source service identified.
    SourceIdentified,
    /// Platform details fetched.
    PlatformDetails,
    /// Relevant logs retrieved.
    LogsFetched,
    /// Root-cause hypotheses generated.
    HypothesisGenerated,
}

impl StepKind {
    /// Returns the stable step label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlertReceived => "alert_received",
            Self::SourceIdentified => "source_identified",
            Self::PlatformDetails => "platform_details",
            Self::LogsFetched => "logs_fetched",
            Self::HypothesisGenerated => "hypothesis_generated",
        }
    }

    /// Parses a step label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "alert_received" => Some(Self::AlertReceived),
            "source_identified" => Some(Self::SourceIdentified),
            "platform_details" => Some(Self::PlatformDetails),
            "logs_fetched" => Some(Self::LogsFetched),
            "hypothesis_generated" => Some(Self::HypothesisGenerated),
            _ => None,
        }
    }
}

/// Status of an analysis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet started.
    #[default]
    Pending,
    /// Currently running.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Intentionally skipped.
    Skipped,
}

impl StepStatus {
    /// Returns the stable status label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a status label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// One stage of the incident analysis workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStep {
    /// Step identifier.
    pub id: StepId,
    /// Owning incident.
    pub incident_id: IncidentId,
    /// Step kind.
    pub kind: StepKind,
    /// 1-based position in the workflow.
    pub step_number: u32,
    /// Current status.
    pub status: StepStatus,
    /// Input snapshot for the step.
    #[serde(default)]
    pub input: Option<Value>,
    /// Output payload from the step.
    #[serde(default)]
    pub output: Option<Value>,
    /// Input tokens consumed, when AI was used.
    #[serde(default)]
    pub input_tokens: Option<u64>,
    /// Output tokens produced, when AI was used.
    #[serde(default)]
    pub output_tokens: Option<u64>,
    /// Cost in USD, when AI was used.
    #[serde(default)]
    pub cost_usd: Option<f64>,
    /// Step duration in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<i64>,
    /// Error message when the step failed.
    #[serde(default)]
    pub error_message: Option<String>,
    /// When the step started.
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    /// When the step finished.
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

impl AnalysisStep {
    /// Marks the step as in progress at `now`.
    pub fn start(&mut self, now: Timestamp) {
        self.status = StepStatus::InProgress;
        self.started_at = Some(now);
    }

    /// Marks the step as completed at `now`, stamping duration when started.
    pub fn complete(&mut self, now: Timestamp, output: Option<Value>) {
        self.status = StepStatus::Completed;
        self.completed_at = Some(now);
        if let Some(output) = output {
            self.output = Some(output);
        }
        if let Some(started) = self.started_at {
            self.duration_ms = Some(started.millis_until(&now));
        }
    }

    /// Marks the step as failed at `now` with an error message.
    pub fn fail(&mut self, now: Timestamp, error_message: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.completed_at = Some(now);
        self.error_message = Some(error_message.into());
        if let Some(started) = self.started_at {
            self.duration_ms = Some(started.millis_until(&now));
        }
    }
}

/// Seeds the five-step analysis workflow for a freshly created incident.
///
/// Steps 1-3 are completed, step 4 is in progress, and step 5 is pending,
/// mirroring the synchronous part of intake finishing before AI enrichment.
#[must_use]
pub fn seed_workflow(incident: &Incident, now: Timestamp) -> Vec<AnalysisStep> {
    let seeds = [
        (StepKind::AlertReceived, 1, StepStatus::Completed),
        (StepKind::SourceIdentified, 2, StepStatus::Completed),
        (StepKind::PlatformDetails, 3, StepStatus::Completed),
        (StepKind::LogsFetched, 4, StepStatus::InProgress),
        (StepKind::HypothesisGenerated, 5, StepStatus::Pending),
    ];
    let input = json!({
        "title": incident.title,
        "service_name": incident.service_name,
        "severity": incident.severity.as_str(),
    });
    seeds
        .into_iter()
        .map(|(kind, step_number, status)| AnalysisStep {
            id: StepId::generate(),
            incident_id: incident.id.clone(),
            kind,
            step_number,
            status,
            input: Some(input.clone()),
            output: None,
            input_tokens: None,
            output_tokens: None,
            cost_usd: None,
            duration_ms: None,
            error_message: None,
            started_at: (status != StepStatus::Pending).then_some(now),
            completed_at: (status == StepStatus::Completed).then_some(now),
        })
        .collect()
}

// ============================================================================
// SECTION: AI Requests
// ============================================================================

/// Kinds of model calls recorded for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiRequestKind {
    /// Root-cause hypothesis generation.
    Hypothesis,
    /// Batched hypothesis generation.
    HypothesisBatch,
}

impl AiRequestKind {
    /// Returns the stable kind label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hypothesis => "hypothesis",
            Self::HypothesisBatch => "hypothesis_batch",
        }
    }
}

/// Audit record of a single model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    /// Request identifier.
    pub id: AiRequestId,
    /// Incident the call was made for.
    pub incident_id: IncidentId,
    /// Call kind.
    pub kind: AiRequestKind,
    /// Input tokens consumed.
    pub input_tokens: u64,
    /// Output tokens produced.
    pub output_tokens: u64,
    /// Derived cost in USD, six-decimal precision.
    pub cost_usd: f64,
    /// Wall-clock call duration in milliseconds.
    pub duration_ms: i64,
    /// Model identifier used.
    pub model: String,
    /// Truncated prompt summary.
    pub prompt_summary: String,
    /// Truncated response summary.
    pub response_summary: String,
    /// Row creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Truncates a string to a maximum number of characters.
#[must_use]
pub fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}
