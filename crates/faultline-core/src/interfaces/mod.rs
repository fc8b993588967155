// faultline-core/src/interfaces/mod.rs
// ============================================================================
// Module: Faultline Interfaces
// Description: Backend-agnostic seams for storage, cache, bus, notification,
//              and model access.
// Purpose: Define the contract surfaces used by the Faultline runtime.
// Dependencies: crate::core, async-trait
// ============================================================================

//! ## Overview
//! Interfaces define how the runtime integrates with external systems without
//! embedding backend-specific details. Store implementations must enforce
//! tenant/project isolation on every read; cache implementations must honor
//! `SET NX EX` semantics for the single-flight key; bus implementations must
//! preserve publish order per channel per producer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::alerting::ActiveAlert;
use crate::core::alerting::AlertCondition;
use crate::core::alerting::AlertPolicy;
use crate::core::alerting::MutingRule;
use crate::core::alerting::NotificationChannel;
use crate::core::errorgroup::ErrorEvent;
use crate::core::errorgroup::ErrorGroup;
use crate::core::event::Channel;
use crate::core::event::EventMessage;
use crate::core::identifiers::AlertId;
use crate::core::identifiers::ApiKeyId;
use crate::core::identifiers::ChannelId;
use crate::core::identifiers::ConditionId;
use crate::core::identifiers::IncidentId;
use crate::core::identifiers::PolicyId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::ConnectionId;
use crate::core::identity::ApiKey;
use crate::core::identity::Project;
use crate::core::identity::Tenant;
use crate::core::identity::WebhookConnection;
use crate::core::incident::Activity;
use crate::core::incident::AiRequest;
use crate::core::incident::AnalysisStep;
use crate::core::incident::Hypothesis;
use crate::core::incident::Incident;
use crate::core::incident::IncidentSeverity;
use crate::core::incident::IncidentState;
use crate::core::incident::StepKind;
use crate::core::telemetry::BrowserEvent;
use crate::core::telemetry::Deployment;
use crate::core::telemetry::HostSample;
use crate::core::telemetry::LogEntry;
use crate::core::telemetry::MetricPoint;
use crate::core::telemetry::ServiceRegistration;
use crate::core::telemetry::Span;
use crate::core::telemetry::Trace;
use crate::core::telemetry::Transaction;
use crate::core::telemetry::Vulnerability;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Store errors shared by all repository interfaces.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("store io error: {0}")]
    Io(String),
    /// Row or payload is invalid.
    #[error("store invalid data: {0}")]
    Invalid(String),
    /// Uniqueness or constraint violation.
    #[error("store conflict: {0}")]
    Conflict(String),
    /// Referenced row does not exist.
    #[error("store missing row: {0}")]
    NotFound(String),
    /// Backend-specific failure.
    #[error("store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Identity Store
// ============================================================================

/// Repository for tenants, projects, and API keys.
pub trait IdentityStore: Send + Sync {
    /// Inserts a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_tenant(&self, tenant: &Tenant) -> Result<(), StoreError>;

    /// Inserts a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when `(tenant_id, slug)` is taken.
    fn insert_project(&self, project: &Project) -> Result<(), StoreError>;

    /// Loads a project by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn get_project(&self, project_id: &ProjectId) -> Result<Option<Project>, StoreError>;

    /// Inserts an API key record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the key hash already exists.
    fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError>;

    /// Looks up an API key by its stored digest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError>;

    /// Updates a key's `last_used_at` stamp. Best-effort at call sites.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn touch_api_key(&self, key_id: &ApiKeyId, used_at: Timestamp) -> Result<(), StoreError>;

    /// Activates or deactivates a key. Callers must invalidate caches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn set_api_key_active(&self, key_id: &ApiKeyId, is_active: bool) -> Result<(), StoreError>;

    /// Inserts a CI/CD webhook connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_webhook_connection(&self, connection: &WebhookConnection)
    -> Result<(), StoreError>;

    /// Loads a webhook connection by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn get_webhook_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<WebhookConnection>, StoreError>;
}

// ============================================================================
// SECTION: Telemetry Store
// ============================================================================

/// Host sample fields supported by windowed aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostField {
    /// CPU utilization percentage.
    CpuPercent,
    /// Memory utilization percentage.
    MemoryPercent,
}

/// Latency percentiles derived from transaction durations on read.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LatencyPercentiles {
    /// Median duration in milliseconds.
    pub p50: f64,
    /// 95th percentile duration in milliseconds.
    pub p95: f64,
    /// 99th percentile duration in milliseconds.
    pub p99: f64,
}

/// Repository for append-only telemetry rows and windowed aggregates.
pub trait TelemetryStore: Send + Sync {
    /// Appends metric points.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_metric_points(&self, points: &[MetricPoint]) -> Result<(), StoreError>;

    /// Appends transactions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError>;

    /// Upserts a trace aggregate and appends its spans.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_trace(&self, trace: &Trace, spans: &[Span]) -> Result<(), StoreError>;

    /// Appends log entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_logs(&self, entries: &[LogEntry]) -> Result<(), StoreError>;

    /// Appends host samples.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_host_samples(&self, samples: &[HostSample]) -> Result<(), StoreError>;

    /// Appends browser RUM events.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_browser_events(&self, events: &[BrowserEvent]) -> Result<(), StoreError>;

    /// Appends vulnerability findings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_vulnerabilities(&self, findings: &[Vulnerability]) -> Result<(), StoreError>;

    /// Records an error event: upserts the fingerprint group, appends the
    /// occurrence, and prunes occurrences beyond the retention cap.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn record_error_event(
        &self,
        tenant_id: &TenantId,
        project_id: &ProjectId,
        event: &ErrorEvent,
        now: Timestamp,
    ) -> Result<ErrorGroup, StoreError>;

    /// Upserts a service registration heartbeat.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert_service(&self, registration: &ServiceRegistration) -> Result<(), StoreError>;

    /// Appends a deployment record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_deployment(&self, deployment: &Deployment) -> Result<(), StoreError>;

    /// Lists metric points for a project, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_metric_points(
        &self,
        project_id: &ProjectId,
        metric_name: Option<&str>,
        service_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MetricPoint>, StoreError>;

    /// Returns the mean of a raw metric over `[since, now]`, when sampled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn metric_window_avg(
        &self,
        project_id: &ProjectId,
        metric_name: &str,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError>;

    /// Returns `100 × errored / total` transactions over the window, or
    /// `None` when no transactions exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn transaction_error_rate(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError>;

    /// Returns the mean transaction duration over the window, when sampled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn transaction_avg_duration(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError>;

    /// Returns latency percentiles over the window, when sampled. Derived on
    /// read; never persisted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn transaction_percentiles(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<LatencyPercentiles>, StoreError>;

    /// Returns the mean of a host field over the window, when sampled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn host_window_avg(
        &self,
        project_id: &ProjectId,
        field: HostField,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError>;
}

// ============================================================================
// SECTION: Alert Store
// ============================================================================

/// Repository for alerting configuration and live alert state.
pub trait AlertStore: Send + Sync {
    /// Inserts an alert condition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_condition(&self, condition: &AlertCondition) -> Result<(), StoreError>;

    /// Loads a condition by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn get_condition(&self, condition_id: &ConditionId)
    -> Result<Option<AlertCondition>, StoreError>;

    /// Lists every enabled condition across all projects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_enabled_conditions(&self) -> Result<Vec<AlertCondition>, StoreError>;

    /// Inserts an alert policy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_policy(&self, policy: &AlertPolicy) -> Result<(), StoreError>;

    /// Inserts a notification channel.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_channel(&self, channel: &NotificationChannel) -> Result<(), StoreError>;

    /// Binds a channel to a policy (many-to-many).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the bind fails.
    fn bind_channel(&self, channel_id: &ChannelId, policy_id: &PolicyId)
    -> Result<(), StoreError>;

    /// Lists enabled channels bound to the policy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn channels_for_policy(
        &self,
        policy_id: &PolicyId,
    ) -> Result<Vec<NotificationChannel>, StoreError>;

    /// Inserts a muting rule.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_muting_rule(&self, rule: &MutingRule) -> Result<(), StoreError>;

    /// Lists active muting rules for a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn active_muting_rules(&self, project_id: &ProjectId) -> Result<Vec<MutingRule>, StoreError>;

    /// Returns the firing alert for a condition, when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn firing_alert(&self, condition_id: &ConditionId)
    -> Result<Option<ActiveAlert>, StoreError>;

    /// Inserts an active alert.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a firing alert already exists
    /// for the condition.
    fn insert_alert(&self, alert: &ActiveAlert) -> Result<(), StoreError>;

    /// Marks an alert resolved, stamping `resolved_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn resolve_alert(&self, alert_id: &AlertId, resolved_at: Timestamp)
    -> Result<(), StoreError>;

    /// Lists alerts for a project, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_alerts(&self, project_id: &ProjectId) -> Result<Vec<ActiveAlert>, StoreError>;
}

// ============================================================================
// SECTION: Incident Store
// ============================================================================

/// Listing filters for incidents.
#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    /// Restrict to a severity.
    pub severity: Option<IncidentSeverity>,
    /// Restrict to a state.
    pub state: Option<IncidentState>,
    /// Case-insensitive substring over title/description/service.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl IncidentFilter {
    /// Returns a filter for the first page with the given size.
    #[must_use]
    pub fn first_page(limit: u32) -> Self {
        Self { page: 1, limit, ..Self::default() }
    }
}

/// Per-project incident counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct IncidentStats {
    /// Total incidents.
    pub total: u64,
    /// Counts keyed by severity label.
    pub by_severity: std::collections::BTreeMap<String, u64>,
    /// Counts keyed by state label.
    pub by_state: std::collections::BTreeMap<String, u64>,
}

/// Repository for incidents and their owned children.
pub trait IncidentStore: Send + Sync {
    /// Inserts an incident.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_incident(&self, incident: &Incident) -> Result<(), StoreError>;

    /// Loads an incident scoped to a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn get_incident(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
    ) -> Result<Option<Incident>, StoreError>;

    /// Lists incidents for a project with filters and pagination. Returns the
    /// page plus the total match count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_incidents(
        &self,
        project_id: &ProjectId,
        filter: &IncidentFilter,
    ) -> Result<(Vec<Incident>, u64), StoreError>;

    /// Updates an incident's lifecycle state and timing stamps.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn set_incident_state(
        &self,
        incident_id: &IncidentId,
        state: IncidentState,
        acknowledged_at: Option<Timestamp>,
        resolved_at: Option<Timestamp>,
    ) -> Result<(), StoreError>;

    /// Updates an incident's severity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn set_incident_severity(
        &self,
        incident_id: &IncidentId,
        severity: IncidentSeverity,
    ) -> Result<(), StoreError>;

    /// Deletes an incident and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_incident(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
    ) -> Result<(), StoreError>;

    /// Appends a timeline activity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_activity(&self, activity: &Activity) -> Result<(), StoreError>;

    /// Lists an incident's activities in timeline order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn list_activities(&self, incident_id: &IncidentId) -> Result<Vec<Activity>, StoreError>;

    /// Inserts analysis steps.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_steps(&self, steps: &[AnalysisStep]) -> Result<(), StoreError>;

    /// Persists an updated analysis step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn update_step(&self, step: &AnalysisStep) -> Result<(), StoreError>;

    /// Lists an incident's steps in workflow order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn steps_for_incident(&self, incident_id: &IncidentId)
    -> Result<Vec<AnalysisStep>, StoreError>;

    /// Loads a step by workflow kind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn step_by_kind(
        &self,
        incident_id: &IncidentId,
        kind: StepKind,
    ) -> Result<Option<AnalysisStep>, StoreError>;

    /// Inserts a hypothesis.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_hypothesis(&self, hypothesis: &Hypothesis) -> Result<(), StoreError>;

    /// Lists an incident's hypotheses in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn hypotheses_for_incident(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Vec<Hypothesis>, StoreError>;

    /// Inserts an AI request audit row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_ai_request(&self, request: &AiRequest) -> Result<(), StoreError>;

    /// Returns per-project incident counters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn incident_stats(&self, project_id: &ProjectId) -> Result<IncidentStats, StoreError>;
}

// ============================================================================
// SECTION: Event Bus
// ============================================================================

/// Event bus errors.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus or channel is no longer accepting messages.
    #[error("bus closed: {0}")]
    Closed(String),
}

/// Publish seam for domain events.
///
/// Publish failures are non-critical side effects: callers log and swallow
/// them, never failing the primary operation.
pub trait EventBus: Send + Sync {
    /// Publishes a message on a channel.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the channel cannot accept the message.
    fn publish(&self, channel: Channel, message: &EventMessage) -> Result<(), BusError>;
}

// ============================================================================
// SECTION: KV Cache
// ============================================================================

/// Process-wide key-value cache with per-entry TTL.
///
/// Cache failures are silently bypassed by design: the interface is
/// infallible and implementations degrade to misses.
pub trait KvCache: Send + Sync {
    /// Returns the live value for a key, when present and unexpired.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores a value with a TTL, replacing any existing entry atomically.
    fn put_ttl(&self, key: &str, value: &str, ttl: Duration);

    /// Stores a value only when the key is absent (`SET NX EX`). Returns true
    /// when this call created the entry.
    fn put_if_absent_ttl(&self, key: &str, value: &str, ttl: Duration) -> bool;

    /// Removes a key.
    fn remove(&self, key: &str);
}

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Notification fan-out seam invoked when an alert fires.
///
/// Implementations resolve the condition's policy channels, evaluate muting,
/// and deliver per-channel isolated; delivery failures are logged internally
/// and never surfaced to the evaluator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers notifications for a fired alert.
    async fn notify(&self, condition: &AlertCondition, alert: &ActiveAlert);
}

/// Notifier that drops every notification. Used in tests and when no
/// channels are configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _condition: &AlertCondition, _alert: &ActiveAlert) {}
}

// ============================================================================
// SECTION: Model Client
// ============================================================================

/// Model invocation errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Provider unreachable (connect failure).
    #[error("model provider unreachable: {0}")]
    Unreachable(String),
    /// Provider timed out.
    #[error("model provider timeout: {0}")]
    Timeout(String),
    /// Provider returned an unusable response.
    #[error("model response invalid: {0}")]
    InvalidResponse(String),
}

/// Single completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// System prompt.
    pub system: String,
    /// User prompt.
    pub prompt: String,
    /// Completion token ceiling.
    pub max_completion_tokens: u32,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelUsage {
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Completion tokens produced.
    pub output_tokens: u64,
}

/// Completion response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    /// Raw response content.
    pub content: String,
    /// Token usage.
    pub usage: ModelUsage,
    /// Model identifier that served the call.
    pub model: String,
}

/// Chat-completion seam for AI enrichment.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns true when this client is the deterministic mock; mock calls
    /// accrue no cost and no AI request audit rows.
    fn is_mock(&self) -> bool;

    /// Performs one completion call.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when the provider fails.
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;
}

// ============================================================================
// SECTION: Enrichment Trigger
// ============================================================================

/// Fire-and-forget seam used by the orchestrator to start AI enrichment.
///
/// Implementations spawn detached work; failure to trigger must never fail
/// incident creation.
pub trait EnrichmentTrigger: Send + Sync {
    /// Requests hypothesis generation for an incident.
    fn trigger(&self, incident: &Incident);
}

/// Trigger that does nothing. Used in tests and offline tooling.
pub struct NoopTrigger;

impl EnrichmentTrigger for NoopTrigger {
    fn trigger(&self, _incident: &Incident) {}
}
