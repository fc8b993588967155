// faultline-core/src/core/telemetry.rs
// ============================================================================
// Module: Faultline Telemetry Model
// Description: Telemetry records persisted under tenant/project scope.
// Purpose: Define the append-only record types produced by agents and SDKs.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Telemetry records are append-only rows keyed on `(tenant_id, project_id)`
//! and additionally indexed on `(project, service, timestamp)` by the store.
//! Derived metrics (error rate, latency percentiles, trace aggregates) are
//! computed on read, never persisted alongside the raw rows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Metric sample kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Point-in-time measurement.
    #[default]
    Gauge,
    /// Monotonically increasing count.
    Counter,
    /// Distribution sample.
    Histogram,
}

impl MetricKind {
    /// Returns the stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
            Self::Histogram => "histogram",
        }
    }

    /// Parses a metric kind label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gauge" => Some(Self::Gauge),
            "counter" => Some(Self::Counter),
            "histogram" => Some(Self::Histogram),
            _ => None,
        }
    }
}

/// Single metric data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Emitting service.
    pub service_name: String,
    /// Metric name, e.g. `cpu` or `requests_total`.
    pub metric_name: String,
    /// Sample value.
    pub value: f64,
    /// Sample kind.
    #[serde(default)]
    pub kind: MetricKind,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Value,
    /// Sample timestamp.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Transactions
// ============================================================================

/// HTTP call record used for error-rate and latency derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Emitting service.
    pub service_name: String,
    /// Request path or route template.
    pub endpoint: String,
    /// HTTP method.
    pub method: String,
    /// Response status code.
    pub status_code: u16,
    /// Total duration in milliseconds.
    pub duration_ms: f64,
    /// Time spent in database calls.
    #[serde(default)]
    pub db_duration_ms: f64,
    /// Time spent in outbound calls.
    #[serde(default)]
    pub external_duration_ms: f64,
    /// Whether the call errored.
    #[serde(default)]
    pub error: bool,
    /// Request timestamp.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Traces
// ============================================================================

/// Trace aggregate derived from its spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Trace identifier shared by all member spans.
    pub trace_id: String,
    /// Service of the root span.
    pub root_service: String,
    /// Operation of the root span.
    pub root_operation: String,
    /// Aggregate duration in milliseconds.
    pub duration_ms: f64,
    /// Number of member spans.
    pub span_count: u64,
    /// Whether any member span errored.
    pub has_error: bool,
    /// Earliest member span timestamp.
    pub timestamp: Timestamp,
}

/// Single span within a trace.
///
/// # Invariants
/// - `parent_span_id`, when set, references a span inside the same trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Denormalized trace identifier for fast fan-in.
    pub trace_id: String,
    /// Span identifier.
    pub span_id: String,
    /// Parent span identifier; empty for roots.
    #[serde(default)]
    pub parent_span_id: Option<String>,
    /// Emitting service.
    pub service_name: String,
    /// Operation name.
    pub operation: String,
    /// Span duration in milliseconds.
    pub duration_ms: f64,
    /// Span status label (`ok` or `error`).
    #[serde(default = "default_span_status")]
    pub status: String,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Value,
    /// Span start timestamp.
    pub timestamp: Timestamp,
}

/// Default span status label.
fn default_span_status() -> String {
    "ok".to_string()
}

impl Span {
    /// Returns true when the span reports an error status.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }

    /// Returns true when the span is a trace root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.as_deref().is_none_or(str::is_empty)
    }
}

impl Trace {
    /// Derives a trace aggregate from member spans.
    ///
    /// The root is the first span without a parent, falling back to the
    /// earliest span. Aggregate duration is the root duration when present,
    /// otherwise the maximum span duration. Returns `None` for an empty span
    /// set.
    #[must_use]
    pub fn from_spans(spans: &[Span]) -> Option<Self> {
        let first = spans.first()?;
        let root = spans
            .iter()
            .find(|span| span.is_root())
            .or_else(|| spans.iter().min_by_key(|span| span.timestamp))?;
        let duration_ms = if root.is_root() {
            root.duration_ms
        } else {
            spans.iter().map(|span| span.duration_ms).fold(0.0_f64, f64::max)
        };
        let earliest = spans.iter().map(|span| span.timestamp).min()?;
        Some(Self {
            tenant_id: first.tenant_id.clone(),
            project_id: first.project_id.clone(),
            trace_id: first.trace_id.clone(),
            root_service: root.service_name.clone(),
            root_operation: root.operation.clone(),
            duration_ms,
            span_count: spans.len() as u64,
            has_error: spans.iter().any(Span::is_error),
            timestamp: earliest,
        })
    }
}

// ============================================================================
// SECTION: Logs
// ============================================================================

/// Structured log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Log level label (`DEBUG` through `FATAL`).
    pub level: String,
    /// Emitting service.
    pub service_name: String,
    /// Log message.
    pub message: String,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Value,
    /// Correlated trace identifier, when present.
    #[serde(default)]
    pub trace_id: Option<String>,
    /// Correlated span identifier, when present.
    #[serde(default)]
    pub span_id: Option<String>,
    /// Record timestamp.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Infrastructure
// ============================================================================

/// Host infrastructure sample reported by installed agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSample {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Reporting host.
    pub hostname: String,
    /// CPU utilization percentage.
    pub cpu_percent: f64,
    /// Memory utilization percentage.
    pub memory_percent: f64,
    /// Per-mount disk usage payload.
    #[serde(default)]
    pub disk_usage: Value,
    /// Network IO counters payload.
    #[serde(default)]
    pub network_io: Value,
    /// Load averages.
    #[serde(default)]
    pub load_avg: Value,
    /// Sample timestamp.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Browser RUM
// ============================================================================

/// Browser real-user-monitoring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserEvent {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Page URL.
    pub page_url: String,
    /// Event kind label, e.g. `page_view` or `web_vital`.
    pub event_kind: String,
    /// Page load time in milliseconds, when applicable.
    #[serde(default)]
    pub load_time_ms: Option<f64>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Free-form attributes (vitals, session data).
    #[serde(default)]
    pub attributes: Value,
    /// Event timestamp.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Vulnerabilities
// ============================================================================

/// Dependency vulnerability finding from an agent scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// CVE identifier.
    pub cve_id: String,
    /// Finding title.
    pub title: String,
    /// Finding description.
    #[serde(default)]
    pub description: String,
    /// Severity label.
    pub severity: String,
    /// Affected service.
    pub service_name: String,
    /// Affected package.
    pub package_name: String,
    /// Installed package version.
    pub installed_version: String,
    /// First fixed version, when known.
    #[serde(default)]
    pub fixed_version: Option<String>,
    /// Scan timestamp.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Deployments
// ============================================================================

/// Deployment record created by CI/CD webhooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Deployed service or repository.
    pub service: String,
    /// Deployed version or ref.
    pub version: String,
    /// Target environment.
    pub environment: String,
    /// Commit SHA, when known.
    #[serde(default)]
    pub commit_sha: Option<String>,
    /// Human description.
    #[serde(default)]
    pub description: String,
    /// Actor who deployed.
    #[serde(default)]
    pub deployed_by: String,
    /// Outcome label (`success`, `failed`, `in_progress`).
    pub status: String,
    /// Originating integration (`github`, `azure_devops`, `webhook`).
    pub source: String,
    /// Completion timestamp.
    pub completed_at: Timestamp,
}

// ============================================================================
// SECTION: Service Registry
// ============================================================================

/// Service discovered from ingest heartbeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Service name.
    pub service_name: String,
    /// Ingest domain that last reported the service.
    pub source: String,
    /// Service kind label, e.g. `backend` or `browser`.
    pub kind: String,
    /// Last heartbeat timestamp.
    pub last_seen: Timestamp,
}
