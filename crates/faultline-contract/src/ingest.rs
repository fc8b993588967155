// faultline-contract/src/ingest.rs
// ============================================================================
// Module: Ingest Wire Contract
// Description: Agent-facing batch payloads for the seven ingest domains.
// Purpose: Define what agents send before project context is injected.
// Dependencies: faultline-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Ingest bodies are JSON batches submitted with an `X-API-Key` header. Items
//! deliberately omit `tenant_id`/`project_id`: the ingest plane injects both
//! from the validated key before persistence, so a client can never write
//! outside its own project. Missing timestamps are stamped at receipt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::ErrorEvent;
use faultline_core::MetricKind;
use faultline_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Receipt
// ============================================================================

/// Response for every accepted ingest batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    /// Number of records persisted.
    pub ingested: usize,
}

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Metric item as submitted by agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricIn {
    /// Emitting service.
    pub service_name: String,
    /// Metric name.
    pub metric_name: String,
    /// Sample value.
    pub value: f64,
    /// Sample kind.
    #[serde(default)]
    pub kind: MetricKind,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Value,
    /// Sample timestamp; stamped at receipt when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Metrics batch body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBatch {
    /// Batch items.
    pub metrics: Vec<MetricIn>,
}

// ============================================================================
// SECTION: Traces
// ============================================================================

/// Span item as submitted by agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanIn {
    /// Trace the span belongs to.
    pub trace_id: String,
    /// Span identifier.
    pub span_id: String,
    /// Parent span inside the same trace; absent for roots.
    #[serde(default)]
    pub parent_span_id: Option<String>,
    /// Emitting service.
    pub service_name: String,
    /// Operation name.
    pub operation: String,
    /// Span duration in milliseconds.
    pub duration_ms: f64,
    /// Span status label (`ok` or `error`).
    #[serde(default)]
    pub status: Option<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Value,
    /// Span start timestamp; stamped at receipt when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Traces batch body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracesBatch {
    /// Batch spans; the collector groups them by `trace_id`.
    pub spans: Vec<SpanIn>,
}

// ============================================================================
// SECTION: Transactions
// ============================================================================

/// Transaction item as submitted by APM agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionIn {
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
    /// Request timestamp; stamped at receipt when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Transactions batch body; carried by the metrics scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionsBatch {
    /// Batch items.
    pub transactions: Vec<TransactionIn>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors batch body; items reuse the core error event shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorsBatch {
    /// Batch items.
    pub errors: Vec<ErrorEvent>,
}

// ============================================================================
// SECTION: Logs
// ============================================================================

/// Log item as submitted by agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogIn {
    /// Log level label.
    pub level: String,
    /// Emitting service.
    pub service_name: String,
    /// Log message.
    pub message: String,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Value,
    /// Correlated trace identifier.
    #[serde(default)]
    pub trace_id: Option<String>,
    /// Correlated span identifier.
    #[serde(default)]
    pub span_id: Option<String>,
    /// Record timestamp; stamped at receipt when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Logs batch body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogsBatch {
    /// Batch items.
    pub logs: Vec<LogIn>,
}

// ============================================================================
// SECTION: Infrastructure
// ============================================================================

/// Host sample as submitted by infrastructure agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSampleIn {
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
    /// Sample timestamp; stamped at receipt when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Infrastructure batch body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureBatch {
    /// Batch items.
    pub samples: Vec<HostSampleIn>,
}

// ============================================================================
// SECTION: Browser
// ============================================================================

/// Browser RUM event as submitted by the browser SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserEventIn {
    /// Page URL.
    pub page_url: String,
    /// Event kind label.
    pub event_kind: String,
    /// Page load time in milliseconds.
    #[serde(default)]
    pub load_time_ms: Option<f64>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Value,
    /// Event timestamp; stamped at receipt when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Browser batch body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserBatch {
    /// Batch items.
    pub events: Vec<BrowserEventIn>,
}

// ============================================================================
// SECTION: Vulnerabilities
// ============================================================================

/// Vulnerability finding as submitted by scanner agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityIn {
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
    /// Scan timestamp; stamped at receipt when absent.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// Vulnerabilities batch body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilitiesBatch {
    /// Batch items.
    pub vulnerabilities: Vec<VulnerabilityIn>,
}
