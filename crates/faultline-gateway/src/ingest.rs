// faultline-gateway/src/ingest.rs
// ============================================================================
// Module: Ingest Handlers
// Description: API-key-authenticated batch persistence per telemetry domain.
// Purpose: Validate, inject project context, and persist agent batches.
// Dependencies: axum, faultline-contract, faultline-core
// ============================================================================

//! ## Overview
//! Each domain handler validates the presented API key (including its scope
//! for the domain), injects `(tenant_id, project_id)` from the key into every
//! record, persists the batch, and answers `{ingested: N}`. Side effects that
//! must not fail the request, such as `last_used_at` updates and service-registry
//! heartbeats, are best-effort. With an invalid key nothing is persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use faultline_contract::BrowserBatch;
use faultline_contract::ErrorsBatch;
use faultline_contract::InfrastructureBatch;
use faultline_contract::IngestReceipt;
use faultline_contract::LogsBatch;
use faultline_contract::MetricsBatch;
use faultline_contract::TracesBatch;
use faultline_contract::TransactionsBatch;
use faultline_contract::VulnerabilitiesBatch;
use faultline_core::BrowserEvent;
use faultline_core::HostSample;
use faultline_core::IngestDomain;
use faultline_core::LogEntry;
use faultline_core::MetricPoint;
use faultline_core::ServiceRegistration;
use faultline_core::Span;
use faultline_core::Timestamp;
use faultline_core::Trace;
use faultline_core::Transaction;
use faultline_core::Vulnerability;

use crate::apikey::ApiKeyError;
use crate::extract::Body;
use crate::apikey::IngestContext;
use crate::audit::AuthAuditEvent;
use crate::error::ApiError;
use crate::state::GatewayState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the ingest API key.
pub const API_KEY_HEADER: &str = "x-api-key";

// ============================================================================
// SECTION: Shared Plumbing
// ============================================================================

impl From<ApiKeyError> for ApiError {
    fn from(error: ApiKeyError) -> Self {
        match error {
            ApiKeyError::Missing => Self::unauthorized("X-API-Key header is required"),
            ApiKeyError::Invalid => Self::unauthorized("Invalid or inactive API key"),
            ApiKeyError::Forbidden(domain) => {
                Self::forbidden(format!("API key not authorized for ingest domain {domain}"))
            }
            ApiKeyError::Unavailable => {
                Self::service_unavailable("Authentication service unavailable")
            }
        }
    }
}

/// Validates the key header for a domain and audits the decision.
fn authenticate(
    state: &GatewayState,
    headers: &HeaderMap,
    domain: IngestDomain,
) -> Result<IngestContext, ApiError> {
    let presented = headers.get(API_KEY_HEADER).and_then(|value| value.to_str().ok());
    match state.api_keys.validate(presented, domain) {
        Ok(context) => {
            state.audit.record(&AuthAuditEvent::allowed(
                "ingest",
                domain.as_str(),
                Some(context.project_id.to_string()),
            ));
            Ok(context)
        }
        Err(err) => {
            state
                .audit
                .record(&AuthAuditEvent::denied("ingest", domain.as_str(), err.to_string()));
            Err(err.into())
        }
    }
}

/// Best-effort post-persist side effects: key touch and service heartbeats.
fn after_persist(
    state: &GatewayState,
    context: &IngestContext,
    domain: IngestDomain,
    services: &BTreeSet<String>,
    kind: &str,
) {
    state.api_keys.touch(context);
    let now = Timestamp::now();
    for service_name in services {
        let registration = ServiceRegistration {
            tenant_id: context.tenant_id.clone(),
            project_id: context.project_id.clone(),
            service_name: service_name.clone(),
            source: domain.as_str().to_string(),
            kind: kind.to_string(),
            last_seen: now,
        };
        let _ = state.telemetry.upsert_service(&registration);
    }
}

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// `POST /ingest/metrics`.
pub async fn ingest_metrics(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Body(batch): Body<MetricsBatch>,
) -> Result<Json<IngestReceipt>, ApiError> {
    let context = authenticate(&state, &headers, IngestDomain::Metrics)?;
    let now = Timestamp::now();
    let mut services = BTreeSet::new();
    let points: Vec<MetricPoint> = batch
        .metrics
        .into_iter()
        .map(|item| {
            services.insert(item.service_name.clone());
            MetricPoint {
                tenant_id: context.tenant_id.clone(),
                project_id: context.project_id.clone(),
                service_name: item.service_name,
                metric_name: item.metric_name,
                value: item.value,
                kind: item.kind,
                tags: item.tags,
                timestamp: item.timestamp.unwrap_or(now),
            }
        })
        .collect();
    state.telemetry.insert_metric_points(&points)?;
    after_persist(&state, &context, IngestDomain::Metrics, &services, "backend");
    Ok(Json(IngestReceipt { ingested: points.len() }))
}

// ============================================================================
// SECTION: Traces
// ============================================================================

/// `POST /ingest/traces`.
pub async fn ingest_traces(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Body(batch): Body<TracesBatch>,
) -> Result<Json<IngestReceipt>, ApiError> {
    let context = authenticate(&state, &headers, IngestDomain::Traces)?;
    let now = Timestamp::now();
    let mut services = BTreeSet::new();
    let mut by_trace: BTreeMap<String, Vec<Span>> = BTreeMap::new();
    let mut ingested = 0;
    for item in batch.spans {
        services.insert(item.service_name.clone());
        let span = Span {
            tenant_id: context.tenant_id.clone(),
            project_id: context.project_id.clone(),
            trace_id: item.trace_id.clone(),
            span_id: item.span_id,
            parent_span_id: item.parent_span_id,
            service_name: item.service_name,
            operation: item.operation,
            duration_ms: item.duration_ms,
            status: item.status.unwrap_or_else(|| "ok".to_string()),
            attributes: item.attributes,
            timestamp: item.timestamp.unwrap_or(now),
        };
        ingested += 1;
        by_trace.entry(item.trace_id).or_default().push(span);
    }
    for spans in by_trace.values() {
        if let Some(trace) = Trace::from_spans(spans) {
            state.telemetry.insert_trace(&trace, spans)?;
        }
    }
    after_persist(&state, &context, IngestDomain::Traces, &services, "backend");
    Ok(Json(IngestReceipt { ingested }))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `POST /ingest/errors`.
pub async fn ingest_errors(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Body(batch): Body<ErrorsBatch>,
) -> Result<Json<IngestReceipt>, ApiError> {
    let context = authenticate(&state, &headers, IngestDomain::Errors)?;
    let now = Timestamp::now();
    let mut services = BTreeSet::new();
    for event in &batch.errors {
        services.insert(event.service_name.clone());
        state.telemetry.record_error_event(
            &context.tenant_id,
            &context.project_id,
            event,
            now,
        )?;
    }
    after_persist(&state, &context, IngestDomain::Errors, &services, "backend");
    Ok(Json(IngestReceipt { ingested: batch.errors.len() }))
}

// ============================================================================
// SECTION: Logs
// ============================================================================

/// `POST /ingest/logs`.
pub async fn ingest_logs(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Body(batch): Body<LogsBatch>,
) -> Result<Json<IngestReceipt>, ApiError> {
    let context = authenticate(&state, &headers, IngestDomain::Logs)?;
    let now = Timestamp::now();
    let mut services = BTreeSet::new();
    let entries: Vec<LogEntry> = batch
        .logs
        .into_iter()
        .map(|item| {
            services.insert(item.service_name.clone());
            LogEntry {
                tenant_id: context.tenant_id.clone(),
                project_id: context.project_id.clone(),
                level: item.level,
                service_name: item.service_name,
                message: item.message,
                attributes: item.attributes,
                trace_id: item.trace_id,
                span_id: item.span_id,
                timestamp: item.timestamp.unwrap_or(now),
            }
        })
        .collect();
    state.telemetry.insert_logs(&entries)?;
    after_persist(&state, &context, IngestDomain::Logs, &services, "backend");
    Ok(Json(IngestReceipt { ingested: entries.len() }))
}

// ============================================================================
// SECTION: Infrastructure
// ============================================================================

/// `POST /ingest/infrastructure`.
pub async fn ingest_infrastructure(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Body(batch): Body<InfrastructureBatch>,
) -> Result<Json<IngestReceipt>, ApiError> {
    let context = authenticate(&state, &headers, IngestDomain::Infrastructure)?;
    let now = Timestamp::now();
    let samples: Vec<HostSample> = batch
        .samples
        .into_iter()
        .map(|item| HostSample {
            tenant_id: context.tenant_id.clone(),
            project_id: context.project_id.clone(),
            hostname: item.hostname,
            cpu_percent: item.cpu_percent,
            memory_percent: item.memory_percent,
            disk_usage: item.disk_usage,
            network_io: item.network_io,
            load_avg: item.load_avg,
            timestamp: item.timestamp.unwrap_or(now),
        })
        .collect();
    state.telemetry.insert_host_samples(&samples)?;
    state.api_keys.touch(&context);
    Ok(Json(IngestReceipt { ingested: samples.len() }))
}

// ============================================================================
// SECTION: Browser
// ============================================================================

/// `POST /ingest/browser`.
pub async fn ingest_browser(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Body(batch): Body<BrowserBatch>,
) -> Result<Json<IngestReceipt>, ApiError> {
    let context = authenticate(&state, &headers, IngestDomain::Browser)?;
    let now = Timestamp::now();
    let events: Vec<BrowserEvent> = batch
        .events
        .into_iter()
        .map(|item| BrowserEvent {
            tenant_id: context.tenant_id.clone(),
            project_id: context.project_id.clone(),
            page_url: item.page_url,
            event_kind: item.event_kind,
            load_time_ms: item.load_time_ms,
            user_agent: item.user_agent,
            attributes: item.attributes,
            timestamp: item.timestamp.unwrap_or(now),
        })
        .collect();
    state.telemetry.insert_browser_events(&events)?;
    state.api_keys.touch(&context);
    Ok(Json(IngestReceipt { ingested: events.len() }))
}

// ============================================================================
// SECTION: Vulnerabilities
// ============================================================================

/// `POST /ingest/vulnerabilities`.
pub async fn ingest_vulnerabilities(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Body(batch): Body<VulnerabilitiesBatch>,
) -> Result<Json<IngestReceipt>, ApiError> {
    let context = authenticate(&state, &headers, IngestDomain::Vulnerabilities)?;
    let now = Timestamp::now();
    let mut services = BTreeSet::new();
    let findings: Vec<Vulnerability> = batch
        .vulnerabilities
        .into_iter()
        .map(|item| {
            services.insert(item.service_name.clone());
            Vulnerability {
                tenant_id: context.tenant_id.clone(),
                project_id: context.project_id.clone(),
                cve_id: item.cve_id,
                title: item.title,
                description: item.description,
                severity: item.severity,
                service_name: item.service_name,
                package_name: item.package_name,
                installed_version: item.installed_version,
                fixed_version: item.fixed_version,
                timestamp: item.timestamp.unwrap_or(now),
            }
        })
        .collect();
    state.telemetry.insert_vulnerabilities(&findings)?;
    after_persist(&state, &context, IngestDomain::Vulnerabilities, &services, "backend");
    Ok(Json(IngestReceipt { ingested: findings.len() }))
}

// ============================================================================
// SECTION: Transactions (metrics domain)
// ============================================================================

/// `POST /ingest/transactions` (metrics scope).
pub async fn ingest_transactions(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Body(batch): Body<TransactionsBatch>,
) -> Result<Json<IngestReceipt>, ApiError> {
    let context = authenticate(&state, &headers, IngestDomain::Metrics)?;
    let now = Timestamp::now();
    let mut services = BTreeSet::new();
    let transactions: Vec<Transaction> = batch
        .transactions
        .into_iter()
        .map(|item| {
            services.insert(item.service_name.clone());
            Transaction {
                tenant_id: context.tenant_id.clone(),
                project_id: context.project_id.clone(),
                service_name: item.service_name,
                endpoint: item.endpoint,
                method: item.method,
                status_code: item.status_code,
                duration_ms: item.duration_ms,
                db_duration_ms: item.db_duration_ms,
                external_duration_ms: item.external_duration_ms,
                error: item.error,
                timestamp: item.timestamp.unwrap_or(now),
            }
        })
        .collect();
    state.telemetry.insert_transactions(&transactions)?;
    after_persist(&state, &context, IngestDomain::Metrics, &services, "backend");
    Ok(Json(IngestReceipt { ingested: transactions.len() }))
}
