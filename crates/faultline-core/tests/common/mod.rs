// faultline-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Fixtures
// Description: In-memory seam implementations shared by runtime tests.
// Purpose: Exercise the engines without a database or network.
// Dependencies: faultline-core
// ============================================================================

//! In-memory fakes for the store, bus, cache, notifier, and model seams.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    dead_code,
    reason = "Test-only fixtures; not every test uses every helper."
)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use faultline_core::ActiveAlert;
use faultline_core::Activity;
use faultline_core::AiRequest;
use faultline_core::AlertCondition;
use faultline_core::AlertId;
use faultline_core::AlertPolicy;
use faultline_core::AlertStatus;
use faultline_core::AlertStore;
use faultline_core::AnalysisStep;
use faultline_core::BrowserEvent;
use faultline_core::BusError;
use faultline_core::Channel;
use faultline_core::ChannelId;
use faultline_core::ConditionId;
use faultline_core::Deployment;
use faultline_core::EnrichmentTrigger;
use faultline_core::ErrorEvent;
use faultline_core::ErrorGroup;
use faultline_core::EventBus;
use faultline_core::EventMessage;
use faultline_core::HostField;
use faultline_core::HostSample;
use faultline_core::Hypothesis;
use faultline_core::Incident;
use faultline_core::IncidentFilter;
use faultline_core::IncidentId;
use faultline_core::IncidentSeverity;
use faultline_core::IncidentState;
use faultline_core::IncidentStats;
use faultline_core::IncidentStore;
use faultline_core::KvCache;
use faultline_core::LogEntry;
use faultline_core::MetricPoint;
use faultline_core::ModelClient;
use faultline_core::ModelError;
use faultline_core::ModelRequest;
use faultline_core::ModelResponse;
use faultline_core::ModelUsage;
use faultline_core::MutingRule;
use faultline_core::NotificationChannel;
use faultline_core::Notifier;
use faultline_core::PolicyId;
use faultline_core::ProjectId;
use faultline_core::ServiceRegistration;
use faultline_core::Span;
use faultline_core::StepKind;
use faultline_core::StoreError;
use faultline_core::TelemetryStore;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_core::Trace;
use faultline_core::Transaction;
use faultline_core::Vulnerability;

// ============================================================================
// SECTION: Event Bus
// ============================================================================

/// Bus that records every published message.
#[derive(Default)]
pub struct RecordingBus {
    /// Published `(channel, message)` pairs in publish order.
    pub published: Mutex<Vec<(Channel, EventMessage)>>,
}

impl EventBus for RecordingBus {
    fn publish(&self, channel: Channel, message: &EventMessage) -> Result<(), BusError> {
        self.published.lock().unwrap().push((channel, message.clone()));
        Ok(())
    }
}

impl RecordingBus {
    /// Returns the event types published on a channel, in order.
    pub fn types_on(&self, channel: Channel) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(published_channel, _)| *published_channel == channel)
            .map(|(_, message)| message.event_type.clone())
            .collect()
    }
}

// ============================================================================
// SECTION: KV Cache
// ============================================================================

/// Expiring in-memory cache mirroring `SET NX EX` semantics.
#[derive(Default)]
pub struct TestCache {
    /// Entries keyed by cache key with their expiry instant.
    entries: Mutex<BTreeMap<String, (String, Instant)>>,
}

impl KvCache for TestCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put_ttl(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
    }

    fn put_if_absent_ttl(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let live = entries.get(key).is_some_and(|(_, expires)| *expires > Instant::now());
        if live {
            return false;
        }
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        true
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

// ============================================================================
// SECTION: Incident Store
// ============================================================================

/// In-memory incident repository.
#[derive(Default)]
pub struct MemIncidentStore {
    /// Incidents keyed by identifier.
    pub incidents: Mutex<BTreeMap<String, Incident>>,
    /// Activities in insert order.
    pub activities: Mutex<Vec<Activity>>,
    /// Analysis steps in insert order.
    pub steps: Mutex<Vec<AnalysisStep>>,
    /// Hypotheses in insert order.
    pub hypotheses: Mutex<Vec<Hypothesis>>,
    /// AI request audit rows in insert order.
    pub ai_requests: Mutex<Vec<AiRequest>>,
}

impl IncidentStore for MemIncidentStore {
    fn insert_incident(&self, incident: &Incident) -> Result<(), StoreError> {
        self.incidents.lock().unwrap().insert(incident.id.to_string(), incident.clone());
        Ok(())
    }

    fn get_incident(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
    ) -> Result<Option<Incident>, StoreError> {
        Ok(self
            .incidents
            .lock()
            .unwrap()
            .get(incident_id.as_str())
            .filter(|incident| incident.project_id == *project_id)
            .cloned())
    }

    fn list_incidents(
        &self,
        project_id: &ProjectId,
        filter: &IncidentFilter,
    ) -> Result<(Vec<Incident>, u64), StoreError> {
        let incidents: Vec<Incident> = self
            .incidents
            .lock()
            .unwrap()
            .values()
            .filter(|incident| incident.project_id == *project_id)
            .filter(|incident| filter.state.is_none_or(|state| incident.state == state))
            .filter(|incident| {
                filter.severity.is_none_or(|severity| incident.severity == severity)
            })
            .cloned()
            .collect();
        let total = incidents.len() as u64;
        Ok((incidents, total))
    }

    fn set_incident_state(
        &self,
        incident_id: &IncidentId,
        state: IncidentState,
        acknowledged_at: Option<Timestamp>,
        resolved_at: Option<Timestamp>,
    ) -> Result<(), StoreError> {
        let mut incidents = self.incidents.lock().unwrap();
        let incident = incidents
            .get_mut(incident_id.as_str())
            .ok_or_else(|| StoreError::NotFound(incident_id.to_string()))?;
        incident.state = state;
        incident.acknowledged_at = acknowledged_at;
        incident.resolved_at = resolved_at;
        Ok(())
    }

    fn set_incident_severity(
        &self,
        incident_id: &IncidentId,
        severity: IncidentSeverity,
    ) -> Result<(), StoreError> {
        let mut incidents = self.incidents.lock().unwrap();
        let incident = incidents
            .get_mut(incident_id.as_str())
            .ok_or_else(|| StoreError::NotFound(incident_id.to_string()))?;
        incident.severity = severity;
        Ok(())
    }

    fn delete_incident(
        &self,
        _project_id: &ProjectId,
        incident_id: &IncidentId,
    ) -> Result<(), StoreError> {
        self.incidents.lock().unwrap().remove(incident_id.as_str());
        Ok(())
    }

    fn insert_activity(&self, activity: &Activity) -> Result<(), StoreError> {
        self.activities.lock().unwrap().push(activity.clone());
        Ok(())
    }

    fn list_activities(&self, incident_id: &IncidentId) -> Result<Vec<Activity>, StoreError> {
        Ok(self
            .activities
            .lock()
            .unwrap()
            .iter()
            .filter(|activity| activity.incident_id == *incident_id)
            .cloned()
            .collect())
    }

    fn insert_steps(&self, steps: &[AnalysisStep]) -> Result<(), StoreError> {
        self.steps.lock().unwrap().extend_from_slice(steps);
        Ok(())
    }

    fn update_step(&self, step: &AnalysisStep) -> Result<(), StoreError> {
        let mut steps = self.steps.lock().unwrap();
        if let Some(existing) = steps.iter_mut().find(|candidate| candidate.id == step.id) {
            *existing = step.clone();
        }
        Ok(())
    }

    fn steps_for_incident(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Vec<AnalysisStep>, StoreError> {
        let mut steps: Vec<AnalysisStep> = self
            .steps
            .lock()
            .unwrap()
            .iter()
            .filter(|step| step.incident_id == *incident_id)
            .cloned()
            .collect();
        steps.sort_by_key(|step| step.step_number);
        Ok(steps)
    }

    fn step_by_kind(
        &self,
        incident_id: &IncidentId,
        kind: StepKind,
    ) -> Result<Option<AnalysisStep>, StoreError> {
        Ok(self
            .steps
            .lock()
            .unwrap()
            .iter()
            .find(|step| step.incident_id == *incident_id && step.kind == kind)
            .cloned())
    }

    fn insert_hypothesis(&self, hypothesis: &Hypothesis) -> Result<(), StoreError> {
        self.hypotheses.lock().unwrap().push(hypothesis.clone());
        Ok(())
    }

    fn hypotheses_for_incident(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Vec<Hypothesis>, StoreError> {
        let mut hypotheses: Vec<Hypothesis> = self
            .hypotheses
            .lock()
            .unwrap()
            .iter()
            .filter(|hypothesis| hypothesis.incident_id == *incident_id)
            .cloned()
            .collect();
        hypotheses.sort_by_key(|hypothesis| hypothesis.rank);
        Ok(hypotheses)
    }

    fn insert_ai_request(&self, request: &AiRequest) -> Result<(), StoreError> {
        self.ai_requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn incident_stats(&self, _project_id: &ProjectId) -> Result<IncidentStats, StoreError> {
        Ok(IncidentStats::default())
    }
}

// ============================================================================
// SECTION: Alert Store
// ============================================================================

/// In-memory alerting repository.
#[derive(Default)]
pub struct MemAlertStore {
    /// Conditions keyed by identifier.
    pub conditions: Mutex<BTreeMap<String, AlertCondition>>,
    /// Active alerts keyed by identifier.
    pub alerts: Mutex<BTreeMap<String, ActiveAlert>>,
    /// Muting rules in insert order.
    pub rules: Mutex<Vec<MutingRule>>,
}

impl AlertStore for MemAlertStore {
    fn insert_condition(&self, condition: &AlertCondition) -> Result<(), StoreError> {
        self.conditions.lock().unwrap().insert(condition.id.to_string(), condition.clone());
        Ok(())
    }

    fn get_condition(
        &self,
        condition_id: &ConditionId,
    ) -> Result<Option<AlertCondition>, StoreError> {
        Ok(self.conditions.lock().unwrap().get(condition_id.as_str()).cloned())
    }

    fn list_enabled_conditions(&self) -> Result<Vec<AlertCondition>, StoreError> {
        Ok(self
            .conditions
            .lock()
            .unwrap()
            .values()
            .filter(|condition| condition.is_enabled)
            .cloned()
            .collect())
    }

    fn insert_policy(&self, _policy: &AlertPolicy) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_channel(&self, _channel: &NotificationChannel) -> Result<(), StoreError> {
        Ok(())
    }

    fn bind_channel(
        &self,
        _channel_id: &ChannelId,
        _policy_id: &PolicyId,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    fn channels_for_policy(
        &self,
        _policy_id: &PolicyId,
    ) -> Result<Vec<NotificationChannel>, StoreError> {
        Ok(Vec::new())
    }

    fn insert_muting_rule(&self, rule: &MutingRule) -> Result<(), StoreError> {
        self.rules.lock().unwrap().push(rule.clone());
        Ok(())
    }

    fn active_muting_rules(&self, project_id: &ProjectId) -> Result<Vec<MutingRule>, StoreError> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|rule| rule.project_id == *project_id && rule.is_active)
            .cloned()
            .collect())
    }

    fn firing_alert(
        &self,
        condition_id: &ConditionId,
    ) -> Result<Option<ActiveAlert>, StoreError> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .values()
            .find(|alert| {
                alert.condition_id == *condition_id && alert.status == AlertStatus::Firing
            })
            .cloned())
    }

    fn insert_alert(&self, alert: &ActiveAlert) -> Result<(), StoreError> {
        let mut alerts = self.alerts.lock().unwrap();
        let duplicate = alerts.values().any(|existing| {
            existing.condition_id == alert.condition_id
                && existing.status == AlertStatus::Firing
        });
        if duplicate && alert.status == AlertStatus::Firing {
            return Err(StoreError::Conflict("firing alert already exists".to_string()));
        }
        alerts.insert(alert.id.to_string(), alert.clone());
        Ok(())
    }

    fn resolve_alert(
        &self,
        alert_id: &AlertId,
        resolved_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut alerts = self.alerts.lock().unwrap();
        let alert = alerts
            .get_mut(alert_id.as_str())
            .ok_or_else(|| StoreError::NotFound(alert_id.to_string()))?;
        alert.status = AlertStatus::Resolved;
        alert.resolved_at = Some(resolved_at);
        Ok(())
    }

    fn list_alerts(&self, project_id: &ProjectId) -> Result<Vec<ActiveAlert>, StoreError> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .values()
            .filter(|alert| alert.project_id == *project_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: Telemetry Store
// ============================================================================

/// In-memory telemetry repository computing window aggregates naively.
#[derive(Default)]
pub struct MemTelemetryStore {
    /// Metric points in insert order.
    pub metrics: Mutex<Vec<MetricPoint>>,
    /// Transactions in insert order.
    pub transactions: Mutex<Vec<Transaction>>,
    /// Host samples in insert order.
    pub hosts: Mutex<Vec<HostSample>>,
}

impl TelemetryStore for MemTelemetryStore {
    fn insert_metric_points(&self, points: &[MetricPoint]) -> Result<(), StoreError> {
        self.metrics.lock().unwrap().extend_from_slice(points);
        Ok(())
    }

    fn insert_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError> {
        self.transactions.lock().unwrap().extend_from_slice(transactions);
        Ok(())
    }

    fn insert_trace(&self, _trace: &Trace, _spans: &[Span]) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_logs(&self, _entries: &[LogEntry]) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_host_samples(&self, samples: &[HostSample]) -> Result<(), StoreError> {
        self.hosts.lock().unwrap().extend_from_slice(samples);
        Ok(())
    }

    fn insert_browser_events(&self, _events: &[BrowserEvent]) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_vulnerabilities(&self, _findings: &[Vulnerability]) -> Result<(), StoreError> {
        Ok(())
    }

    fn record_error_event(
        &self,
        _tenant_id: &TenantId,
        _project_id: &ProjectId,
        _event: &ErrorEvent,
        _now: Timestamp,
    ) -> Result<ErrorGroup, StoreError> {
        Err(StoreError::Store("not supported by the telemetry fake".to_string()))
    }

    fn upsert_service(&self, _registration: &ServiceRegistration) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_deployment(&self, _deployment: &Deployment) -> Result<(), StoreError> {
        Ok(())
    }

    fn list_metric_points(
        &self,
        project_id: &ProjectId,
        metric_name: Option<&str>,
        service_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MetricPoint>, StoreError> {
        Ok(self
            .metrics
            .lock()
            .unwrap()
            .iter()
            .filter(|point| point.project_id == *project_id)
            .filter(|point| metric_name.is_none_or(|name| point.metric_name == name))
            .filter(|point| service_name.is_none_or(|name| point.service_name == name))
            .take(limit)
            .cloned()
            .collect())
    }

    fn metric_window_avg(
        &self,
        project_id: &ProjectId,
        metric_name: &str,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let metrics = self.metrics.lock().unwrap();
        let values: Vec<f64> = metrics
            .iter()
            .filter(|point| point.project_id == *project_id)
            .filter(|point| point.metric_name == metric_name)
            .filter(|point| service_name.is_none_or(|name| point.service_name == name))
            .filter(|point| point.timestamp >= since)
            .map(|point| point.value)
            .collect();
        Ok(mean(&values))
    }

    fn transaction_error_rate(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let transactions = self.transactions.lock().unwrap();
        let window: Vec<&Transaction> = transactions
            .iter()
            .filter(|transaction| transaction.project_id == *project_id)
            .filter(|transaction| {
                service_name.is_none_or(|name| transaction.service_name == name)
            })
            .filter(|transaction| transaction.timestamp >= since)
            .collect();
        if window.is_empty() {
            return Ok(None);
        }
        let errored = window.iter().filter(|transaction| transaction.error).count();
        Ok(Some(100.0 * errored as f64 / window.len() as f64))
    }

    fn transaction_avg_duration(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let transactions = self.transactions.lock().unwrap();
        let values: Vec<f64> = transactions
            .iter()
            .filter(|transaction| transaction.project_id == *project_id)
            .filter(|transaction| {
                service_name.is_none_or(|name| transaction.service_name == name)
            })
            .filter(|transaction| transaction.timestamp >= since)
            .map(|transaction| transaction.duration_ms)
            .collect();
        Ok(mean(&values))
    }

    fn transaction_percentiles(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<faultline_core::LatencyPercentiles>, StoreError> {
        let transactions = self.transactions.lock().unwrap();
        let mut durations: Vec<f64> = transactions
            .iter()
            .filter(|transaction| transaction.project_id == *project_id)
            .filter(|transaction| {
                service_name.is_none_or(|name| transaction.service_name == name)
            })
            .filter(|transaction| transaction.timestamp >= since)
            .map(|transaction| transaction.duration_ms)
            .collect();
        if durations.is_empty() {
            return Ok(None);
        }
        durations.sort_by(f64::total_cmp);
        let pick = |pct: f64| {
            let rank = ((pct / 100.0) * durations.len() as f64).ceil().max(1.0) as usize;
            durations[rank.min(durations.len()) - 1]
        };
        Ok(Some(faultline_core::LatencyPercentiles {
            p50: pick(50.0),
            p95: pick(95.0),
            p99: pick(99.0),
        }))
    }

    fn host_window_avg(
        &self,
        project_id: &ProjectId,
        field: HostField,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let hosts = self.hosts.lock().unwrap();
        let values: Vec<f64> = hosts
            .iter()
            .filter(|sample| sample.project_id == *project_id)
            .filter(|sample| sample.timestamp >= since)
            .map(|sample| match field {
                HostField::CpuPercent => sample.cpu_percent,
                HostField::MemoryPercent => sample.memory_percent,
            })
            .collect();
        Ok(mean(&values))
    }
}

/// Returns the mean of the values, or `None` when empty.
fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// ============================================================================
// SECTION: Notifier / Trigger / Model
// ============================================================================

/// Notifier that counts invocations.
#[derive(Default)]
pub struct CountingNotifier {
    /// Number of notify calls observed.
    pub calls: AtomicUsize,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify(&self, _condition: &AlertCondition, _alert: &ActiveAlert) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Enrichment trigger that records triggered incident ids.
#[derive(Default)]
pub struct RecordingTrigger {
    /// Incident ids the orchestrator asked to enrich.
    pub triggered: Mutex<Vec<String>>,
}

impl EnrichmentTrigger for RecordingTrigger {
    fn trigger(&self, incident: &Incident) {
        self.triggered.lock().unwrap().push(incident.id.to_string());
    }
}

/// Scripted model client returning a fixed response body.
pub struct ScriptedModel {
    /// Response content returned by every call.
    pub content: String,
    /// Usage reported with the response.
    pub usage: ModelUsage,
    /// Whether the client identifies as the mock.
    pub mock: bool,
    /// Number of complete calls observed.
    pub calls: AtomicUsize,
}

impl ScriptedModel {
    /// Builds a scripted model with the provided content and usage.
    pub fn new(content: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            content: content.into(),
            usage: ModelUsage { input_tokens, output_tokens },
            mock: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn is_mock(&self) -> bool {
        self.mock
    }

    async fn complete(&self, _request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModelResponse {
            content: self.content.clone(),
            usage: self.usage,
            model: "scripted".to_string(),
        })
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds a condition over the given metric for tests.
pub fn condition(metric_name: &str, operator: &str, threshold: f64) -> AlertCondition {
    AlertCondition {
        id: ConditionId::generate(),
        tenant_id: TenantId::new("tenant-1"),
        project_id: ProjectId::new("project-1"),
        name: format!("{metric_name} watch"),
        description: String::new(),
        metric_name: metric_name.to_string(),
        service_name: None,
        operator: faultline_core::CompareOp::parse(operator).unwrap(),
        threshold,
        duration_minutes: 5,
        severity: IncidentSeverity::Critical,
        is_enabled: true,
        policy_id: None,
        created_at: Timestamp::now(),
    }
}

/// Builds an incident in the given project for tests.
pub fn incident(project_id: &str) -> Incident {
    Incident {
        id: IncidentId::generate(),
        tenant_id: TenantId::new("tenant-1"),
        project_id: ProjectId::new(project_id),
        title: "Checkout latency spike".to_string(),
        description: "p95 latency exceeded 2s".to_string(),
        service_name: "checkout".to_string(),
        state: IncidentState::Investigating,
        severity: IncidentSeverity::High,
        detected_at: Timestamp::now(),
        acknowledged_at: None,
        resolved_at: None,
        created_at: Timestamp::now(),
    }
}

/// Builds a host sample at `timestamp` for tests.
pub fn host_sample(project_id: &str, cpu: f64, timestamp: Timestamp) -> HostSample {
    HostSample {
        tenant_id: TenantId::new("tenant-1"),
        project_id: ProjectId::new(project_id),
        hostname: "host-1".to_string(),
        cpu_percent: cpu,
        memory_percent: 40.0,
        disk_usage: serde_json::Value::Null,
        network_io: serde_json::Value::Null,
        load_avg: serde_json::Value::Null,
        timestamp,
    }
}
