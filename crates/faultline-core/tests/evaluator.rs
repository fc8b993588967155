// faultline-core/tests/evaluator.rs
// ============================================================================
// Module: Alert Evaluator Tests
// Description: Fire/resolve reconciliation tests for the tick engine.
// Purpose: Ensure exactly one firing alert per condition and idempotent ticks.
// Dependencies: faultline-core
// ============================================================================
//! Validates the fire → resolve lifecycle, duplicate-tick idempotence, and
//! the no-data skip path.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::CountingNotifier;
use common::MemAlertStore;
use common::MemTelemetryStore;
use common::RecordingBus;
use faultline_core::AlertEvaluator;
use faultline_core::AlertStatus;
use faultline_core::AlertStore;
use faultline_core::Channel;
use faultline_core::ProjectId;
use faultline_core::TelemetryStore;
use faultline_core::Timestamp;

/// Builds an evaluator plus handles to its seams.
fn evaluator() -> (
    AlertEvaluator,
    Arc<MemAlertStore>,
    Arc<MemTelemetryStore>,
    Arc<RecordingBus>,
    Arc<CountingNotifier>,
) {
    let alerts = Arc::new(MemAlertStore::default());
    let telemetry = Arc::new(MemTelemetryStore::default());
    let bus = Arc::new(RecordingBus::default());
    let notifier = Arc::new(CountingNotifier::default());
    let engine = AlertEvaluator::new(
        Arc::clone(&alerts) as Arc<dyn AlertStore>,
        Arc::clone(&telemetry) as Arc<dyn faultline_core::TelemetryStore>,
        Arc::clone(&bus) as Arc<dyn faultline_core::EventBus>,
        Arc::clone(&notifier) as Arc<dyn faultline_core::Notifier>,
    );
    (engine, alerts, telemetry, bus, notifier)
}

/// Injects host samples averaging `cpu` within the last five minutes.
fn inject_cpu(telemetry: &MemTelemetryStore, cpu: f64, now: Timestamp) {
    let samples: Vec<_> = (0..5)
        .map(|minute| common::host_sample("project-1", cpu, now.minus_minutes(minute)))
        .collect();
    telemetry.insert_host_samples(&samples).unwrap();
}

/// A `cpu_percent > 90 for 5m` condition fires on breach, resolves when
/// samples drop, and no second alert is created.
#[tokio::test]
async fn fires_then_resolves_without_duplicates() {
    let (engine, alerts, telemetry, bus, notifier) = evaluator();
    let condition = common::condition("cpu_percent", ">", 90.0);
    alerts.insert_condition(&condition).unwrap();

    let now = Timestamp::now();
    inject_cpu(&telemetry, 95.0, now);
    let summary = engine.run_tick(now).await.unwrap();
    assert_eq!(summary.fired, 1);

    let firing = alerts.firing_alert(&condition.id).unwrap().unwrap();
    assert_eq!(firing.status, AlertStatus::Firing);
    assert_eq!(firing.severity, condition.severity);
    assert!(firing.metric_value.unwrap() > 90.0);
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);

    // Clear the breach: later samples pull the five-minute mean to 60.
    let later = Timestamp::now();
    telemetry.hosts.lock().unwrap().clear();
    inject_cpu(&telemetry, 60.0, later);
    let summary = engine.run_tick(later).await.unwrap();
    assert_eq!(summary.resolved, 1);
    assert!(alerts.firing_alert(&condition.id).unwrap().is_none());

    let resolved: Vec<_> = alerts.list_alerts(&ProjectId::new("project-1")).unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].status, AlertStatus::Resolved);
    assert!(resolved[0].resolved_at.is_some());

    assert_eq!(bus.types_on(Channel::Alerts), vec!["alert.fired", "alert.resolved"]);
}

/// A second identical tick is a no-op while the breach persists.
#[tokio::test]
async fn duplicate_ticks_are_idempotent() {
    let (engine, alerts, telemetry, _bus, notifier) = evaluator();
    let condition = common::condition("cpu_percent", ">", 90.0);
    alerts.insert_condition(&condition).unwrap();

    let now = Timestamp::now();
    inject_cpu(&telemetry, 95.0, now);
    assert_eq!(engine.run_tick(now).await.unwrap().fired, 1);
    let second = engine.run_tick(now).await.unwrap();
    assert_eq!(second.fired, 0);
    assert_eq!(second.resolved, 0);

    assert_eq!(alerts.alerts.lock().unwrap().len(), 1);
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
}

/// Conditions without samples in the window are skipped silently.
#[tokio::test]
async fn missing_samples_skip_the_condition() {
    let (engine, alerts, _telemetry, bus, notifier) = evaluator();
    let condition = common::condition("cpu_percent", ">", 90.0);
    alerts.insert_condition(&condition).unwrap();

    let summary = engine.run_tick(Timestamp::now()).await.unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.fired, 0);
    assert!(bus.published.lock().unwrap().is_empty());
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
}

/// The window mean, not point samples, decides the breach: one outlier in an
/// otherwise healthy window does not fire.
#[tokio::test]
async fn single_outlier_does_not_fire() {
    let (engine, alerts, telemetry, _bus, _notifier) = evaluator();
    let condition = common::condition("cpu_percent", ">", 90.0);
    alerts.insert_condition(&condition).unwrap();

    let now = Timestamp::now();
    inject_cpu(&telemetry, 50.0, now);
    telemetry.insert_host_samples(&[common::host_sample("project-1", 99.0, now)]).unwrap();

    let summary = engine.run_tick(now).await.unwrap();
    assert_eq!(summary.fired, 0);
}

/// A raw ingested metric takes precedence over derived families.
#[tokio::test]
async fn raw_metric_takes_precedence() {
    let (engine, alerts, telemetry, _bus, _notifier) = evaluator();
    // Metric name matches the cpu-derived pattern, but a raw metric with the
    // same name exists and reads below threshold.
    let condition = common::condition("cpu_percent", ">", 90.0);
    alerts.insert_condition(&condition).unwrap();

    let now = Timestamp::now();
    inject_cpu(&telemetry, 99.0, now);
    let point = faultline_core::MetricPoint {
        tenant_id: faultline_core::TenantId::new("tenant-1"),
        project_id: ProjectId::new("project-1"),
        service_name: "host-agent".to_string(),
        metric_name: "cpu_percent".to_string(),
        value: 10.0,
        kind: faultline_core::MetricKind::Gauge,
        tags: serde_json::Value::Null,
        timestamp: now,
    };
    telemetry.insert_metric_points(&[point]).unwrap();

    let summary = engine.run_tick(now).await.unwrap();
    assert_eq!(summary.fired, 0);
}

/// Error-rate conditions derive from transactions.
#[tokio::test]
async fn error_rate_derives_from_transactions() {
    let (engine, alerts, telemetry, _bus, _notifier) = evaluator();
    let condition = common::condition("http_error_rate", ">", 25.0);
    alerts.insert_condition(&condition).unwrap();

    let now = Timestamp::now();
    let transactions: Vec<_> = (0..4)
        .map(|index| faultline_core::Transaction {
            tenant_id: faultline_core::TenantId::new("tenant-1"),
            project_id: ProjectId::new("project-1"),
            service_name: "api".to_string(),
            endpoint: "/checkout".to_string(),
            method: "POST".to_string(),
            status_code: if index == 0 { 500 } else { 200 },
            duration_ms: 120.0,
            db_duration_ms: 0.0,
            external_duration_ms: 0.0,
            error: index == 0,
            timestamp: now,
        })
        .collect();
    telemetry.insert_transactions(&transactions).unwrap();

    // 1 of 4 errored = 25%, not strictly greater than the threshold.
    assert_eq!(engine.run_tick(now).await.unwrap().fired, 0);

    // Push the rate over the threshold with another failure.
    let mut failing = transactions[0].clone();
    failing.timestamp = now;
    telemetry.insert_transactions(&[failing]).unwrap();
    assert_eq!(engine.run_tick(now).await.unwrap().fired, 1);
}
