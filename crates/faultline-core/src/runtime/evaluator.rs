// faultline-core/src/runtime/evaluator.rs
// ============================================================================
// Module: Faultline Alert Evaluator
// Description: Periodic reconciliation of alert conditions against SLIs.
// Purpose: Fire and resolve active alerts idempotently on every tick.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! Every tick loads all enabled conditions, computes each condition's window
//! mean, and reconciles firing state: a breached condition without a firing
//! alert fires one (publish + notify); a cleared condition with a firing
//! alert resolves it (publish). Conditions with no samples in the window are
//! skipped silently, so a tick over an idle project is a no-op, and duplicate
//! ticks observe the same firing state and change nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::json;

use crate::core::alerting::ActiveAlert;
use crate::core::alerting::AlertCondition;
use crate::core::alerting::AlertStatus;
use crate::core::event::Channel;
use crate::core::event::EventMessage;
use crate::core::identifiers::AlertId;
use crate::core::time::Timestamp;
use crate::interfaces::AlertStore;
use crate::interfaces::EventBus;
use crate::interfaces::Notifier;
use crate::interfaces::StoreError;
use crate::interfaces::TelemetryStore;
use crate::runtime::operator;
use crate::runtime::sli;
use crate::runtime::sli::DerivedSli;

// ============================================================================
// SECTION: Tick Summary
// ============================================================================

/// Outcome counters for one evaluator tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Conditions loaded for evaluation.
    pub evaluated: usize,
    /// Alerts fired this tick.
    pub fired: usize,
    /// Alerts resolved this tick.
    pub resolved: usize,
    /// Conditions skipped for lack of samples.
    pub skipped: usize,
    /// Conditions whose evaluation failed.
    pub failed: usize,
}

// ============================================================================
// SECTION: Evaluator
// ============================================================================

/// Periodic alert evaluation engine.
pub struct AlertEvaluator {
    /// Alerting configuration and live state repository.
    alerts: Arc<dyn AlertStore>,
    /// Telemetry aggregate source.
    telemetry: Arc<dyn TelemetryStore>,
    /// Event publisher for `alerts` channel events.
    bus: Arc<dyn EventBus>,
    /// Notification fan-out.
    notifier: Arc<dyn Notifier>,
}

impl AlertEvaluator {
    /// Builds an evaluator over the provided seams.
    #[must_use]
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        telemetry: Arc<dyn TelemetryStore>,
        bus: Arc<dyn EventBus>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { alerts, telemetry, bus, notifier }
    }

    /// Runs one evaluation tick at `now`.
    ///
    /// Per-condition failures are counted and do not abort the tick.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only when the condition listing itself fails.
    pub async fn run_tick(&self, now: Timestamp) -> Result<TickSummary, StoreError> {
        let conditions = self.alerts.list_enabled_conditions()?;
        let mut summary = TickSummary { evaluated: conditions.len(), ..TickSummary::default() };
        for condition in &conditions {
            match self.evaluate_condition(condition, now).await {
                Ok(Outcome::Fired) => summary.fired += 1,
                Ok(Outcome::Resolved) => summary.resolved += 1,
                Ok(Outcome::NoData) => summary.skipped += 1,
                Ok(Outcome::Unchanged) => {}
                Err(_) => summary.failed += 1,
            }
        }
        Ok(summary)
    }

    /// Evaluates a single condition and reconciles its firing state.
    async fn evaluate_condition(
        &self,
        condition: &AlertCondition,
        now: Timestamp,
    ) -> Result<Outcome, StoreError> {
        let Some(value) = self.current_value(condition, now)? else {
            return Ok(Outcome::NoData);
        };
        let breached = operator::evaluate(condition.operator, value, condition.threshold);
        let firing = self.alerts.firing_alert(&condition.id)?;
        match (breached, firing) {
            (true, None) => {
                let alert = build_alert(condition, value, now);
                self.alerts.insert_alert(&alert)?;
                self.publish_alert_event("alert.fired", condition, &alert);
                self.notifier.notify(condition, &alert).await;
                Ok(Outcome::Fired)
            }
            (false, Some(alert)) => {
                self.alerts.resolve_alert(&alert.id, now)?;
                let resolved = ActiveAlert {
                    status: AlertStatus::Resolved,
                    resolved_at: Some(now),
                    ..alert
                };
                self.publish_alert_event("alert.resolved", condition, &resolved);
                Ok(Outcome::Resolved)
            }
            _ => Ok(Outcome::Unchanged),
        }
    }

    /// Computes the window mean for a condition, trying the raw metric first
    /// and falling back to the derived families.
    fn current_value(
        &self,
        condition: &AlertCondition,
        now: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let since = now.minus_minutes(condition.duration_minutes);
        let service = condition.service_name.as_deref();
        if let Some(value) = self.telemetry.metric_window_avg(
            &condition.project_id,
            &condition.metric_name,
            service,
            since,
        )? {
            return Ok(Some(value));
        }
        match sli::classify_derived(&condition.metric_name) {
            Some(DerivedSli::ErrorRate) => {
                self.telemetry.transaction_error_rate(&condition.project_id, service, since)
            }
            Some(DerivedSli::Latency) => {
                self.telemetry.transaction_avg_duration(&condition.project_id, service, since)
            }
            Some(DerivedSli::Host(field)) => {
                self.telemetry.host_window_avg(&condition.project_id, field, since)
            }
            None => Ok(None),
        }
    }

    /// Publishes an alert lifecycle event; failures are swallowed.
    fn publish_alert_event(&self, event_type: &str, condition: &AlertCondition, alert: &ActiveAlert) {
        let data = match serde_json::to_value(alert) {
            Ok(value) => value,
            Err(_) => json!({ "id": alert.id.as_str() }),
        };
        let message = EventMessage::new(event_type, data, condition.tenant_id.clone());
        let _ = self.bus.publish(Channel::Alerts, &message);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Per-condition reconciliation outcome.
enum Outcome {
    /// A new alert fired.
    Fired,
    /// An existing alert resolved.
    Resolved,
    /// No samples in the window; skipped.
    NoData,
    /// Firing state already matched the breach state.
    Unchanged,
}

/// Builds the active alert row for a breached condition.
fn build_alert(condition: &AlertCondition, value: f64, now: Timestamp) -> ActiveAlert {
    ActiveAlert {
        id: AlertId::generate(),
        tenant_id: condition.tenant_id.clone(),
        project_id: condition.project_id.clone(),
        condition_id: condition.id.clone(),
        title: format!("Alert: {}", condition.name),
        description: format!(
            "{} is {} {} (current: {value:.2})",
            condition.metric_name,
            condition.operator.as_str(),
            condition.threshold
        ),
        severity: condition.severity,
        status: AlertStatus::Firing,
        service_name: condition.service_name.clone(),
        metric_value: Some(value),
        fired_at: now,
        acknowledged_at: None,
        resolved_at: None,
    }
}
