// faultline-core/src/core/alerting.rs
// ============================================================================
// Module: Faultline Alerting Model
// Description: Alert conditions, policies, channels, muting rules, and
//              active alerts.
// Purpose: Define the configuration and live state of the alert engine.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A condition is the threshold predicate, a policy groups conditions, and a
//! channel is a delivery destination; policies reference channels many-to-many.
//! An [`ActiveAlert`] is the live instance of a firing condition; at most one
//! `firing` alert exists per condition at any moment. Muting rules suppress
//! notifications (never persistence) while their matcher set is a subset of
//! the alert's labels and the current time falls inside their window.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::AlertId;
use crate::core::identifiers::ChannelId;
use crate::core::identifiers::ConditionId;
use crate::core::identifiers::PolicyId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::RuleId;
use crate::core::identifiers::TenantId;
use crate::core::incident::IncidentSeverity;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// Threshold comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Strictly greater than.
    #[serde(rename = ">")]
    Gt,
    /// Strictly less than.
    #[serde(rename = "<")]
    Lt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Ge,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Le,
    /// Equal.
    #[serde(rename = "==")]
    Eq,
    /// Not equal.
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    /// Returns the operator's symbolic form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }

    /// Parses a symbolic operator.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            _ => None,
        }
    }
}

/// Threshold rule evaluated by the alert engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCondition {
    /// Condition identifier.
    pub id: ConditionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Metric name or derived-metric pattern (`*error_rate*`, `*cpu*`, ...).
    pub metric_name: String,
    /// Restricting service; `None` evaluates across all services.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Comparison operator.
    pub operator: CompareOp,
    /// Threshold compared against the window mean.
    pub threshold: f64,
    /// Evaluation window length in minutes.
    pub duration_minutes: u32,
    /// Severity applied to fired alerts.
    pub severity: IncidentSeverity,
    /// Whether the condition participates in evaluation.
    pub is_enabled: bool,
    /// Policy whose channels receive notifications.
    #[serde(default)]
    pub policy_id: Option<PolicyId>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Policies / Channels
// ============================================================================

/// Named group of conditions bound to notification channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// Policy identifier.
    pub id: PolicyId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Whether the policy delivers notifications.
    pub is_enabled: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

/// Notification delivery destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Slack incoming webhook.
    Slack,
    /// SMTP email.
    Email,
    /// PagerDuty Events v2.
    Pagerduty,
    /// Microsoft Teams webhook.
    Teams,
    /// Generic JSON webhook.
    Webhook,
}

impl ChannelKind {
    /// Returns the stable kind label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::Email => "email",
            Self::Pagerduty => "pagerduty",
            Self::Teams => "teams",
            Self::Webhook => "webhook",
        }
    }

    /// Parses a kind label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "slack" => Some(Self::Slack),
            "email" => Some(Self::Email),
            "pagerduty" => Some(Self::Pagerduty),
            "teams" => Some(Self::Teams),
            "webhook" => Some(Self::Webhook),
            _ => None,
        }
    }
}

/// Delivery destination referenced by policies.
///
/// # Invariants
/// - `config` holds channel-kind-specific settings and is sealed at rest by
///   the store; in memory it is plaintext JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationChannel {
    /// Channel identifier.
    pub id: ChannelId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Delivery kind.
    pub kind: ChannelKind,
    /// Kind-specific configuration (webhook URL, SMTP settings, routing key).
    pub config: Value,
    /// Whether the channel receives deliveries.
    pub is_enabled: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Muting Rules
// ============================================================================

/// Scheduled notification suppression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutingRule {
    /// Rule identifier.
    pub id: RuleId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Label matchers; every pair must be present in the alert's labels.
    pub matchers: BTreeMap<String, String>,
    /// Window start (inclusive).
    pub starts_at: Timestamp,
    /// Window end (exclusive).
    pub ends_at: Timestamp,
    /// Whether the rule is considered at all.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl MutingRule {
    /// Returns true when this rule suppresses notifications for the labels at
    /// `now`: the rule is active, `now` falls in `[starts_at, ends_at)`, and
    /// every matcher pair appears in the labels.
    #[must_use]
    pub fn suppresses(&self, labels: &BTreeMap<String, String>, now: Timestamp) -> bool {
        self.is_active
            && now >= self.starts_at
            && now < self.ends_at
            && self
                .matchers
                .iter()
                .all(|(key, value)| labels.get(key).is_some_and(|label| label == value))
    }
}

// ============================================================================
// SECTION: Active Alerts
// ============================================================================

/// Live status of an active alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Condition currently breached.
    Firing,
    /// Acknowledged by a responder.
    Acknowledged,
    /// Condition cleared.
    Resolved,
}

impl AlertStatus {
    /// Returns the stable status label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Firing => "firing",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
        }
    }

    /// Parses a status label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "firing" => Some(Self::Firing),
            "acknowledged" => Some(Self::Acknowledged),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

/// Live instance of a firing condition.
///
/// # Invariants
/// - At most one alert with `status == Firing` exists per condition; the
///   store enforces this with a partial unique index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAlert {
    /// Alert identifier.
    pub id: AlertId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Condition that fired.
    pub condition_id: ConditionId,
    /// Alert title.
    pub title: String,
    /// Alert description including the observed value.
    pub description: String,
    /// Severity copied from the condition.
    pub severity: IncidentSeverity,
    /// Live status.
    pub status: AlertStatus,
    /// Service the condition was scoped to, when any.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Observed window mean that breached the threshold.
    #[serde(default)]
    pub metric_value: Option<f64>,
    /// When the alert fired.
    pub fired_at: Timestamp,
    /// When a responder acknowledged, if ever.
    #[serde(default)]
    pub acknowledged_at: Option<Timestamp>,
    /// When the alert resolved, if ever.
    #[serde(default)]
    pub resolved_at: Option<Timestamp>,
}

impl ActiveAlert {
    /// Builds the label set muting-rule matchers are evaluated against.
    #[must_use]
    pub fn labels(&self, condition: &AlertCondition) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("condition".to_string(), condition.name.clone());
        labels.insert("metric".to_string(), condition.metric_name.clone());
        labels.insert("severity".to_string(), self.severity.as_str().to_string());
        if let Some(service) = &self.service_name {
            labels.insert("service".to_string(), service.clone());
        }
        labels
    }
}
