// faultline-notify/src/notifier.rs
// ============================================================================
// Module: Alert Notifier
// Description: Policy-driven fan-out of alert notifications with muting.
// Purpose: Implement the Notifier seam over the channel sinks.
// Dependencies: faultline-core, tokio, tracing
// ============================================================================

//! ## Overview
//! Given a fired condition and its alert, the notifier resolves the enabled
//! channels bound via the condition's policy, suppresses delivery entirely
//! when an active muting rule matches the alert's labels, and otherwise
//! delivers through each channel's sink under a per-delivery timeout.
//! Failures are per-channel isolated: one failing channel never blocks the
//! others, failures are logged and swallowed, and there are no retries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use faultline_core::ActiveAlert;
use faultline_core::AlertCondition;
use faultline_core::Channel;
use faultline_core::ChannelKind;
use faultline_core::EventMessage;
use faultline_core::NotificationChannel;
use faultline_core::Timestamp;
use faultline_core::interfaces::AlertStore;
use faultline_core::interfaces::EventBus;
use faultline_core::interfaces::Notifier;
use serde_json::json;
use tracing::warn;

use crate::sink::ChannelSink;
use crate::sink::email::EmailSink;
use crate::sink::pagerduty::PagerdutySink;
use crate::sink::slack::SlackSink;
use crate::sink::teams::TeamsSink;
use crate::sink::webhook::WebhookSink;

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Policy-driven alert notifier.
pub struct AlertNotifier {
    /// Alerting configuration repository (channels, muting rules).
    alerts: Arc<dyn AlertStore>,
    /// Event publisher for delivery events.
    bus: Arc<dyn EventBus>,
    /// Registered sinks keyed by destination kind.
    sinks: BTreeMap<ChannelKind, Arc<dyn ChannelSink>>,
    /// Per-delivery timeout.
    delivery_timeout: Duration,
}

impl AlertNotifier {
    /// Builds a notifier with the default sink set.
    #[must_use]
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        bus: Arc<dyn EventBus>,
        delivery_timeout: Duration,
        smtp_password_override: Option<String>,
    ) -> Self {
        let http = reqwest::Client::new();
        let mut sinks: BTreeMap<ChannelKind, Arc<dyn ChannelSink>> = BTreeMap::new();
        sinks.insert(ChannelKind::Slack, Arc::new(SlackSink::new(http.clone())));
        sinks.insert(ChannelKind::Teams, Arc::new(TeamsSink::new(http.clone())));
        sinks.insert(ChannelKind::Pagerduty, Arc::new(PagerdutySink::new(http.clone())));
        sinks.insert(ChannelKind::Webhook, Arc::new(WebhookSink::new(http)));
        sinks.insert(ChannelKind::Email, Arc::new(EmailSink::new(smtp_password_override)));
        Self { alerts, bus, sinks, delivery_timeout }
    }

    /// Replaces a sink; used by tests and custom deployments.
    pub fn register_sink(&mut self, sink: Arc<dyn ChannelSink>) {
        self.sinks.insert(sink.kind(), sink);
    }

    /// Returns true when an active muting rule suppresses the alert at `now`.
    fn is_muted(&self, condition: &AlertCondition, alert: &ActiveAlert, now: Timestamp) -> bool {
        let labels = alert.labels(condition);
        match self.alerts.active_muting_rules(&condition.project_id) {
            Ok(rules) => rules.iter().any(|rule| rule.suppresses(&labels, now)),
            Err(err) => {
                warn!(error = %err, "muting rule lookup failed; delivering unmuted");
                false
            }
        }
    }

    /// Delivers to one channel, isolating failures.
    async fn deliver_one(&self, channel: &NotificationChannel, alert: &ActiveAlert) {
        let Some(sink) = self.sinks.get(&channel.kind) else {
            warn!(channel = %channel.name, kind = channel.kind.as_str(), "no sink registered");
            return;
        };
        let delivery = sink.deliver(&channel.config, alert);
        match tokio::time::timeout(self.delivery_timeout, delivery).await {
            Ok(Ok(())) => {
                let message = EventMessage::new(
                    "notification.delivered",
                    json!({
                        "alert_id": alert.id.as_str(),
                        "channel": channel.name,
                        "kind": channel.kind.as_str(),
                    }),
                    alert.tenant_id.clone(),
                );
                let _ = self.bus.publish(Channel::Notifications, &message);
            }
            Ok(Err(err)) => {
                warn!(channel = %channel.name, error = %err, "notification delivery failed");
            }
            Err(_) => {
                warn!(channel = %channel.name, "notification delivery timed out");
            }
        }
    }
}

#[async_trait]
impl Notifier for AlertNotifier {
    async fn notify(&self, condition: &AlertCondition, alert: &ActiveAlert) {
        let Some(policy_id) = &condition.policy_id else {
            return;
        };
        if self.is_muted(condition, alert, Timestamp::now()) {
            return;
        }
        let channels = match self.alerts.channels_for_policy(policy_id) {
            Ok(channels) => channels,
            Err(err) => {
                warn!(error = %err, "channel resolution failed");
                return;
            }
        };
        for channel in &channels {
            if channel.is_enabled {
                self.deliver_one(channel, alert).await;
            }
        }
    }
}
