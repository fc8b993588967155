// faultline-notify/src/sink/pagerduty.rs
// ============================================================================
// Module: PagerDuty Sink
// Description: PagerDuty Events API v2 delivery.
// Purpose: Page responders with deduplicated alert events.
// Dependencies: faultline-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Enqueues a `trigger` event against the Events API v2 with `dedup_key` set
//! to the alert id, so repeated deliveries of the same alert collapse on the
//! PagerDuty side. Severity maps onto PagerDuty's reduced scale: `critical`
//! passes through, everything else becomes `error`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use faultline_core::ActiveAlert;
use faultline_core::ChannelKind;
use faultline_core::IncidentSeverity;
use serde_json::Value;
use serde_json::json;

use crate::sink::ChannelSink;
use crate::sink::SinkError;
use crate::sink::optional_str;
use crate::sink::required_str;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Events API v2 enqueue endpoint.
const EVENTS_V2_URL: &str = "https://events.pagerduty.com/v2/enqueue";

// ============================================================================
// SECTION: PagerDuty Sink
// ============================================================================

/// PagerDuty Events v2 sink.
pub struct PagerdutySink {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// Enqueue endpoint; overridable for tests.
    endpoint: String,
}

impl PagerdutySink {
    /// Builds a PagerDuty sink against the production endpoint.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http, endpoint: EVENTS_V2_URL.to_string() }
    }

    /// Builds a sink against a custom endpoint.
    #[must_use]
    pub fn with_endpoint(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl ChannelSink for PagerdutySink {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Pagerduty
    }

    async fn deliver(&self, config: &Value, alert: &ActiveAlert) -> Result<(), SinkError> {
        // Accept either key name used by existing integrations.
        let routing_key = optional_str(config, "routing_key")
            .map_or_else(|| required_str(config, "integration_key"), Ok)?;
        let severity = match alert.severity {
            IncidentSeverity::Critical => "critical",
            _ => "error",
        };
        let payload = json!({
            "routing_key": routing_key,
            "event_action": "trigger",
            "dedup_key": alert.id.as_str(),
            "payload": {
                "summary": alert.title,
                "severity": severity,
                "source": alert.service_name.as_deref().unwrap_or("faultline"),
                "custom_details": {
                    "description": alert.description,
                    "severity": alert.severity.as_str(),
                    "service_name": alert.service_name,
                    "metric_value": alert.metric_value,
                },
            },
        });
        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|err| SinkError::DeliveryFailed(err.to_string()))?;
        if !response.status().is_success() {
            return Err(SinkError::DeliveryFailed(format!(
                "pagerduty returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
