// faultline-notify/src/sink/webhook.rs
// ============================================================================
// Module: Generic Webhook Sink
// Description: Raw JSON alert delivery to arbitrary URLs.
// Purpose: Integrate destinations without a dedicated sink.
// Dependencies: faultline-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Posts the alert as a flat JSON document to the configured URL. Consumers
//! get every field they need to deduplicate and render on their side.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use faultline_core::ActiveAlert;
use faultline_core::ChannelKind;
use serde_json::Value;
use serde_json::json;

use crate::sink::ChannelSink;
use crate::sink::SinkError;
use crate::sink::optional_str;
use crate::sink::required_str;

// ============================================================================
// SECTION: Webhook Sink
// ============================================================================

/// Generic JSON webhook sink.
pub struct WebhookSink {
    /// Shared HTTP client.
    http: reqwest::Client,
}

impl WebhookSink {
    /// Builds a webhook sink over the shared HTTP client.
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChannelSink for WebhookSink {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    async fn deliver(&self, config: &Value, alert: &ActiveAlert) -> Result<(), SinkError> {
        // Accept either key so hand-entered configs keep working.
        let url = optional_str(config, "webhook_url")
            .map_or_else(|| required_str(config, "url"), Ok)?;
        let payload = json!({
            "id": alert.id.as_str(),
            "title": alert.title,
            "description": alert.description,
            "severity": alert.severity.as_str(),
            "service_name": alert.service_name,
            "metric_value": alert.metric_value,
            "status": alert.status.as_str(),
            "fired_at": alert.fired_at.to_rfc3339(),
        });
        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| SinkError::DeliveryFailed(err.to_string()))?;
        if !response.status().is_success() {
            return Err(SinkError::DeliveryFailed(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
