// faultline-notify/src/sink/slack.rs
// ============================================================================
// Module: Slack Sink
// Description: Slack incoming-webhook delivery.
// Purpose: Post alert summaries into Slack channels.
// Dependencies: faultline-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Posts a single `text` payload to the configured incoming webhook. The
//! message carries the alert title, description, severity, and service in
//! Slack markdown.

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
use crate::sink::required_str;
use crate::sink::service_label;

// ============================================================================
// SECTION: Slack Sink
// ============================================================================

/// Slack incoming-webhook sink.
pub struct SlackSink {
    /// Shared HTTP client.
    http: reqwest::Client,
}

impl SlackSink {
    /// Builds a Slack sink over the shared HTTP client.
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChannelSink for SlackSink {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Slack
    }

    async fn deliver(&self, config: &Value, alert: &ActiveAlert) -> Result<(), SinkError> {
        let webhook_url = required_str(config, "webhook_url")?;
        let payload = json!({
            "text": format!(
                "🚨 *{}*\n{}\nSeverity: {}\nService: {}",
                alert.title,
                alert.description,
                alert.severity.as_str(),
                service_label(alert)
            ),
        });
        let response = self
            .http
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| SinkError::DeliveryFailed(err.to_string()))?;
        if !response.status().is_success() {
            return Err(SinkError::DeliveryFailed(format!(
                "slack returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
