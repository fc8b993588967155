// faultline-notify/src/sink/teams.rs
// ============================================================================
// Module: Teams Sink
// Description: Microsoft Teams MessageCard delivery.
// Purpose: Post alert cards into Teams channels.
// Dependencies: faultline-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Posts a legacy MessageCard payload to the configured Teams webhook. The
//! card theme color distinguishes critical alerts from the rest.

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
use crate::sink::required_str;
use crate::sink::service_label;

// ============================================================================
// SECTION: Teams Sink
// ============================================================================

/// Microsoft Teams webhook sink.
pub struct TeamsSink {
    /// Shared HTTP client.
    http: reqwest::Client,
}

impl TeamsSink {
    /// Builds a Teams sink over the shared HTTP client.
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChannelSink for TeamsSink {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Teams
    }

    async fn deliver(&self, config: &Value, alert: &ActiveAlert) -> Result<(), SinkError> {
        let webhook_url = required_str(config, "webhook_url")?;
        let theme_color = if alert.severity == IncidentSeverity::Critical {
            "d32f2f"
        } else {
            "ff9800"
        };
        let payload = json!({
            "@type": "MessageCard",
            "@context": "https://schema.org/extensions",
            "summary": alert.title,
            "themeColor": theme_color,
            "title": format!("🚨 {}", alert.title),
            "text": format!(
                "{}\n\n**Severity:** {}\n**Service:** {}",
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
                "teams returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
