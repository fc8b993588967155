// faultline-notify/src/sink/mod.rs
// ============================================================================
// Module: Notification Sinks
// Description: Sink trait and shared helpers for channel delivery.
// Purpose: Deliver alert payloads to concrete destinations.
// Dependencies: faultline-core, thiserror
// ============================================================================

//! ## Overview
//! Sinks deliver a fired alert to one destination kind using its
//! channel-specific payload shape. Delivery failures surface as
//! [`SinkError`] values so the notifier can isolate them per channel; a sink
//! never retries on its own, and external destinations are expected to
//! deduplicate by the alert id where they support it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use faultline_core::ActiveAlert;
use faultline_core::ChannelKind;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod email;
pub mod pagerduty;
pub mod slack;
pub mod teams;
pub mod webhook;

// ============================================================================
// SECTION: Sink Errors
// ============================================================================

/// Errors emitted by notification sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Channel configuration is missing a required field.
    #[error("channel config incomplete: {0}")]
    ConfigIncomplete(String),
    /// Delivery to the destination failed.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Delivers alert payloads to one destination kind.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    /// Destination kind this sink serves.
    fn kind(&self) -> ChannelKind;

    /// Delivers the alert using the channel's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the configuration is unusable or the
    /// destination rejects the delivery.
    async fn deliver(&self, config: &Value, alert: &ActiveAlert) -> Result<(), SinkError>;
}

// ============================================================================
// SECTION: Config Helpers
// ============================================================================

/// Reads a required string field from channel configuration.
pub(crate) fn required_str<'a>(config: &'a Value, key: &str) -> Result<&'a str, SinkError> {
    config
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SinkError::ConfigIncomplete(format!("missing {key}")))
}

/// Reads an optional string field from channel configuration.
pub(crate) fn optional_str<'a>(config: &'a Value, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str).filter(|value| !value.trim().is_empty())
}

/// Returns the alert's service label for payload bodies.
pub(crate) fn service_label(alert: &ActiveAlert) -> &str {
    alert.service_name.as_deref().unwrap_or("N/A")
}
