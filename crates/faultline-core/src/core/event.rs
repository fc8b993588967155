// faultline-core/src/core/event.rs
// ============================================================================
// Module: Faultline Event Model
// Description: Bus channels and the canonical event message shape.
// Purpose: Define the payload contract between publishers and the realtime
//          gateway.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Backend components publish domain events on named channels; the realtime
//! gateway mirrors them to subscribed WebSocket sessions. Every message
//! carries `{type, data, tenant_id, timestamp}`; the `tenant_id` is the fan-out
//! isolation key and messages without one are dropped by consumers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Channels
// ============================================================================

/// Named pub/sub channels carried by the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Incident lifecycle events (`incident.created`, `incident.updated`).
    Incidents,
    /// Hypothesis events (`hypothesis.generated`).
    Hypotheses,
    /// Alert fire/resolve events.
    Alerts,
    /// Notification delivery events.
    Notifications,
    /// Platform-level events.
    System,
}

impl Channel {
    /// All channels, in stable order.
    pub const ALL: [Self; 5] =
        [Self::Incidents, Self::Hypotheses, Self::Alerts, Self::Notifications, Self::System];

    /// Returns the stable channel name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incidents => "incidents",
            Self::Hypotheses => "hypotheses",
            Self::Alerts => "alerts",
            Self::Notifications => "notifications",
            Self::System => "system",
        }
    }

    /// Parses a channel name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "incidents" => Some(Self::Incidents),
            "hypotheses" => Some(Self::Hypotheses),
            "alerts" => Some(Self::Alerts),
            "notifications" => Some(Self::Notifications),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Event Message
// ============================================================================

/// Canonical bus message shape.
///
/// # Invariants
/// - `tenant_id` names the tenant the event belongs to; consumers drop
///   messages whose tenant cannot be established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    /// Event type label, e.g. `incident.created`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: Value,
    /// Owning tenant used for fan-out isolation.
    pub tenant_id: TenantId,
    /// Publish timestamp.
    pub timestamp: Timestamp,
}

impl EventMessage {
    /// Builds an event message stamped with the current time.
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: Value, tenant_id: TenantId) -> Self {
        Self { event_type: event_type.into(), data, tenant_id, timestamp: Timestamp::now() }
    }
}
