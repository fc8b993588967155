// faultline-contract/src/frames.rs
// ============================================================================
// Module: Realtime Frame Contract
// Description: WebSocket frame taxonomy for the realtime gateway.
// Purpose: Define the handshake and subscription protocol on `/ws`.
// Dependencies: faultline-core, serde
// ============================================================================

//! ## Overview
//! Within ten seconds of socket accept, the client must send a `connect`
//! frame carrying a JWT and the claimed tenant. After a successful handshake
//! the client manages a channel subscription set with `subscribe` and
//! `unsubscribe`, and keeps the connection alive with `ping`. Domain events
//! mirrored from the bus are delivered as raw [`faultline_core::EventMessage`]
//! JSON, whose own `type` field names the event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Client Frames
// ============================================================================

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Handshake frame; must be the first frame on the socket.
    Connect {
        /// JWT bearer token.
        token: String,
        /// Tenant the client claims to belong to.
        #[serde(rename = "tenantId")]
        tenant_id: String,
    },
    /// Heartbeat request.
    Ping,
    /// Adds channels to the session's subscription set.
    Subscribe {
        /// Channel names to add.
        channels: Vec<String>,
    },
    /// Removes channels from the session's subscription set.
    Unsubscribe {
        /// Channel names to remove.
        channels: Vec<String>,
    },
}

// ============================================================================
// SECTION: Server Frames
// ============================================================================

/// Control frames sent by the server. Domain events bypass this enum and are
/// forwarded as raw event-message JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Handshake accepted.
    Connected {
        /// Server-assigned or JWT-derived client identifier.
        #[serde(rename = "clientId")]
        client_id: String,
        /// Authenticated tenant.
        #[serde(rename = "tenantId")]
        tenant_id: String,
        /// Server timestamp.
        timestamp: Timestamp,
    },
    /// Heartbeat response.
    Pong {
        /// Server timestamp.
        timestamp: Timestamp,
    },
    /// Subscription acknowledgement.
    Subscribed {
        /// Channels now in the subscription set.
        channels: Vec<String>,
        /// Server timestamp.
        timestamp: Timestamp,
    },
    /// Unsubscription acknowledgement.
    Unsubscribed {
        /// Channels removed from the subscription set.
        channels: Vec<String>,
        /// Server timestamp.
        timestamp: Timestamp,
    },
    /// Protocol or authentication error; fatal errors close with 1008.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

/// WebSocket close code used for authentication and protocol violations.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Seconds the gateway waits for the `connect` frame after socket accept.
pub const HANDSHAKE_TIMEOUT_SECS: u64 = 10;
