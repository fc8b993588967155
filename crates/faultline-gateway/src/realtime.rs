// faultline-gateway/src/realtime.rs
// ============================================================================
// Module: Realtime Gateway
// Description: Authenticated WebSocket sessions with bus fan-out.
// Purpose: Mirror domain events to subscribed, tenant-isolated clients.
// Dependencies: axum, faultline-bus, faultline-contract, faultline-core
// ============================================================================

//! ## Overview
//! Each socket must complete a `connect` handshake within ten seconds: the
//! JWT's signature and expiry are verified and its tenant claim must equal
//! the claimed tenant; any failure sends one `error` frame and closes with
//! code 1008. Authenticated sessions manage a channel subscription set. A
//! fan-out task subscribes once to every bus channel and forwards each
//! message to sessions whose tenant matches and whose set contains the
//! channel; messages without a tenant are dropped, and a failed send
//! disconnects the session eagerly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::CloseFrame;
use axum::extract::ws::Message;
use axum::extract::ws::Utf8Bytes;
use axum::extract::ws::WebSocket;
use axum::response::Response;
use faultline_bus::MemoryBus;
use faultline_contract::CLOSE_POLICY_VIOLATION;
use faultline_contract::ClientFrame;
use faultline_contract::HANDSHAKE_TIMEOUT_SECS;
use faultline_contract::ServerFrame;
use faultline_core::Channel;
use faultline_core::ClientId;
use faultline_core::EventMessage;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;

use crate::state::GatewayState;

// ============================================================================
// SECTION: Session Registry
// ============================================================================

/// Live session handle held by the registry.
struct SessionHandle {
    /// Authenticated tenant.
    tenant_id: TenantId,
    /// Subscribed channel names.
    channels: BTreeSet<String>,
    /// Serialized-frame sender feeding the socket writer.
    sender: mpsc::UnboundedSender<String>,
}

/// Registry of live realtime sessions.
#[derive(Default)]
pub struct SessionRegistry {
    /// Sessions keyed by session identifier.
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live session count.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.sessions.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }

    /// Registers a session.
    pub fn register(
        &self,
        session_id: &ClientId,
        tenant_id: TenantId,
        sender: mpsc::UnboundedSender<String>,
    ) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(
                session_id.to_string(),
                SessionHandle { tenant_id, channels: BTreeSet::new(), sender },
            );
        }
    }

    /// Unregisters a session; pending sends are discarded with the sender.
    pub fn unregister(&self, session_id: &ClientId) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(session_id.as_str());
        }
    }

    /// Adds channels to a session's subscription set.
    pub fn subscribe(&self, session_id: &ClientId, channels: &[String]) {
        if let Ok(mut sessions) = self.sessions.lock() {
            if let Some(session) = sessions.get_mut(session_id.as_str()) {
                session.channels.extend(channels.iter().cloned());
            }
        }
    }

    /// Removes channels from a session's subscription set.
    pub fn unsubscribe(&self, session_id: &ClientId, channels: &[String]) {
        if let Ok(mut sessions) = self.sessions.lock() {
            if let Some(session) = sessions.get_mut(session_id.as_str()) {
                for channel in channels {
                    session.channels.remove(channel);
                }
            }
        }
    }

    /// Fans a bus message out to matching sessions, dropping sessions whose
    /// send fails. Messages without a tenant are dropped entirely.
    pub fn fan_out(&self, channel: Channel, message: &EventMessage) -> usize {
        if message.tenant_id.as_str().is_empty() {
            return 0;
        }
        let Ok(serialized) = serde_json::to_string(message) else {
            return 0;
        };
        let mut delivered = 0;
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.retain(|_, session| {
                let wants = session.tenant_id == message.tenant_id
                    && session.channels.contains(channel.as_str());
                if !wants {
                    return true;
                }
                if session.sender.send(serialized.clone()).is_ok() {
                    delivered += 1;
                    true
                } else {
                    // Eager disconnect: the writer is gone.
                    false
                }
            });
        }
        delivered
    }
}

// ============================================================================
// SECTION: Fan-Out Task
// ============================================================================

/// Spawns one forwarding task per bus channel.
pub fn spawn_fanout(bus: &MemoryBus, registry: Arc<SessionRegistry>) {
    for (channel, mut receiver) in bus.subscribe_all() {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        registry.fan_out(channel, &message);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(channel = channel.as_str(), skipped, "fan-out lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

// ============================================================================
// SECTION: WebSocket Endpoint
// ============================================================================

/// `GET /ws`.
pub async fn ws_endpoint(
    State(state): State<Arc<GatewayState>>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Drives one socket through handshake, frames, and teardown.
async fn handle_socket(state: Arc<GatewayState>, mut socket: WebSocket) {
    // Handshake: the first frame must be a valid connect within the window.
    let handshake = tokio::time::timeout(
        Duration::from_secs(HANDSHAKE_TIMEOUT_SECS),
        read_client_frame(&mut socket),
    )
    .await;
    let connect = match handshake {
        Ok(Some(ClientFrame::Connect { token, tenant_id })) => {
            match state.jwt.verify_for_tenant(&token, &tenant_id) {
                Ok(user) => Some(user),
                Err(err) => {
                    reject(&mut socket, &format!("Authentication failed: {err}")).await;
                    None
                }
            }
        }
        Ok(Some(_)) | Ok(None) => {
            reject(&mut socket, "First message must be 'connect' type with authentication")
                .await;
            None
        }
        Err(_) => {
            reject(&mut socket, "Authentication timeout").await;
            None
        }
    };
    let Some(user) = connect else {
        return;
    };

    let session_id = ClientId::generate();
    let (sender, mut outbound) = mpsc::unbounded_channel::<String>();
    state.realtime.register(&session_id, user.tenant_id.clone(), sender);
    info!(client = %user.user_id, tenant = %user.tenant_id, "realtime client connected");

    let connected = ServerFrame::Connected {
        client_id: user.user_id.clone(),
        tenant_id: user.tenant_id.to_string(),
        timestamp: Timestamp::now(),
    };
    if send_frame(&mut socket, &connected).await.is_err() {
        state.realtime.unregister(&session_id);
        return;
    }

    // Single-threaded per connection: one loop multiplexes inbound frames
    // and queued fan-out messages.
    loop {
        tokio::select! {
            queued = outbound.recv() => {
                let Some(payload) = queued else { break };
                if socket.send(Message::Text(Utf8Bytes::from(payload))).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                let Some(Ok(message)) = inbound else { break };
                match message {
                    Message::Text(text) => {
                        if handle_client_message(&state, &session_id, &mut socket, text.as_str())
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    state.realtime.unregister(&session_id);
    info!(client = %user.user_id, "realtime client disconnected");
}

/// Handles one parsed client frame; an error aborts the session.
async fn handle_client_message(
    state: &Arc<GatewayState>,
    session_id: &ClientId,
    socket: &mut WebSocket,
    raw: &str,
) -> Result<(), ()> {
    let frame = match serde_json::from_str::<ClientFrame>(raw) {
        Ok(frame) => frame,
        Err(_) => {
            let error = ServerFrame::Error { message: "Invalid JSON format".to_string() };
            return send_frame(socket, &error).await;
        }
    };
    match frame {
        ClientFrame::Ping => {
            send_frame(socket, &ServerFrame::Pong { timestamp: Timestamp::now() }).await
        }
        ClientFrame::Subscribe { channels } => {
            let channels = known_channels(channels);
            state.realtime.subscribe(session_id, &channels);
            send_frame(
                socket,
                &ServerFrame::Subscribed { channels, timestamp: Timestamp::now() },
            )
            .await
        }
        ClientFrame::Unsubscribe { channels } => {
            state.realtime.unsubscribe(session_id, &channels);
            send_frame(
                socket,
                &ServerFrame::Unsubscribed { channels, timestamp: Timestamp::now() },
            )
            .await
        }
        ClientFrame::Connect { .. } => {
            let error =
                ServerFrame::Error { message: "Already authenticated".to_string() };
            send_frame(socket, &error).await
        }
    }
}

/// Filters a requested channel list down to known channel names.
fn known_channels(requested: Vec<String>) -> Vec<String> {
    requested.into_iter().filter(|name| Channel::parse(name).is_some()).collect()
}

/// Reads the next text frame as a client frame; `None` ends the session.
async fn read_client_frame(socket: &mut WebSocket) -> Option<ClientFrame> {
    loop {
        match socket.recv().await? {
            Ok(Message::Text(text)) => {
                return serde_json::from_str(text.as_str()).ok();
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Sends a control frame; an error means the socket is gone.
async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) -> Result<(), ()> {
    let Ok(payload) = serde_json::to_string(frame) else {
        return Err(());
    };
    socket.send(Message::Text(Utf8Bytes::from(payload))).await.map_err(|_| ())
}

/// Sends one error frame and closes with the policy-violation code.
async fn reject(socket: &mut WebSocket, message: &str) {
    let _ = send_frame(socket, &ServerFrame::Error { message: message.to_string() }).await;
    let close = CloseFrame {
        code: CLOSE_POLICY_VIOLATION,
        reason: Utf8Bytes::from(message.to_string()),
    };
    let _ = socket.send(Message::Close(Some(close))).await;
}
