// faultline-gateway/tests/fanout_tests.rs
// ============================================================================
// Module: Realtime Fan-Out Tests
// Description: Tenant- and channel-filtered delivery tests.
// Purpose: Ensure sessions only ever see their own tenant's events.
// Dependencies: faultline-gateway, faultline-core
// ============================================================================
//! Validates the fan-out matrix: a tenant-1 event reaches
//! the subscribed T1 session and nobody else, and dead sessions are dropped
//! eagerly.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use faultline_core::Channel;
use faultline_core::EventMessage;
use faultline_core::TenantId;
use faultline_gateway::SessionRegistry;
use serde_json::json;

/// Test-only session registration helper.
struct TestSession {
    /// Session identifier used with the registry.
    id: faultline_core::ClientId,
    /// Receiver observing forwarded frames.
    receiver: tokio::sync::mpsc::UnboundedReceiver<String>,
}

/// Registers a session subscribed to the given channels.
fn connect(registry: &SessionRegistry, tenant: &str, channels: &[&str]) -> TestSession {
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    let id = faultline_core::ClientId::generate();
    registry.register(&id, TenantId::new(tenant), sender);
    let names: Vec<String> = channels.iter().map(ToString::to_string).collect();
    registry.subscribe(&id, &names);
    TestSession { id, receiver }
}

/// Builds an `incident.created` event for the tenant.
fn event(tenant: &str) -> EventMessage {
    EventMessage::new("incident.created", json!({"id": "inc-1"}), TenantId::new(tenant))
}

/// A tenant-1 event reaches the subscribed tenant-1 session and nobody else.
#[tokio::test]
async fn fan_out_isolates_tenants() {
    let registry = SessionRegistry::new();
    let mut s1 = connect(&registry, "tenant-1", &["incidents"]);
    let mut s2 = connect(&registry, "tenant-2", &["incidents"]);

    let delivered = registry.fan_out(Channel::Incidents, &event("tenant-1"));
    assert_eq!(delivered, 1);

    let frame = s1.receiver.try_recv().unwrap();
    assert!(frame.contains("incident.created"));
    assert!(s2.receiver.try_recv().is_err());
    drop(s1.id);
}

/// Sessions without the channel in their set receive nothing.
#[tokio::test]
async fn fan_out_respects_subscriptions() {
    let registry = SessionRegistry::new();
    let mut subscribed = connect(&registry, "tenant-1", &["incidents"]);
    let mut unsubscribed = connect(&registry, "tenant-1", &["alerts"]);

    registry.fan_out(Channel::Incidents, &event("tenant-1"));
    assert!(subscribed.receiver.try_recv().is_ok());
    assert!(unsubscribed.receiver.try_recv().is_err());
}

/// Unsubscribing removes future deliveries.
#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let registry = SessionRegistry::new();
    let mut session = connect(&registry, "tenant-1", &["incidents", "alerts"]);

    registry.unsubscribe(&session.id, &["incidents".to_string()]);
    registry.fan_out(Channel::Incidents, &event("tenant-1"));
    assert!(session.receiver.try_recv().is_err());

    registry.fan_out(Channel::Alerts, &event("tenant-1"));
    assert!(session.receiver.try_recv().is_ok());
}

/// Events without a tenant are dropped entirely.
#[tokio::test]
async fn tenantless_events_are_dropped() {
    let registry = SessionRegistry::new();
    let mut session = connect(&registry, "", &["incidents"]);

    let delivered = registry.fan_out(Channel::Incidents, &event(""));
    assert_eq!(delivered, 0);
    assert!(session.receiver.try_recv().is_err());
}

/// A session whose receiver is gone is dropped on the next send.
#[tokio::test]
async fn dead_sessions_are_dropped_eagerly() {
    let registry = SessionRegistry::new();
    let session = connect(&registry, "tenant-1", &["incidents"]);
    assert_eq!(registry.connection_count(), 1);

    drop(session.receiver);
    let delivered = registry.fan_out(Channel::Incidents, &event("tenant-1"));
    assert_eq!(delivered, 0);
    assert_eq!(registry.connection_count(), 0);
}

/// Unregistering discards the session immediately.
#[tokio::test]
async fn unregister_discards_session() {
    let registry = SessionRegistry::new();
    let session = connect(&registry, "tenant-1", &["incidents"]);
    registry.unregister(&session.id);
    assert_eq!(registry.connection_count(), 0);
}
