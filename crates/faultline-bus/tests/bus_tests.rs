// faultline-bus/tests/bus_tests.rs
// ============================================================================
// Module: Memory Bus Tests
// Description: Ordering and isolation tests for the in-process bus.
// Purpose: Ensure per-channel publish order and channel isolation.
// Dependencies: faultline-bus, faultline-core
// ============================================================================
//! Validates publish ordering, channel isolation, and late subscription.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use faultline_bus::MemoryBus;
use faultline_core::Channel;
use faultline_core::EventMessage;
use faultline_core::TenantId;
use faultline_core::interfaces::EventBus;
use serde_json::json;

/// Builds a message for the given tenant.
fn message(event_type: &str, tenant: &str) -> EventMessage {
    EventMessage::new(event_type, json!({"k": event_type}), TenantId::new(tenant))
}

/// Publish order per channel is preserved for a single producer.
#[tokio::test]
async fn per_channel_order_is_preserved() {
    let bus = MemoryBus::new();
    let mut receiver = bus.subscribe(Channel::Incidents);

    for index in 0..5 {
        bus.publish(Channel::Incidents, &message(&format!("event.{index}"), "t1")).unwrap();
    }
    for index in 0..5 {
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event_type, format!("event.{index}"));
    }
}

/// Messages on one channel never appear on another.
#[tokio::test]
async fn channels_are_isolated() {
    let bus = MemoryBus::new();
    let mut incidents = bus.subscribe(Channel::Incidents);
    let mut alerts = bus.subscribe(Channel::Alerts);

    bus.publish(Channel::Alerts, &message("alert.fired", "t1")).unwrap();
    let received = alerts.recv().await.unwrap();
    assert_eq!(received.event_type, "alert.fired");
    assert!(incidents.try_recv().is_err());
}

/// Publishing with no subscribers succeeds and drops the message.
#[test]
fn publish_without_subscribers_succeeds() {
    let bus = MemoryBus::new();
    assert!(bus.publish(Channel::System, &message("system.notice", "t1")).is_ok());
}

/// A late subscriber only sees messages published after subscribing.
#[tokio::test]
async fn late_subscribers_miss_earlier_messages() {
    let bus = MemoryBus::new();
    bus.publish(Channel::Hypotheses, &message("hypothesis.generated", "t1")).unwrap();

    let mut receiver = bus.subscribe(Channel::Hypotheses);
    bus.publish(Channel::Hypotheses, &message("hypothesis.generated.late", "t1")).unwrap();
    let received = receiver.recv().await.unwrap();
    assert_eq!(received.event_type, "hypothesis.generated.late");
}

/// `subscribe_all` yields one receiver per known channel.
#[test]
fn subscribe_all_covers_every_channel() {
    let bus = MemoryBus::new();
    let receivers = bus.subscribe_all();
    assert_eq!(receivers.len(), Channel::ALL.len());
}
