// faultline-notify/tests/sink_tests.rs
// ============================================================================
// Module: Notification Sink Tests
// Description: Payload shape tests against a local HTTP listener.
// Purpose: Pin the exact bodies each destination receives.
// Dependencies: faultline-notify, faultline-core, tiny_http
// ============================================================================
//! Validates Slack, Teams, PagerDuty, and webhook payload shapes plus
//! incomplete-config rejection.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use std::io::Read;

use faultline_core::ActiveAlert;
use faultline_core::AlertId;
use faultline_core::AlertStatus;
use faultline_core::ConditionId;
use faultline_core::IncidentSeverity;
use faultline_core::ProjectId;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_notify::ChannelSink;
use faultline_notify::PagerdutySink;
use faultline_notify::SinkError;
use faultline_notify::SlackSink;
use faultline_notify::TeamsSink;
use faultline_notify::WebhookSink;
use serde_json::Value;
use serde_json::json;

/// A firing alert used across the sink tests.
fn alert() -> ActiveAlert {
    ActiveAlert {
        id: AlertId::new("alert-1"),
        tenant_id: TenantId::new("tenant-1"),
        project_id: ProjectId::new("project-1"),
        condition_id: ConditionId::new("condition-1"),
        title: "Alert: cpu watch".to_string(),
        description: "cpu_percent is > 90 (current: 95.00)".to_string(),
        severity: IncidentSeverity::Critical,
        status: AlertStatus::Firing,
        service_name: Some("checkout".to_string()),
        metric_value: Some(95.0),
        fired_at: Timestamp::now(),
        acknowledged_at: None,
        resolved_at: None,
    }
}

/// Runs one request through a local listener, returning the received body.
fn capture_body(server: tiny_http::Server) -> std::thread::JoinHandle<Value> {
    std::thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).unwrap();
        request.respond(tiny_http::Response::from_string("ok")).unwrap();
        serde_json::from_str(&body).unwrap()
    })
}

/// Slack deliveries carry a single markdown text field.
#[tokio::test]
async fn slack_payload_shape() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", server.server_addr());
    let handle = capture_body(server);

    let sink = SlackSink::new(reqwest::Client::new());
    sink.deliver(&json!({"webhook_url": url}), &alert()).await.unwrap();

    let body = handle.join().unwrap();
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("Alert: cpu watch"));
    assert!(text.contains("Severity: critical"));
    assert!(text.contains("Service: checkout"));
}

/// Teams deliveries carry a MessageCard with a severity theme color.
#[tokio::test]
async fn teams_payload_shape() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", server.server_addr());
    let handle = capture_body(server);

    let sink = TeamsSink::new(reqwest::Client::new());
    sink.deliver(&json!({"webhook_url": url}), &alert()).await.unwrap();

    let body = handle.join().unwrap();
    assert_eq!(body["@type"], "MessageCard");
    assert_eq!(body["themeColor"], "d32f2f");
    assert!(body["text"].as_str().unwrap().contains("**Severity:** critical"));
}

/// PagerDuty deliveries deduplicate by the alert id.
#[tokio::test]
async fn pagerduty_payload_dedups_by_alert_id() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}/v2/enqueue", server.server_addr());
    let handle = capture_body(server);

    let sink = PagerdutySink::with_endpoint(reqwest::Client::new(), url);
    sink.deliver(&json!({"routing_key": "pd-key"}), &alert()).await.unwrap();

    let body = handle.join().unwrap();
    assert_eq!(body["event_action"], "trigger");
    assert_eq!(body["dedup_key"], "alert-1");
    assert_eq!(body["payload"]["severity"], "critical");
    assert_eq!(body["payload"]["source"], "checkout");
}

/// Generic webhooks receive the flat alert document.
#[tokio::test]
async fn webhook_payload_shape() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", server.server_addr());
    let handle = capture_body(server);

    let sink = WebhookSink::new(reqwest::Client::new());
    sink.deliver(&json!({"url": url}), &alert()).await.unwrap();

    let body = handle.join().unwrap();
    assert_eq!(body["id"], "alert-1");
    assert_eq!(body["severity"], "critical");
    assert_eq!(body["status"], "firing");
    assert!((body["metric_value"].as_f64().unwrap() - 95.0).abs() < 1e-9);
}

/// Missing required configuration is rejected without a network call.
#[tokio::test]
async fn incomplete_config_is_rejected() {
    let sink = SlackSink::new(reqwest::Client::new());
    let result = sink.deliver(&json!({}), &alert()).await;
    assert!(matches!(result, Err(SinkError::ConfigIncomplete(_))));
}

/// A non-success destination status surfaces as a delivery failure.
#[tokio::test]
async fn destination_error_is_delivery_failure() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", server.server_addr());
    let handle = std::thread::spawn(move || {
        let request = server.recv().unwrap();
        request
            .respond(tiny_http::Response::from_string("no").with_status_code(500))
            .unwrap();
    });

    let sink = WebhookSink::new(reqwest::Client::new());
    let result = sink.deliver(&json!({"url": url}), &alert()).await;
    handle.join().unwrap();
    assert!(matches!(result, Err(SinkError::DeliveryFailed(_))));
}
