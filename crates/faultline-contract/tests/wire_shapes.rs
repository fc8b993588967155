// faultline-contract/tests/wire_shapes.rs
// ============================================================================
// Module: Wire Shape Tests
// Description: Serialization tests for envelopes and realtime frames.
// Purpose: Pin the exact JSON the platform emits and accepts.
// Dependencies: faultline-contract, serde_json
// ============================================================================
//! Validates envelope shapes, error codes, and the frame taxonomy.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use faultline_contract::ApiEnvelope;
use faultline_contract::ClientFrame;
use faultline_contract::ErrorBody;
use faultline_contract::ErrorCode;
use faultline_contract::ServerFrame;
use faultline_core::Timestamp;
use serde_json::json;

/// Success envelopes carry status, data, and total for lists.
#[test]
fn success_envelope_shape() {
    let envelope = ApiEnvelope::ok_with_total(vec![1, 2, 3], 42);
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["data"], json!([1, 2, 3]));
    assert_eq!(value["total"], 42);
    assert!(value.get("message").is_none());
}

/// Error envelopes carry the stable SCREAMING_SNAKE_CASE codes.
#[test]
fn error_envelope_shape() {
    let body = ErrorBody::new("project_id is required", ErrorCode::MissingProjectId);
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["status"], "error");
    assert_eq!(value["error_code"], "MISSING_PROJECT_ID");
    assert_eq!(value["detail"], "project_id is required");
}

/// Every error code serializes as its wire label.
#[test]
fn error_codes_match_labels() {
    for code in [
        ErrorCode::MissingProjectId,
        ErrorCode::MissingTenantId,
        ErrorCode::InvalidUuid,
        ErrorCode::MissingRequiredField,
        ErrorCode::InvalidFieldValue,
        ErrorCode::ResourceNotFound,
        ErrorCode::ValidationError,
        ErrorCode::Unauthorized,
        ErrorCode::ServiceUnavailable,
        ErrorCode::Conflict,
        ErrorCode::RateLimited,
    ] {
        let serialized = serde_json::to_value(code).unwrap();
        assert_eq!(serialized, code.as_str());
    }
}

/// The connect frame uses the camelCase tenant key clients send.
#[test]
fn connect_frame_parses_camel_case_tenant() {
    let frame: ClientFrame = serde_json::from_value(json!({
        "type": "connect",
        "token": "jwt-token",
        "tenantId": "tenant-1",
    }))
    .unwrap();
    assert_eq!(
        frame,
        ClientFrame::Connect { token: "jwt-token".to_string(), tenant_id: "tenant-1".to_string() }
    );
}

/// Subscribe/unsubscribe frames carry channel lists.
#[test]
fn subscription_frames_round_trip() {
    let frame: ClientFrame = serde_json::from_value(json!({
        "type": "subscribe",
        "channels": ["incidents", "alerts"],
    }))
    .unwrap();
    assert_eq!(
        frame,
        ClientFrame::Subscribe { channels: vec!["incidents".to_string(), "alerts".to_string()] }
    );

    let ack = ServerFrame::Subscribed {
        channels: vec!["incidents".to_string()],
        timestamp: Timestamp::now(),
    };
    let value = serde_json::to_value(&ack).unwrap();
    assert_eq!(value["type"], "subscribed");
    assert_eq!(value["channels"], json!(["incidents"]));
}

/// The connected frame exposes camelCase identifiers.
#[test]
fn connected_frame_uses_camel_case_keys() {
    let frame = ServerFrame::Connected {
        client_id: "user-7".to_string(),
        tenant_id: "tenant-1".to_string(),
        timestamp: Timestamp::now(),
    };
    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(value["type"], "connected");
    assert_eq!(value["clientId"], "user-7");
    assert_eq!(value["tenantId"], "tenant-1");
}

/// Unknown client frame types fail to parse.
#[test]
fn unknown_client_frames_are_rejected() {
    let result = serde_json::from_value::<ClientFrame>(json!({"type": "shout"}));
    assert!(result.is_err());
}
