// faultline-core/tests/sealed_secrets.rs
// ============================================================================
// Module: Sealed Secret Tests
// Description: Authenticated-encryption round-trip and masking tests.
// Purpose: Ensure sealed config storage is tamper-evident and maskable.
// Dependencies: faultline-core
// ============================================================================
//! Validates seal/open round-trips, tamper rejection, and display masking.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use faultline_core::SealedBox;
use faultline_core::mask_sensitive;
use serde_json::json;

/// Sealing then opening any JSON document yields the input byte-identical.
#[test]
fn seal_open_round_trip_is_identity() {
    let sealed_box = SealedBox::from_master_key("unit-test-master-key");
    let config = json!({
        "webhook_url": "https://hooks.example.com/T000/B000",
        "smtp_port": 587,
        "to_emails": ["oncall@example.com"],
    });
    let bytes = serde_json::to_vec(&config).unwrap();
    let sealed = sealed_box.seal(&bytes).unwrap();
    assert_eq!(sealed_box.open(&sealed).unwrap(), bytes);
}

/// Two seals of the same plaintext differ (random nonce) but both open.
#[test]
fn sealing_is_randomized() {
    let sealed_box = SealedBox::from_master_key("unit-test-master-key");
    let first = sealed_box.seal(b"payload").unwrap();
    let second = sealed_box.seal(b"payload").unwrap();
    assert_ne!(first, second);
    assert_eq!(sealed_box.open(&first).unwrap(), b"payload");
    assert_eq!(sealed_box.open(&second).unwrap(), b"payload");
}

/// A flipped ciphertext byte fails authentication.
#[test]
fn tampered_payload_is_rejected() {
    let sealed_box = SealedBox::from_master_key("unit-test-master-key");
    let sealed = sealed_box.seal(b"payload").unwrap();
    let mut bytes = sealed.into_bytes();
    let last = bytes.len() - 1;
    bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();
    assert!(sealed_box.open(&tampered).is_err());
}

/// A different master key cannot open the payload.
#[test]
fn wrong_key_is_rejected() {
    let sealer = SealedBox::from_master_key("key-one");
    let opener = SealedBox::from_master_key("key-two");
    let sealed = sealer.seal(b"payload").unwrap();
    assert!(opener.open(&sealed).is_err());
}

/// JSON helpers round-trip structured values.
#[test]
fn seal_json_round_trip() {
    let sealed_box = SealedBox::from_master_key("unit-test-master-key");
    let value = json!({"routing_key": "pd-key", "nested": {"api_key": "k"}});
    let sealed = sealed_box.seal_json(&value).unwrap();
    assert_eq!(sealed_box.open_json(&sealed).unwrap(), value);
}

/// Display masking replaces sensitive keys recursively and keeps the rest.
#[test]
fn masking_replaces_sensitive_keys() {
    let config = json!({
        "webhook_url": "https://hooks.example.com/secret-path",
        "smtp_password": "hunter2",
        "smtp_host": "mail.example.com",
        "nested": {"routing_key": "pd-key", "label": "primary"},
    });
    let masked = mask_sensitive(&config);
    assert_eq!(masked["webhook_url"], "***");
    assert_eq!(masked["smtp_password"], "***");
    assert_eq!(masked["smtp_host"], "mail.example.com");
    assert_eq!(masked["nested"]["routing_key"], "***");
    assert_eq!(masked["nested"]["label"], "primary");
}
