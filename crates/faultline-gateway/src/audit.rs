// faultline-gateway/src/audit.rs
// ============================================================================
// Module: Gateway Audit
// Description: JSON-line audit events for auth decisions.
// Purpose: Record allow/deny outcomes without leaking key material.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Security-relevant decisions (ingest key validation, JWT gating, webhook
//! signature checks) emit structured audit events through a pluggable sink.
//! The default sink writes one JSON object per line to stderr; tests use the
//! noop sink. Events carry digests and labels, never raw credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Auth audit event payload.
#[derive(Debug, Serialize)]
pub struct AuthAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome (`allow` or `deny`).
    decision: &'static str,
    /// Gated surface (`ingest`, `api`, `webhook`, `realtime`).
    surface: &'static str,
    /// Addressed resource label (domain, route, connection id).
    target: String,
    /// Caller label (key prefix, user id, provider) when known.
    subject: Option<String>,
    /// Failure reason for deny events.
    reason: Option<String>,
}

impl AuthAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(surface: &'static str, target: impl Into<String>, subject: Option<String>) -> Self {
        Self {
            event: "gateway_auth",
            decision: "allow",
            surface,
            target: target.into(),
            subject,
            reason: None,
        }
    }

    /// Builds a deny event.
    #[must_use]
    pub fn denied(
        surface: &'static str,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            event: "gateway_auth",
            decision: "deny",
            surface,
            target: target.into(),
            subject: None,
            reason: Some(reason.into()),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for auth decisions.
pub trait AuthAuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &AuthAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuthAuditSink for StderrAuditSink {
    fn record(&self, event: &AuthAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            #[allow(clippy::print_stderr, reason = "Audit stream is stderr by contract.")]
            {
                eprintln!("{payload}");
            }
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl AuthAuditSink for NoopAuditSink {
    fn record(&self, _event: &AuthAuditEvent) {}
}
