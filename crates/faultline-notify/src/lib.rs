// faultline-notify/src/lib.rs
// ============================================================================
// Module: Faultline Notify Library
// Description: Channel sinks and the policy-driven alert notifier.
// Purpose: Deliver alert notifications to external destinations.
// Dependencies: faultline-core, lettre, reqwest
// ============================================================================

//! ## Overview
//! This crate implements the [`faultline_core::interfaces::Notifier`] seam:
//! a sink per destination kind (Slack, Email, PagerDuty, Teams, generic
//! webhook) and a notifier that resolves a condition's policy channels,
//! evaluates muting rules, and fans out with per-channel failure isolation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod notifier;
pub mod sink;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use notifier::AlertNotifier;
pub use sink::ChannelSink;
pub use sink::SinkError;
pub use sink::email::EmailSink;
pub use sink::pagerduty::PagerdutySink;
pub use sink::slack::SlackSink;
pub use sink::teams::TeamsSink;
pub use sink::webhook::WebhookSink;
