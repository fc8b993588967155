// faultline-core/src/core/mod.rs
// ============================================================================
// Module: Faultline Core Types
// Description: Domain model shared across the control plane.
// Purpose: Group the canonical record types and their helpers.
// Dependencies: crate submodules
// ============================================================================

//! ## Overview
//! The core module holds the canonical domain model: identifiers, timestamps,
//! identity records, telemetry rows, error grouping, incidents, alerting
//! configuration, bus events, and sealed secrets. Everything here is plain
//! data plus deterministic helpers; I/O lives behind [`crate::interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod alerting;
pub mod errorgroup;
pub mod event;
pub mod hashing;
pub mod identifiers;
pub mod identity;
pub mod incident;
pub mod sealed;
pub mod telemetry;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use alerting::ActiveAlert;
pub use alerting::AlertCondition;
pub use alerting::AlertPolicy;
pub use alerting::AlertStatus;
pub use alerting::ChannelKind;
pub use alerting::CompareOp;
pub use alerting::MutingRule;
pub use alerting::NotificationChannel;
pub use errorgroup::ErrorEvent;
pub use errorgroup::ErrorGroup;
pub use errorgroup::ErrorOccurrence;
pub use errorgroup::TriageStatus;
pub use errorgroup::fingerprint;
pub use errorgroup::normalize_message;
pub use event::Channel;
pub use event::EventMessage;
pub use hashing::sha256_hex;
pub use identifiers::ActivityId;
pub use identifiers::AiRequestId;
pub use identifiers::AlertId;
pub use identifiers::ApiKeyId;
pub use identifiers::ChannelId;
pub use identifiers::ClientId;
pub use identifiers::ConditionId;
pub use identifiers::ConnectionId;
pub use identifiers::GroupId;
pub use identifiers::HypothesisId;
pub use identifiers::IncidentId;
pub use identifiers::PolicyId;
pub use identifiers::ProjectId;
pub use identifiers::RuleId;
pub use identifiers::StepId;
pub use identifiers::TenantId;
pub use identifiers::is_valid_uuid;
pub use identity::ApiKey;
pub use identity::IngestDomain;
pub use identity::Project;
pub use identity::Tenant;
pub use identity::WebhookConnection;
pub use identity::WebhookProvider;
pub use identity::digest_raw_key;
pub use identity::generate_raw_key;
pub use incident::Activity;
pub use incident::ActivityKind;
pub use incident::Actor;
pub use incident::AiRequest;
pub use incident::AiRequestKind;
pub use incident::AnalysisStep;
pub use incident::Hypothesis;
pub use incident::Incident;
pub use incident::IncidentSeverity;
pub use incident::IncidentState;
pub use incident::StepKind;
pub use incident::StepStatus;
pub use incident::seed_workflow;
pub use sealed::SealedBox;
pub use sealed::SealedError;
pub use sealed::mask_sensitive;
pub use telemetry::BrowserEvent;
pub use telemetry::Deployment;
pub use telemetry::HostSample;
pub use telemetry::LogEntry;
pub use telemetry::MetricKind;
pub use telemetry::MetricPoint;
pub use telemetry::ServiceRegistration;
pub use telemetry::Span;
pub use telemetry::Trace;
pub use telemetry::Transaction;
pub use telemetry::Vulnerability;
pub use time::TimeError;
pub use time::Timestamp;
