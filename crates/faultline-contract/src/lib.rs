// faultline-contract/src/lib.rs
// ============================================================================
// Module: Faultline Contract Library
// Description: Canonical wire contract for the Faultline control plane.
// Purpose: Single source of truth for envelopes, ingest bodies, and frames.
// Dependencies: faultline-core, serde
// ============================================================================

//! ## Overview
//! The contract crate defines every shape that crosses a process boundary:
//! the JSON success/error envelopes, agent-facing ingest batch bodies, the
//! incident API payloads, and the realtime WebSocket frame taxonomy. Handlers
//! depend on these types instead of redeclaring ad-hoc shapes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod envelope;
pub mod frames;
pub mod incidents;
pub mod ingest;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use envelope::ApiEnvelope;
pub use envelope::ErrorBody;
pub use envelope::ErrorCode;
pub use frames::CLOSE_POLICY_VIOLATION;
pub use frames::ClientFrame;
pub use frames::HANDSHAKE_TIMEOUT_SECS;
pub use frames::ServerFrame;
pub use incidents::AddCommentRequest;
pub use incidents::CreateIncidentRequest;
pub use incidents::GenerateHypothesesBatchRequest;
pub use incidents::GenerateHypothesesRequest;
pub use incidents::IncidentPage;
pub use incidents::UpdateSeverityRequest;
pub use incidents::UpdateStateRequest;
pub use ingest::BrowserBatch;
pub use ingest::BrowserEventIn;
pub use ingest::ErrorsBatch;
pub use ingest::HostSampleIn;
pub use ingest::InfrastructureBatch;
pub use ingest::IngestReceipt;
pub use ingest::LogIn;
pub use ingest::LogsBatch;
pub use ingest::MetricIn;
pub use ingest::MetricsBatch;
pub use ingest::SpanIn;
pub use ingest::TracesBatch;
pub use ingest::TransactionIn;
pub use ingest::TransactionsBatch;
pub use ingest::VulnerabilitiesBatch;
pub use ingest::VulnerabilityIn;
