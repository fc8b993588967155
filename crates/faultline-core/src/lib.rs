// faultline-core/src/lib.rs
// ============================================================================
// Module: Faultline Core Library
// Description: Public API surface for the Faultline core.
// Purpose: Expose core types, interfaces, and runtime engines.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Faultline core provides the domain model, backend-agnostic interfaces, and
//! deterministic runtime engines for a multi-tenant observability and
//! incident-management control plane. It is backend-agnostic and integrates
//! through explicit interfaces rather than embedding storage or transport
//! details.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::AlertStore;
pub use interfaces::BusError;
pub use interfaces::EnrichmentTrigger;
pub use interfaces::EventBus;
pub use interfaces::HostField;
pub use interfaces::IdentityStore;
pub use interfaces::IncidentFilter;
pub use interfaces::IncidentStats;
pub use interfaces::IncidentStore;
pub use interfaces::KvCache;
pub use interfaces::LatencyPercentiles;
pub use interfaces::ModelClient;
pub use interfaces::ModelError;
pub use interfaces::ModelRequest;
pub use interfaces::ModelResponse;
pub use interfaces::ModelUsage;
pub use interfaces::NoopNotifier;
pub use interfaces::NoopTrigger;
pub use interfaces::Notifier;
pub use interfaces::StoreError;
pub use interfaces::TelemetryStore;
pub use runtime::AlertEvaluator;
pub use runtime::BatchOutcome;
pub use runtime::EnrichmentError;
pub use runtime::GenerationOutcome;
pub use runtime::HypothesisEngine;
pub use runtime::IncidentOrchestrator;
pub use runtime::NewIncident;
pub use runtime::OrchestratorError;
pub use runtime::TickSummary;
pub use runtime::TokenPricing;
pub use runtime::cost_usd;
