// faultline-core/src/runtime/mod.rs
// ============================================================================
// Module: Faultline Runtime
// Description: Deterministic engines driving alerting, incidents, and AI
//              enrichment through the interface seams.
// Purpose: Group the trait-driven runtime engines.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime engines contain the control-plane logic: the alert evaluator, the
//! incident orchestrator, and the hypothesis engine. They perform no I/O of
//! their own; every effect goes through [`crate::interfaces`], so the engines
//! are exercised in tests with in-memory fakes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cost;
pub mod enrichment;
pub mod evaluator;
pub mod operator;
pub mod orchestrator;
pub mod sli;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cost::TokenPricing;
pub use cost::cost_usd;
pub use enrichment::BatchOutcome;
pub use enrichment::EnrichmentError;
pub use enrichment::GENERATION_LOCK_TTL;
pub use enrichment::GenerationOutcome;
pub use enrichment::HypothesisCandidate;
pub use enrichment::HypothesisEngine;
pub use enrichment::MAX_BATCH_SIZE;
pub use enrichment::MAX_HYPOTHESES;
pub use enrichment::generation_lock_key;
pub use enrichment::parse_candidates;
pub use evaluator::AlertEvaluator;
pub use evaluator::TickSummary;
pub use operator::evaluate;
pub use orchestrator::IncidentOrchestrator;
pub use orchestrator::NewIncident;
pub use orchestrator::OrchestratorError;
pub use sli::DerivedSli;
pub use sli::classify_derived;
