// faultline-store-sqlite/src/lib.rs
// ============================================================================
// Module: Faultline SQLite Store Library
// Description: Durable store behind every repository interface.
// Purpose: Persist all Faultline entities with tenant/project isolation.
// Dependencies: faultline-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate implements [`faultline_core::interfaces::IdentityStore`],
//! [`faultline_core::interfaces::TelemetryStore`],
//! [`faultline_core::interfaces::AlertStore`], and
//! [`faultline_core::interfaces::IncidentStore`] over a single `SQLite`
//! database in WAL mode. Every read is scoped by project; structural
//! invariants (unique slugs, unique key digests, at most one firing alert
//! per condition, cascade ownership) live in the schema itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod alerting;
mod identity;
mod incident;
pub mod store;
mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
