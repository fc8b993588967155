// faultline-bus/src/lib.rs
// ============================================================================
// Module: Faultline Bus Library
// Description: In-process event bus and TTL cache implementations.
// Purpose: Provide the L0 bus and cache seams for single-process deployments.
// Dependencies: faultline-core, tokio
// ============================================================================

//! ## Overview
//! This crate implements the core [`faultline_core::interfaces::EventBus`]
//! and [`faultline_core::interfaces::KvCache`] seams in process memory. Both
//! are constructed once at startup and shared by `Arc`; swapping in an
//! external broker or cache is a matter of implementing the same traits.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bus;
pub mod cache;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bus::MemoryBus;
pub use cache::MemoryKvCache;
