// faultline-core/src/runtime/sli.rs
// ============================================================================
// Module: Faultline SLI Classification
// Description: Maps condition metric names onto raw or derived SLI sources.
// Purpose: Decide how the evaluator computes a condition's current value.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! A condition's `metric_name` either names a raw ingested metric or matches
//! one of the derived families: error rate (from transactions), latency (from
//! transaction durations), or CPU/memory (from host samples). Raw metrics are
//! tried first; the derived families are pattern fallbacks, matching the
//! original evaluation order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::interfaces::HostField;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Derived SLI families recognized by metric-name patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedSli {
    /// `100 × errored / total` transactions over the window.
    ErrorRate,
    /// Mean transaction duration over the window.
    Latency,
    /// Mean host sample field over the window.
    Host(HostField),
}

/// Classifies a metric name into a derived family, when it matches one.
///
/// Raw metric lookup always runs first; this fallback only applies when the
/// window held no raw samples under the name.
#[must_use]
pub fn classify_derived(metric_name: &str) -> Option<DerivedSli> {
    let name = metric_name.to_ascii_lowercase();
    if name.contains("error_rate") {
        Some(DerivedSli::ErrorRate)
    } else if name.contains("response_time") || name.contains("latency") {
        Some(DerivedSli::Latency)
    } else if name.contains("cpu") {
        Some(DerivedSli::Host(HostField::CpuPercent))
    } else if name.contains("memory") {
        Some(DerivedSli::Host(HostField::MemoryPercent))
    } else {
        None
    }
}
