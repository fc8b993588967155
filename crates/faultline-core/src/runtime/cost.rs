// faultline-core/src/runtime/cost.rs
// ============================================================================
// Module: Faultline Cost Accounting
// Description: Token-to-USD cost derivation for model calls.
// Purpose: Keep one cost law shared by AI request and analysis step rows.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Cost is derived from configured per-million token prices:
//! `input_tokens × P_in / 1e6 + output_tokens × P_out / 1e6`, rounded to six
//! decimal places. AI request rows and analysis step rows each compute their
//! own cost through this function; reconciliation between the two is a
//! query-time join.

// ============================================================================
// SECTION: Pricing
// ============================================================================

/// Per-million token prices in USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPricing {
    /// Price per one million input tokens.
    pub input_per_million: f64,
    /// Price per one million output tokens.
    pub output_per_million: f64,
}

/// Number of decimal places costs are rounded to.
const COST_DECIMALS: f64 = 1e6;

/// Computes the USD cost of a model call to six decimal places.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "Token counts are far below the f64 integer precision bound."
)]
pub fn cost_usd(input_tokens: u64, output_tokens: u64, pricing: TokenPricing) -> f64 {
    let raw = (input_tokens as f64) * pricing.input_per_million / 1e6
        + (output_tokens as f64) * pricing.output_per_million / 1e6;
    (raw * COST_DECIMALS).round() / COST_DECIMALS
}
