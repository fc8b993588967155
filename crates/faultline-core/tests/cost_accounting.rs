// faultline-core/tests/cost_accounting.rs
// ============================================================================
// Module: Cost Accounting Tests
// Description: Token-to-USD derivation tests.
// Purpose: Pin the six-decimal cost law.
// Dependencies: faultline-core, proptest
// ============================================================================
//! Validates the cost law `in × P_in/1e6 + out × P_out/1e6` to six decimals.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use faultline_core::TokenPricing;
use faultline_core::cost_usd;
use proptest::prelude::*;

/// Default pricing used by the original deployment.
const PRICING: TokenPricing = TokenPricing { input_per_million: 0.150, output_per_million: 0.600 };

/// Verifies a known cost to six decimals.
#[test]
fn known_cost_to_six_decimals() {
    // 1 000 input at $0.15/M = 0.00015; 500 output at $0.60/M = 0.0003.
    let cost = cost_usd(1_000, 500, PRICING);
    assert!((cost - 0.000_45).abs() < 1e-12);
}

/// Zero tokens cost zero.
#[test]
fn zero_tokens_cost_zero() {
    assert_eq!(cost_usd(0, 0, PRICING), 0.0);
}

/// Million-token calls cost exactly the per-million prices.
#[test]
fn per_million_prices_are_exact() {
    let cost = cost_usd(1_000_000, 1_000_000, PRICING);
    assert!((cost - 0.75).abs() < 1e-12);
}

proptest! {
    /// Cost is always rounded to six decimal places.
    #[test]
    fn cost_has_six_decimal_precision(input in 0_u64..10_000_000, output in 0_u64..10_000_000) {
        let cost = cost_usd(input, output, PRICING);
        let scaled = cost * 1e6;
        prop_assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    /// Cost is monotone in both token counts.
    #[test]
    fn cost_is_monotone(input in 0_u64..1_000_000, output in 0_u64..1_000_000) {
        let base = cost_usd(input, output, PRICING);
        prop_assert!(cost_usd(input + 1_000, output, PRICING) >= base);
        prop_assert!(cost_usd(input, output + 1_000, PRICING) >= base);
    }
}
