// faultline-core/tests/operator.rs
// ============================================================================
// Module: Threshold Operator Tests
// Description: Comparison evaluation tests for alert conditions.
// Purpose: Ensure operators produce correct breach decisions.
// Dependencies: faultline-core
// ============================================================================
//! Validates threshold comparison behavior across all operators.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use faultline_core::CompareOp;
use faultline_core::runtime::operator::evaluate;

/// Verifies the strict ordering operators.
#[test]
fn strict_ordering_operators() {
    assert!(evaluate(CompareOp::Gt, 95.0, 90.0));
    assert!(!evaluate(CompareOp::Gt, 90.0, 90.0));
    assert!(evaluate(CompareOp::Lt, 60.0, 90.0));
    assert!(!evaluate(CompareOp::Lt, 90.0, 90.0));
}

/// Verifies the inclusive ordering operators at the boundary.
#[test]
fn inclusive_operators_at_boundary() {
    assert!(evaluate(CompareOp::Ge, 90.0, 90.0));
    assert!(evaluate(CompareOp::Le, 90.0, 90.0));
    assert!(!evaluate(CompareOp::Ge, 89.9, 90.0));
    assert!(!evaluate(CompareOp::Le, 90.1, 90.0));
}

/// Verifies equality operators compare exact values.
#[test]
fn equality_operators() {
    assert!(evaluate(CompareOp::Eq, 5.0, 5.0));
    assert!(!evaluate(CompareOp::Eq, 5.0, 5.5));
    assert!(evaluate(CompareOp::Ne, 5.0, 5.5));
    assert!(!evaluate(CompareOp::Ne, 5.0, 5.0));
}

/// Verifies operator symbols round-trip through parse.
#[test]
fn operator_symbols_round_trip() {
    for op in [CompareOp::Gt, CompareOp::Lt, CompareOp::Ge, CompareOp::Le, CompareOp::Eq, CompareOp::Ne]
    {
        assert_eq!(CompareOp::parse(op.as_str()), Some(op));
    }
    assert_eq!(CompareOp::parse("=>"), None);
}

/// Verifies operators serialize as their symbolic form.
#[test]
fn operator_serde_uses_symbols() {
    let json = serde_json::to_string(&CompareOp::Ge).unwrap();
    assert_eq!(json, "\">=\"");
    let parsed: CompareOp = serde_json::from_str("\"!=\"").unwrap();
    assert_eq!(parsed, CompareOp::Ne);
}
