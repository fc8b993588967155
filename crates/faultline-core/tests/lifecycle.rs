// faultline-core/tests/lifecycle.rs
// ============================================================================
// Module: Incident Lifecycle Tests
// Description: State machine and workflow seeding tests.
// Purpose: Ensure transitions follow the lifecycle graph exactly.
// Dependencies: faultline-core
// ============================================================================
//! Validates the incident state machine and the five-step workflow seed.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

mod common;

use faultline_core::IncidentState;
use faultline_core::StepKind;
use faultline_core::StepStatus;
use faultline_core::Timestamp;
use faultline_core::seed_workflow;

/// Every state's successor set matches the lifecycle table.
#[test]
fn transition_table_matches_lifecycle() {
    use IncidentState::*;
    let cases: [(IncidentState, &[IncidentState]); 6] = [
        (Detected, &[Investigating, Acknowledged]),
        (Investigating, &[Acknowledged, Mitigated, Resolved]),
        (Acknowledged, &[Mitigated, Resolved]),
        (Mitigated, &[Resolved]),
        (Resolved, &[Closed]),
        (Closed, &[]),
    ];
    for (state, successors) in cases {
        assert_eq!(state.successors(), successors, "successors of {}", state.as_str());
    }
}

/// Illegal moves are rejected, including everything out of `closed`.
#[test]
fn illegal_transitions_are_rejected() {
    use IncidentState::*;
    assert!(!Resolved.can_transition_to(Investigating));
    assert!(!Mitigated.can_transition_to(Acknowledged));
    assert!(!Detected.can_transition_to(Resolved));
    for target in [Detected, Investigating, Acknowledged, Mitigated, Resolved, Closed] {
        assert!(!Closed.can_transition_to(target));
    }
}

/// Every state except `detected` is reachable from `detected`.
#[test]
fn all_states_reachable_from_detected() {
    use IncidentState::*;
    let mut reached = vec![Detected];
    let mut frontier = vec![Detected];
    while let Some(state) = frontier.pop() {
        for next in state.successors() {
            if !reached.contains(next) {
                reached.push(*next);
                frontier.push(*next);
            }
        }
    }
    for state in [Detected, Investigating, Acknowledged, Mitigated, Resolved, Closed] {
        assert!(reached.contains(&state), "{} unreachable", state.as_str());
    }
}

/// State labels round-trip through parse.
#[test]
fn state_labels_round_trip() {
    use IncidentState::*;
    for state in [Detected, Investigating, Acknowledged, Mitigated, Resolved, Closed] {
        assert_eq!(IncidentState::parse(state.as_str()), Some(state));
    }
    assert_eq!(IncidentState::parse("open"), None);
}

/// The workflow seed produces five steps with the intake statuses.
#[test]
fn workflow_seed_shape() {
    let incident = common::incident("project-1");
    let now = Timestamp::now();
    let steps = seed_workflow(&incident, now);

    assert_eq!(steps.len(), 5);
    let expected = [
        (StepKind::AlertReceived, 1, StepStatus::Completed),
        (StepKind::SourceIdentified, 2, StepStatus::Completed),
        (StepKind::PlatformDetails, 3, StepStatus::Completed),
        (StepKind::LogsFetched, 4, StepStatus::InProgress),
        (StepKind::HypothesisGenerated, 5, StepStatus::Pending),
    ];
    for (step, (kind, number, status)) in steps.iter().zip(expected) {
        assert_eq!(step.kind, kind);
        assert_eq!(step.step_number, number);
        assert_eq!(step.status, status);
        assert_eq!(step.incident_id, incident.id);
        let input = step.input.as_ref().unwrap();
        assert_eq!(input["service_name"], "checkout");
    }
    // Completed steps carry both stamps; the pending step carries neither.
    assert!(steps[0].completed_at.is_some());
    assert!(steps[3].started_at.is_some());
    assert!(steps[3].completed_at.is_none());
    assert!(steps[4].started_at.is_none());
}

/// Step completion stamps duration from the start stamp.
#[test]
fn step_completion_stamps_duration() {
    let incident = common::incident("project-1");
    let start = Timestamp::now();
    let mut step = seed_workflow(&incident, start).pop().unwrap();
    step.start(start);
    let end = Timestamp::parse(&start.to_rfc3339()).unwrap();
    step.complete(end, None);
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.duration_ms, Some(0));
}

/// Step failure records the message and terminal status.
#[test]
fn step_failure_records_message() {
    let incident = common::incident("project-1");
    let now = Timestamp::now();
    let mut step = seed_workflow(&incident, now).pop().unwrap();
    step.start(now);
    step.fail(now, "provider unreachable");
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.error_message.as_deref(), Some("provider unreachable"));
}
