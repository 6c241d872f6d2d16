//! Scenario: backoff driven through the unit state machine.
//!
//! # Invariants under test
//! - Consecutive transient failures schedule 2s, 4s, 8s, 16s, 30s, 30s.
//! - The stored delay never leaves `[floor, ceiling]`.
//! - A terminal or no-fill failure resets the delay to the floor and schedules nothing.
//! - A success resets the delay to the floor.

use std::time::Duration;

use adlc_lifecycle::{RetryPolicy, Step, UnitEvent, UnitMachine};
use adlc_schemas::{AdKind, FailureClass, UnitHandle};

fn fail_transient(m: &mut UnitMachine) -> Duration {
    assert_eq!(m.apply(UnitEvent::LoadRequested).unwrap(), Step::IssueLoad);
    match m.apply(UnitEvent::LoadFailed(FailureClass::Transient)).unwrap() {
        Step::RetryAfter(d) => d,
        other => panic!("expected RetryAfter, got {other:?}"),
    }
}

#[test]
fn transient_sequence_doubles_to_ceiling() {
    let policy = RetryPolicy::default();
    let mut m = UnitMachine::new(AdKind::Rewarded, policy);

    let delays: Vec<u64> = (0..6).map(|_| fail_transient(&mut m).as_secs()).collect();
    assert_eq!(delays, vec![2, 4, 8, 16, 30, 30]);
    assert!(m.retry().current() <= policy.ceiling());
    assert!(m.is_absent());
}

#[test]
fn terminal_failure_resets_and_does_not_retry() {
    let mut m = UnitMachine::new(AdKind::Interstitial, RetryPolicy::default());
    fail_transient(&mut m);
    fail_transient(&mut m);
    assert_eq!(m.retry().current(), Duration::from_secs(8));

    m.apply(UnitEvent::LoadRequested).unwrap();
    let step = m.apply(UnitEvent::LoadFailed(FailureClass::Terminal)).unwrap();
    assert_eq!(step, Step::Settled(FailureClass::Terminal));
    assert_eq!(m.retry().current(), Duration::from_secs(2));

    // The next transient failure starts again from the floor.
    assert_eq!(fail_transient(&mut m), Duration::from_secs(2));
}

#[test]
fn success_after_backoff_resets_to_floor() {
    let mut m = UnitMachine::new(AdKind::Rewarded, RetryPolicy::default());
    for _ in 0..4 {
        fail_transient(&mut m);
    }
    m.apply(UnitEvent::LoadRequested).unwrap();
    m.apply(UnitEvent::LoadSucceeded(UnitHandle::new("u"))).unwrap();
    assert_eq!(m.retry().current(), Duration::from_secs(2));
}

#[test]
fn custom_policy_bounds_are_respected() {
    let policy = RetryPolicy::new(Duration::from_millis(500), Duration::from_millis(1800));
    let mut m = UnitMachine::new(AdKind::Interstitial, policy);
    let delays: Vec<u128> = (0..4).map(|_| fail_transient(&mut m).as_millis()).collect();
    assert_eq!(delays, vec![500, 1000, 1800, 1800]);
}
