//! Scenario: provider callbacks in unexpected states.
//!
//! # Invariants under test
//! - Every out-of-state callback returns `TransitionError` and leaves state untouched.
//! - Duplicate load requests never produce a second `IssueLoad`.
//! - A late callback from a finished show session cannot end the next session.

use adlc_lifecycle::{RetryPolicy, Step, UnitEvent, UnitMachine, UnitState};
use adlc_schemas::{AdKind, FailureClass, ShowTicket, UnitHandle};

#[test]
fn callbacks_while_absent_are_rejected() {
    let mut m = UnitMachine::new(AdKind::Interstitial, RetryPolicy::default());
    let t = ShowTicket::new();
    for ev in [
        UnitEvent::LoadSucceeded(UnitHandle::new("x")),
        UnitEvent::LoadFailed(FailureClass::Transient),
        UnitEvent::ShowDismissed(t),
        UnitEvent::ShowFailed(t),
        UnitEvent::RewardGranted(t),
    ] {
        let err = m.apply(ev).unwrap_err();
        assert_eq!(err.from, "absent");
        assert_eq!(m.state(), &UnitState::Absent);
    }
}

#[test]
fn many_load_requests_issue_one_load() {
    let mut m = UnitMachine::new(AdKind::Rewarded, RetryPolicy::default());
    let issued = (0..5)
        .map(|_| m.apply(UnitEvent::LoadRequested).unwrap())
        .filter(|s| *s == Step::IssueLoad)
        .count();
    assert_eq!(issued, 1);
}

#[test]
fn late_dismiss_from_previous_session_is_rejected() {
    let mut m = UnitMachine::new(AdKind::Interstitial, RetryPolicy::default());
    m.apply(UnitEvent::LoadRequested).unwrap();
    m.apply(UnitEvent::LoadSucceeded(UnitHandle::new("a"))).unwrap();
    let first = ShowTicket::new();
    m.apply(UnitEvent::ShowRequested(first)).unwrap();
    m.apply(UnitEvent::ShowDismissed(first)).unwrap();

    m.apply(UnitEvent::LoadRequested).unwrap();
    m.apply(UnitEvent::LoadSucceeded(UnitHandle::new("b"))).unwrap();
    let second = ShowTicket::new();
    m.apply(UnitEvent::ShowRequested(second)).unwrap();

    assert!(m.apply(UnitEvent::ShowFailed(first)).is_err());
    assert_eq!(m.current_ticket(), Some(second));
    assert_eq!(m.apply(UnitEvent::ShowFailed(second)).unwrap(), Step::ShowEnded);
}
