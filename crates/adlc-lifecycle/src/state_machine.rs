//! Unit lifecycle state machine
//!
//! # Design
//!
//! One [`UnitMachine`] per full-screen ad kind. Every provider outcome and
//! caller request is applied via [`UnitMachine::apply`], which enforces:
//!
//! 1. **Legal transitions only.** An event delivered in a state where it has
//!    no meaning returns [`TransitionError`]. The provider is externally
//!    controlled and may race, so callers log and ignore these; state is left
//!    untouched.
//! 2. **Idempotent load requests.** `LoadRequested` while `Loading`, `Ready`
//!    or `Showing` is a silent [`Step::Noop`], so at most one provider load is
//!    ever in flight per kind.
//! 3. **Ticketed show sessions.** Show callbacks carry the [`ShowTicket`]
//!    issued at `ShowRequested`; a callback for any other ticket is illegal.
//!
//! # State diagram
//!
//! ```text
//!   LoadRequested        LoadSucceeded        ShowRequested
//! Absent ─────────► Loading ─────────► Ready ─────────► Showing
//!   ▲                  │                                  │
//!   │   LoadFailed     │   Discarded     │ ShowDismissed |  │
//!   │                  │                 │ ShowFailed       │
//!   └──────────────────┴─────────────────┴──────────────────┘
//! ```
//!
//! Gate, cooldown, unit-id and surface checks happen before an event is
//! applied; the machine only knows about unit state and backoff.

use std::time::Duration;

use adlc_schemas::{AdKind, FailureClass, ShowTicket, UnitHandle};

use crate::{RetryPolicy, RetryState};

// ---------------------------------------------------------------------------
// UnitState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    /// No unit held and no load in flight.
    Absent,
    /// One provider load in flight.
    Loading,
    /// A loaded unit is waiting to be shown.
    Ready(UnitHandle),
    /// The unit has been handed to the provider for display.
    Showing {
        handle: UnitHandle,
        ticket: ShowTicket,
        /// Set once a reward has been delivered for this session.
        rewarded: bool,
    },
}

impl UnitState {
    pub fn name(&self) -> &'static str {
        match self {
            UnitState::Absent => "absent",
            UnitState::Loading => "loading",
            UnitState::Ready(_) => "ready",
            UnitState::Showing { .. } => "showing",
        }
    }
}

// ---------------------------------------------------------------------------
// UnitEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitEvent {
    /// A load was requested and has passed the gate and unit-id checks.
    LoadRequested,
    LoadSucceeded(UnitHandle),
    LoadFailed(FailureClass),
    /// A show was requested and has passed the gate and cooldown checks.
    ShowRequested(ShowTicket),
    ShowDismissed(ShowTicket),
    ShowFailed(ShowTicket),
    RewardGranted(ShowTicket),
    /// The ready unit cannot be presented (no display surface). Drop it.
    Discarded,
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// What the caller must do after a successful [`UnitMachine::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do.
    Noop,
    /// `Absent -> Loading`: issue exactly one provider load.
    IssueLoad,
    /// `Loading -> Ready`: the unit is available; backoff was reset.
    Readied,
    /// `Loading -> Absent` on a transient failure: schedule a retry after the
    /// given delay. Backoff has already advanced.
    RetryAfter(Duration),
    /// `Loading -> Absent` on a no-fill or terminal failure: no retry,
    /// backoff was reset.
    Settled(FailureClass),
    /// `Ready -> Showing`: record the cooldown and hand the unit to the
    /// provider.
    IssueShow(UnitHandle),
    /// Show requested without a ready unit. The caller dismisses at once and
    /// nudges a load. `loading` reports whether one is already in flight.
    NotReady { loading: bool },
    /// `Showing -> Absent`: dismiss exactly once and reload.
    ShowEnded,
    /// First reward of the current session: deliver it.
    Rewarded,
    /// `Ready -> Absent`: the unit was dropped. Dismiss and reload.
    Dropped,
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

/// Returned when an event cannot legally be applied in the current state.
///
/// Protocol violation: log and ignore. State is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub kind: AdKind,
    /// Name of the state the unit was in when the event arrived.
    pub from: &'static str,
    /// Debug string of the rejected event.
    pub event: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "illegal {} unit transition: {} + {}",
            self.kind, self.from, self.event
        )
    }
}

impl std::error::Error for TransitionError {}

// ---------------------------------------------------------------------------
// UnitMachine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UnitMachine {
    kind: AdKind,
    state: UnitState,
    retry: RetryState,
}

impl UnitMachine {
    /// Starts `Absent` with backoff at the floor.
    pub fn new(kind: AdKind, policy: RetryPolicy) -> Self {
        Self {
            kind,
            state: UnitState::Absent,
            retry: RetryState::new(policy),
        }
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    pub fn retry(&self) -> &RetryState {
        &self.retry
    }

    pub fn is_absent(&self) -> bool {
        matches!(self.state, UnitState::Absent)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, UnitState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, UnitState::Ready(_))
    }

    pub fn is_showing(&self) -> bool {
        matches!(self.state, UnitState::Showing { .. })
    }

    /// Ticket of the current show session, if any.
    pub fn current_ticket(&self) -> Option<ShowTicket> {
        match &self.state {
            UnitState::Showing { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    /// Apply an event.
    ///
    /// # Errors
    /// [`TransitionError`] when the event is illegal in the current state.
    /// The machine is left unchanged.
    pub fn apply(&mut self, event: UnitEvent) -> Result<Step, TransitionError> {
        use UnitEvent::*;

        let step = match (&mut self.state, &event) {
            // ------------------------------------------------------------------
            // Load
            // ------------------------------------------------------------------
            (UnitState::Absent, LoadRequested) => {
                self.state = UnitState::Loading;
                Step::IssueLoad
            }
            (UnitState::Loading | UnitState::Ready(_) | UnitState::Showing { .. }, LoadRequested) => {
                Step::Noop
            }

            (UnitState::Loading, LoadSucceeded(handle)) => {
                self.state = UnitState::Ready(handle.clone());
                self.retry.reset();
                Step::Readied
            }

            (UnitState::Loading, LoadFailed(class)) => {
                self.state = UnitState::Absent;
                match class {
                    FailureClass::Transient => Step::RetryAfter(self.retry.on_transient_failure()),
                    FailureClass::NoFill | FailureClass::Terminal => {
                        self.retry.reset();
                        Step::Settled(*class)
                    }
                }
            }

            // ------------------------------------------------------------------
            // Show
            // ------------------------------------------------------------------
            (UnitState::Ready(handle), ShowRequested(ticket)) => {
                let handle = handle.clone();
                self.state = UnitState::Showing {
                    handle: handle.clone(),
                    ticket: *ticket,
                    rewarded: false,
                };
                Step::IssueShow(handle)
            }
            (UnitState::Absent, ShowRequested(_)) => Step::NotReady { loading: false },
            (UnitState::Loading, ShowRequested(_)) => Step::NotReady { loading: true },
            // A second show while one is on screen is refused like a missing unit.
            (UnitState::Showing { .. }, ShowRequested(_)) => Step::NotReady { loading: false },

            (UnitState::Showing { ticket, .. }, ShowDismissed(t) | ShowFailed(t))
                if *ticket == *t =>
            {
                self.state = UnitState::Absent;
                Step::ShowEnded
            }

            (
                UnitState::Showing {
                    ticket, rewarded, ..
                },
                RewardGranted(t),
            ) if *ticket == *t && !*rewarded && self.kind == AdKind::Rewarded => {
                *rewarded = true;
                Step::Rewarded
            }

            (UnitState::Ready(_), Discarded) => {
                self.state = UnitState::Absent;
                Step::Dropped
            }

            // ------------------------------------------------------------------
            // Everything else is illegal.
            // ------------------------------------------------------------------
            (state, ev) => {
                return Err(TransitionError {
                    kind: self.kind,
                    from: state.name(),
                    event: format!("{ev:?}"),
                });
            }
        };

        Ok(step)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
