//! adlc-lifecycle
//!
//! Per-kind unit lifecycle state machine and retry/backoff policy.
//!
//! - `UnitMachine` tracks `Absent -> Loading -> Ready -> Showing -> Absent`
//!   for one full-screen ad kind and tells the caller what to do next.
//! - `RetryState` computes the backoff delay after transient load failures.
//!
//! Pure deterministic logic: no IO, no clock, no scheduling. The runtime owns
//! timers, provider calls and logging; it feeds provider outcomes back in as
//! [`UnitEvent`]s and acts on the returned [`Step`].

mod retry;
mod state_machine;

pub use retry::{RetryPolicy, RetryState};
pub use state_machine::{Step, TransitionError, UnitEvent, UnitMachine, UnitState};
