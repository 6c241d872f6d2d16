//! adlc-runtime
//!
//! Lifecycle controller: owns every kind's unit state, backoff and cooldown,
//! and the banner supervisor, behind a single serialized actor task.
//!
//! # Execution model
//! - [`AdController`] is a cheap handle. Every public call becomes a message
//!   on one mpsc channel; the actor applies them strictly in order.
//! - Provider calls run in spawned tasks and report back as messages, so
//!   provider callbacks never mutate state off the actor.
//! - Retry and SDK-settle waits are `tokio::time` sleeps in spawned tasks
//!   whose abort handles the actor keeps; a fired retry is a no-op unless the
//!   kind is still `Absent`.
//! - Observers subscribe to [`LifecycleEvent`]s on a broadcast bus.

mod actor;
mod banner;
mod config;
mod controller;
mod events;

pub use config::ControllerConfig;
pub use controller::{
    AdController, ControllerDeps, DismissCallback, DismissReason, RewardCallback, ShowDecision,
    ShowRequest,
};
pub use events::{ControllerSnapshot, KindSnapshot, LifecycleEvent, SdkPhase};
