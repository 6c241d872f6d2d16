//! adlc-gate
//!
//! Gate Evaluator: decides from externally supplied flags whether an ad
//! operation may proceed at all.
//!
//! Rules, first match wins:
//! 1. privileged unlock      -> deny every real ad operation
//! 2. ads disabled           -> deny every operation, SDK initialisation included
//! 3. parent-facing-gated op outside a parent-facing context -> deny
//! 4. otherwise allow
//!
//! Pure deterministic logic. No IO, no clock. Flags are sampled by the caller
//! at call time through a [`FlagSource`]; nothing here caches them.

mod engine;
mod flags;
mod types;

pub use engine::{allowed, evaluate};
pub use flags::{FlagSource, SharedFlags, StaticFlags};
pub use types::*;
