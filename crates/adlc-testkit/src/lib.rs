//! adlc-testkit
//!
//! Deterministic collaborators for exercising the lifecycle controller:
//! - [`ScriptedProvider`]: queue-driven provider that records every call.
//! - [`ManualClock`]: wall clock for cooldown accounting.
//! - [`CallbackRecorder`]: counts dismissals and collects rewards.
//! - [`LogCapture`]: asserts on log severity.
//! - [`Harness`]: a controller wired to all of the above.
//!
//! Cross-crate scenario tests live under `tests/`.

mod clock;
mod harness;
mod logs;
mod recorder;
mod scripted_provider;

pub use clock::ManualClock;
pub use harness::{
    open_flags, test_ads_config, test_config, Harness, HarnessBuilder, TEST_BANNER_UNIT,
    TEST_IDENTITY, TEST_INTERSTITIAL_UNIT, TEST_REWARDED_UNIT,
};
pub use logs::{CapturedLog, LogCapture};
pub use recorder::CallbackRecorder;
pub use scripted_provider::{LoadScript, ProviderCall, ScriptedProvider, ShowScript};
