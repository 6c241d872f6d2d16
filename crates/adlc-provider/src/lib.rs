//! adlc-provider
//!
//! Boundary between the lifecycle controller and an ad-serving SDK.
//!
//! This crate defines **only** the contracts a vendor adapter implements and
//! the helpers it uses to speak the controller's vocabulary:
//! - [`AdProvider`]: initialise, load, show, verification tagging, banner surfaces.
//! - [`RewardSink`]: how a provider reports a granted reward during a show.
//! - [`IdentitySource`]: identity used to tag rewarded verification requests.
//! - [`SignatureClassifier`]: maps vendor codes and messages into the
//!   transient / terminal / no-fill taxonomy, once, at the adapter.
//!
//! No concrete vendor SDK lives here.

mod classifier;
mod identity;
mod provider;

pub use classifier::{FailureClassifier, SignatureClassifier};
pub use identity::{identity_tag, AnonymousIdentity, FixedIdentity, IdentitySource, ANONYMOUS_IDENTITY};
pub use provider::{AdProvider, ProviderError, RewardSink, ShowOutcome};
