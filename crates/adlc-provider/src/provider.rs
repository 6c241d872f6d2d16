//! Provider contract consumed by the lifecycle controller.
//!
//! Every operation is a named async call returning a tagged result; the
//! controller never registers nested callback objects with the provider.
//! Handles are opaque to the controller and only ever passed back here.

use std::fmt;
use std::sync::Arc;

use adlc_schemas::{
    AdKind, LoadFailure, RequestConfiguration, Reward, SurfaceHandle, UnitHandle, UnitId,
};
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from provider operations other than unit loads (loads report a
/// classified [`LoadFailure`] instead).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The SDK has not completed initialisation.
    NotInitialized,
    /// The SDK reported an error.
    Sdk { code: Option<i64>, message: String },
    /// A handle the provider does not recognise (already consumed or foreign).
    UnknownHandle(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::NotInitialized => write!(f, "provider not initialised"),
            ProviderError::Sdk {
                code: Some(c),
                message,
            } => write!(f, "provider sdk error code={c}: {message}"),
            ProviderError::Sdk {
                code: None,
                message,
            } => write!(f, "provider sdk error: {message}"),
            ProviderError::UnknownHandle(token) => write!(f, "unknown provider handle: {token}"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// Show outcome and reward delivery
// ---------------------------------------------------------------------------

/// How a full-screen show ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowOutcome {
    /// The user closed the unit.
    Dismissed,
    /// The provider could not present the unit.
    Failed(String),
}

/// Channel a provider uses to report a granted reward while a rewarded unit
/// is on screen.
///
/// Must be used before the show future resolves; rewards delivered after
/// the show has ended are ignored by the controller.
#[derive(Clone)]
pub struct RewardSink {
    deliver: Arc<dyn Fn(Reward) + Send + Sync>,
}

impl RewardSink {
    pub fn new(deliver: impl Fn(Reward) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// A sink that drops every reward (interstitial shows).
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    pub fn grant(&self, reward: Reward) {
        (self.deliver)(reward)
    }
}

impl fmt::Debug for RewardSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RewardSink")
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Ad-serving SDK contract.
///
/// Object-safe so the controller can hold an `Arc<dyn AdProvider>`.
/// `Send + Sync` because calls are issued from spawned tasks.
#[async_trait]
pub trait AdProvider: Send + Sync {
    /// Human-readable adapter name (e.g. `"scripted"`).
    fn name(&self) -> &'static str;

    /// Apply `request` to every subsequent ad request, then initialise the
    /// SDK. Resolves once the SDK reports it is ready.
    async fn initialize(&self, request: &RequestConfiguration) -> Result<(), ProviderError>;

    /// Load one full-screen unit. Failures must already be classified.
    async fn load_unit(&self, kind: AdKind, unit_id: &UnitId) -> Result<UnitHandle, LoadFailure>;

    /// Present a loaded unit on `surface`. Resolves when the unit is
    /// dismissed or fails to show. Rewards are reported through `rewards`
    /// before this resolves.
    async fn show(
        &self,
        handle: &UnitHandle,
        surface: &SurfaceHandle,
        rewards: RewardSink,
    ) -> ShowOutcome;

    /// Tag a loaded rewarded unit with the identity used for server-side
    /// reward verification.
    fn attach_verification(&self, handle: &UnitHandle, identity: &str) -> Result<(), ProviderError>;

    /// Create a passive banner display surface.
    async fn create_banner_surface(&self) -> Result<SurfaceHandle, ProviderError>;

    /// Load banner content into a surface created by
    /// [`create_banner_surface`](AdProvider::create_banner_surface).
    async fn load_banner(&self, surface: &SurfaceHandle, unit_id: &UnitId) -> Result<(), LoadFailure>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
