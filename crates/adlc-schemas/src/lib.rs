//! adlc-schemas
//!
//! Shared vocabulary for every adlc crate: ad kinds, unit identifiers,
//! provider-owned handles, rewards, the load-failure taxonomy, and the
//! audience settings attached to every ad request.
//!
//! Nothing here performs IO. Handles are opaque: the controller stores and
//! returns them to the provider but never looks inside.

use std::fmt;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AdKind
// ---------------------------------------------------------------------------

/// Category of ad unit. Each kind has independent lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdKind {
    Interstitial,
    Rewarded,
    Banner,
}

impl AdKind {
    /// Kinds driven by the full-screen lifecycle state machine.
    pub const FULL_SCREEN: [AdKind; 2] = [AdKind::Interstitial, AdKind::Rewarded];

    pub const ALL: [AdKind; 3] = [AdKind::Interstitial, AdKind::Rewarded, AdKind::Banner];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdKind::Interstitial => "interstitial",
            AdKind::Rewarded => "rewarded",
            AdKind::Banner => "banner",
        }
    }

    /// `true` for kinds that carry a display cooldown (banner has none).
    pub fn has_cooldown(&self) -> bool {
        matches!(self, AdKind::Interstitial | AdKind::Rewarded)
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interstitial" => Ok(AdKind::Interstitial),
            "rewarded" => Ok(AdKind::Rewarded),
            "banner" => Ok(AdKind::Banner),
            other => Err(anyhow!(
                "invalid ad kind '{}'. expected one of: interstitial | rewarded | banner",
                other
            )),
        }
    }
}

impl fmt::Display for AdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identifiers and handles
// ---------------------------------------------------------------------------

/// Publisher id embedded in the vendor's public test unit identifiers.
pub const VENDOR_TEST_PUBLISHER: &str = "3940256099942544";

/// Provider-side unit identifier configured per kind.
///
/// A blank identifier is valid configuration and means "do not load this kind".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `true` when the identifier belongs to the vendor's public test inventory.
    pub fn is_vendor_test_unit(&self) -> bool {
        self.0.contains(VENDOR_TEST_PUBLISHER)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque provider-owned reference to a loaded, show-ready unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitHandle(String);

impl UnitHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Provider-defined token. Only provider adapters should interpret it.
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Caller-supplied display surface (the screen/window a full-screen unit
/// or banner is attached to).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(String);

impl SurfaceHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Identifies one show attempt. Provider callbacks echo it back so late
/// events from an earlier show can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShowTicket(pub Uuid);

impl ShowTicket {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShowTicket {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShowTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Reward
// ---------------------------------------------------------------------------

/// Reward granted by a rewarded unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub amount: i64,
    /// Provider-defined reward type label (e.g. `"minutes"`).
    pub kind: String,
}

impl Reward {
    pub fn new(amount: i64, kind: impl Into<String>) -> Self {
        Self {
            amount,
            kind: kind.into(),
        }
    }

    /// Synthetic reward granted when real ads are bypassed (ads disabled or
    /// privileged unlock).
    pub fn unlocked() -> Self {
        Self::new(0, "unlocked")
    }
}

// ---------------------------------------------------------------------------
// Load failure taxonomy
// ---------------------------------------------------------------------------

/// Stable classification of a provider load failure.
///
/// Provider adapters map vendor codes and messages into this taxonomy once;
/// the lifecycle state machine only ever sees the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Expected to resolve on retry without intervention.
    Transient,
    /// Any other failure. No automatic retry.
    Terminal,
    /// No inventory available right now. Not an error.
    NoFill,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Transient => "transient",
            FailureClass::Terminal => "terminal",
            FailureClass::NoFill => "no_fill",
        }
    }
}

/// A classified load failure as reported by a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub class: FailureClass,
    /// Vendor error code, when the vendor supplies one.
    pub code: Option<i64>,
    pub message: String,
}

impl LoadFailure {
    pub fn new(class: FailureClass, code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            class,
            code,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class == FailureClass::Transient
    }

    pub fn is_no_fill(&self) -> bool {
        self.class == FailureClass::NoFill
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(c) => write!(f, "{} load failure code={}: {}", self.class.as_str(), c, self.message),
            None => write!(f, "{} load failure: {}", self.class.as_str(), self.message),
        }
    }
}

impl std::error::Error for LoadFailure {}

// ---------------------------------------------------------------------------
// Request configuration
// ---------------------------------------------------------------------------

/// Highest content rating the provider may serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentRating {
    G,
    PG,
    T,
    MA,
}

impl ContentRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRating::G => "G",
            ContentRating::PG => "PG",
            ContentRating::T => "T",
            ContentRating::MA => "MA",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "G" => Ok(ContentRating::G),
            "PG" => Ok(ContentRating::PG),
            "T" => Ok(ContentRating::T),
            "MA" => Ok(ContentRating::MA),
            other => Err(anyhow!(
                "invalid content rating '{}'. expected one of: G | PG | T | MA",
                other
            )),
        }
    }
}

impl fmt::Display for ContentRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience settings applied to every request, handed to the provider at
/// initialisation.
///
/// The default is the child-safe profile: child-directed, under the age of
/// consent, general audiences only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfiguration {
    pub child_directed: bool,
    pub under_age_of_consent: bool,
    pub max_content_rating: ContentRating,
}

impl Default for RequestConfiguration {
    fn default() -> Self {
        Self {
            child_directed: true,
            under_age_of_consent: true,
            max_content_rating: ContentRating::G,
        }
    }
}
