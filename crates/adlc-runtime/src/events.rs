//! Event bus payloads and point-in-time snapshots.

use adlc_schemas::{AdKind, FailureClass, ShowTicket};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SdkPhase
// ---------------------------------------------------------------------------

/// Provider SDK readiness as seen by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkPhase {
    /// `init()` not called yet, or refused by the gate.
    NotStarted,
    /// Provider `initialize` in flight.
    Initializing,
    /// Provider reported initialised; waiting out the settle delay.
    Settling,
    Ready,
    /// Provider `initialize` failed. Loads stay deferred.
    Failed,
}

impl SdkPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SdkPhase::NotStarted => "not_started",
            SdkPhase::Initializing => "initializing",
            SdkPhase::Settling => "settling",
            SdkPhase::Ready => "ready",
            SdkPhase::Failed => "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleEvent: broadcast bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast by the controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Sdk {
        phase: SdkPhase,
    },
    InitSkipped {
        reason: String,
    },
    StateChanged {
        kind: AdKind,
        from: String,
        to: String,
    },
    LoadDeferred {
        kind: AdKind,
    },
    LoadRefused {
        kind: AdKind,
        reason: String,
    },
    LoadFailed {
        kind: AdKind,
        class: FailureClass,
        code: Option<i64>,
        message: String,
    },
    RetryScheduled {
        kind: AdKind,
        delay_ms: u64,
    },
    CooldownRecorded {
        kind: AdKind,
        at: DateTime<Utc>,
    },
    ShowRefused {
        kind: AdKind,
        reason: String,
    },
    ShowStarted {
        kind: AdKind,
        ticket: ShowTicket,
    },
    ShowEnded {
        kind: AdKind,
        ticket: ShowTicket,
        /// Provider failure reason; `None` when the user dismissed.
        failure: Option<String>,
    },
    RewardGranted {
        kind: AdKind,
        amount: i64,
        reward_type: String,
    },
    /// Reward substituted for a real ad (ads disabled or privileged unlock).
    FakeReward {
        kind: AdKind,
    },
    BannerCreated {
        surface: String,
    },
    BannerLoaded {
        surface: String,
    },
    BannerFailed {
        surface: String,
        message: String,
    },
    ProtocolViolation {
        detail: String,
    },
    ShutDown,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Point-in-time view of one full-screen kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSnapshot {
    pub kind: AdKind,
    /// "absent" | "loading" | "ready" | "showing"
    pub state: String,
    /// Delay the next transient failure would be retried after.
    pub retry_delay_ms: u64,
    pub retry_pending: bool,
    pub load_deferred: bool,
    pub cooldown_remaining_ms: u64,
}

impl KindSnapshot {
    pub fn is_ready(&self) -> bool {
        self.state == "ready"
    }

    pub fn is_loading(&self) -> bool {
        self.state == "loading"
    }
}

/// Point-in-time view of the whole controller, returned by `snapshot()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub sdk: SdkPhase,
    pub kinds: Vec<KindSnapshot>,
    pub banner_surfaces: usize,
    pub banner_loads_deferred: usize,
}

impl ControllerSnapshot {
    pub fn kind(&self, kind: AdKind) -> Option<&KindSnapshot> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}
