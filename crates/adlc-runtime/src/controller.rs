//! Public handle to the lifecycle controller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use adlc_cooldown::{Clock, CooldownStore};
use adlc_gate::{FlagSource, GateRefusal};
use adlc_provider::{AdProvider, IdentitySource};
use adlc_schemas::{AdKind, Reward, ShowTicket, SurfaceHandle};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::actor::{Actor, Msg};
use crate::{ControllerConfig, ControllerSnapshot, KindSnapshot, LifecycleEvent};

/// Invoked exactly once when a show request ends without a reward-only path.
pub type DismissCallback = Box<dyn FnOnce() + Send + 'static>;

/// Invoked at most once with the granted reward.
pub type RewardCallback = Box<dyn FnOnce(Reward) + Send + 'static>;

const EVENT_BUS_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// External collaborators injected at construction.
#[derive(Clone)]
pub struct ControllerDeps {
    pub provider: Arc<dyn AdProvider>,
    pub flags: Arc<dyn FlagSource>,
    pub identity: Arc<dyn IdentitySource>,
    pub cooldown_store: Arc<dyn CooldownStore>,
    pub clock: Arc<dyn Clock>,
}

// ---------------------------------------------------------------------------
// Show request / decision
// ---------------------------------------------------------------------------

/// Arguments of one `request_show` call.
pub struct ShowRequest {
    pub kind: AdKind,
    pub parent_facing: bool,
    /// Skip the cooldown check. The gate still applies.
    pub force_show: bool,
    /// Display surface the unit is presented on. Required for a real show.
    pub surface: Option<SurfaceHandle>,
    pub on_dismissed: DismissCallback,
    pub on_reward: Option<RewardCallback>,
}

impl ShowRequest {
    pub fn new(kind: AdKind, parent_facing: bool, on_dismissed: impl FnOnce() + Send + 'static) -> Self {
        Self {
            kind,
            parent_facing,
            force_show: false,
            surface: None,
            on_dismissed: Box::new(on_dismissed),
            on_reward: None,
        }
    }

    pub fn force(mut self, force_show: bool) -> Self {
        self.force_show = force_show;
        self
    }

    pub fn with_surface(mut self, surface: SurfaceHandle) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_reward(mut self, on_reward: impl FnOnce(Reward) + Send + 'static) -> Self {
        self.on_reward = Some(Box::new(on_reward));
        self
    }
}

impl std::fmt::Debug for ShowRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowRequest")
            .field("kind", &self.kind)
            .field("parent_facing", &self.parent_facing)
            .field("force_show", &self.force_show)
            .field("surface", &self.surface)
            .field("has_reward_callback", &self.on_reward.is_some())
            .finish()
    }
}

/// Why a show request was dismissed without reaching the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissReason {
    /// Ads are bypassed (disabled or unlocked) and no reward callback was given.
    Bypassed(GateRefusal),
    Refused(GateRefusal),
    CoolingDown { remaining: Duration },
    /// No ready unit. A load was nudged; `loading` says whether one was
    /// already in flight.
    NotReady { loading: bool },
    MissingSurface,
    UnsupportedKind,
    ShutDown,
}

/// Outcome of `request_show`, known once the controller has decided.
///
/// When the decision is `Dismissed` or `FakeReward` the corresponding
/// callback has already run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowDecision {
    /// Handed to the provider. Callbacks follow when the show ends.
    Started(ShowTicket),
    FakeReward,
    Dismissed(DismissReason),
}

// ---------------------------------------------------------------------------
// AdController
// ---------------------------------------------------------------------------

/// Handle to a running controller actor.
///
/// Must be created inside a tokio runtime. Dropping the handle shuts the
/// actor down without waiting for it.
pub struct AdController {
    tx: mpsc::UnboundedSender<Msg>,
    bus: broadcast::Sender<LifecycleEvent>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AdController {
    pub fn new(config: ControllerConfig, deps: ControllerDeps) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (bus, _rx) = broadcast::channel(EVENT_BUS_CAPACITY);
        let actor = Actor::new(config, deps, tx.clone(), bus.clone());
        let join = tokio::spawn(actor.run(rx));
        Self {
            tx,
            bus,
            join: Mutex::new(Some(join)),
        }
    }

    /// Start provider initialisation (gate permitting). Idempotent.
    pub fn init(&self) {
        self.send(Msg::Init);
    }

    /// Stop the actor. Pending timers are aborted and any show still on
    /// screen gets its dismissal callback. Idempotent.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        self.send(Msg::Shutdown { reply: Some(reply) });
        let _ = done.await;
        let join = self.join.lock().ok().and_then(|mut j| j.take());
        if let Some(join) = join {
            let _ = join.await;
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.bus.subscribe()
    }

    /// Fire-and-forget load request for a full-screen kind.
    pub fn request_load(&self, kind: AdKind, parent_facing: bool) {
        self.send(Msg::Load {
            kind,
            parent_facing,
        });
    }

    /// Ask to show a unit. Never waits for the ad itself: resolves as soon as
    /// the controller has either handed the unit to the provider or
    /// dismissed the request.
    pub async fn request_show(&self, req: ShowRequest) -> ShowDecision {
        let (reply, decision) = oneshot::channel();
        if let Err(mpsc::error::SendError(msg)) = self.tx.send(Msg::Show { req, reply }) {
            if let Msg::Show { req, .. } = msg {
                debug!(kind = %req.kind, "show requested after shutdown; dismissing");
                (req.on_dismissed)();
            }
            return ShowDecision::Dismissed(DismissReason::ShutDown);
        }
        decision
            .await
            .unwrap_or(ShowDecision::Dismissed(DismissReason::ShutDown))
    }

    pub async fn is_ready(&self, kind: AdKind) -> bool {
        self.query(kind).await.is_some_and(|k| k.is_ready())
    }

    pub async fn is_loading(&self, kind: AdKind) -> bool {
        self.query(kind).await.is_some_and(|k| k.is_loading())
    }

    pub async fn cooldown_remaining(&self, kind: AdKind) -> Duration {
        self.query(kind)
            .await
            .map(|k| Duration::from_millis(k.cooldown_remaining_ms))
            .unwrap_or(Duration::ZERO)
    }

    /// Create a banner surface if the gate allows it. The banner's single
    /// load is issued once the SDK is ready.
    pub async fn create_banner_surface(&self, parent_facing: bool) -> Option<SurfaceHandle> {
        let (reply, surface) = oneshot::channel();
        self.send(Msg::CreateBanner {
            parent_facing,
            reply,
        });
        surface.await.ok().flatten()
    }

    /// `None` once the controller has shut down.
    pub async fn snapshot(&self) -> Option<ControllerSnapshot> {
        let (reply, snap) = oneshot::channel();
        self.send(Msg::Snapshot { reply });
        snap.await.ok()
    }

    async fn query(&self, kind: AdKind) -> Option<KindSnapshot> {
        self.snapshot().await?.kind(kind).cloned()
    }

    fn send(&self, msg: Msg) {
        if self.tx.send(msg).is_err() {
            debug!("controller already shut down; message dropped");
        }
    }
}

impl Drop for AdController {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown { reply: None });
    }
}

impl std::fmt::Debug for AdController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdController")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
