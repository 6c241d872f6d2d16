//! The serialized controller task.
//!
//! Every mutation of unit state, backoff, cooldown and SDK readiness happens
//! here, one message at a time. Provider calls and timers run in spawned
//! tasks that report back through `tx`.

use std::collections::BTreeMap;
use std::time::Duration;

use adlc_cooldown::CooldownTracker;
use adlc_gate::{evaluate, GateFlags, GateVerdict, Operation};
use adlc_lifecycle::{Step, TransitionError, UnitEvent, UnitMachine};
use adlc_provider::{identity_tag, ProviderError, RewardSink, ShowOutcome};
use adlc_schemas::{
    AdKind, FailureClass, LoadFailure, Reward, ShowTicket, SurfaceHandle, UnitHandle, UnitId,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::banner::BannerSupervisor;
use crate::controller::{
    ControllerDeps, DismissCallback, DismissReason, RewardCallback, ShowDecision, ShowRequest,
};
use crate::{ControllerConfig, ControllerSnapshot, KindSnapshot, LifecycleEvent, SdkPhase};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub(crate) enum Msg {
    // Caller commands.
    Init,
    Load {
        kind: AdKind,
        parent_facing: bool,
    },
    Show {
        req: ShowRequest,
        reply: oneshot::Sender<ShowDecision>,
    },
    CreateBanner {
        parent_facing: bool,
        reply: oneshot::Sender<Option<SurfaceHandle>>,
    },
    Snapshot {
        reply: oneshot::Sender<ControllerSnapshot>,
    },
    Shutdown {
        reply: Option<oneshot::Sender<()>>,
    },

    // Provider results and timers.
    ProviderInitialized(Result<(), ProviderError>),
    SettleElapsed,
    LoadFinished {
        kind: AdKind,
        result: Result<UnitHandle, LoadFailure>,
    },
    RetryFired {
        kind: AdKind,
        parent_facing: bool,
    },
    RewardGranted {
        kind: AdKind,
        ticket: ShowTicket,
        reward: Reward,
    },
    ShowFinished {
        kind: AdKind,
        ticket: ShowTicket,
        outcome: ShowOutcome,
    },
    BannerSurfaceCreated {
        result: Result<SurfaceHandle, ProviderError>,
        reply: oneshot::Sender<Option<SurfaceHandle>>,
    },
    BannerLoadFinished {
        surface: SurfaceHandle,
        result: Result<(), LoadFailure>,
    },
}

struct ShowSession {
    ticket: ShowTicket,
    parent_facing: bool,
    on_dismissed: Option<DismissCallback>,
    on_reward: Option<RewardCallback>,
}

impl ShowSession {
    fn dismiss(&mut self) {
        if let Some(cb) = self.on_dismissed.take() {
            cb();
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

pub(crate) struct Actor {
    config: ControllerConfig,
    deps: ControllerDeps,
    tx: mpsc::UnboundedSender<Msg>,
    bus: broadcast::Sender<LifecycleEvent>,

    sdk: SdkPhase,
    machines: BTreeMap<AdKind, UnitMachine>,
    cooldown: CooldownTracker,
    /// At most one parked load per kind, with its parent-facing flag.
    deferred_loads: BTreeMap<AdKind, bool>,
    /// Parent-facing flag of the load in flight, reused for its retry.
    load_context: BTreeMap<AdKind, bool>,
    retry_timers: BTreeMap<AdKind, JoinHandle<()>>,
    settle_timer: Option<JoinHandle<()>>,
    sessions: BTreeMap<AdKind, ShowSession>,
    banner: BannerSupervisor,
}

impl Actor {
    pub(crate) fn new(
        config: ControllerConfig,
        deps: ControllerDeps,
        tx: mpsc::UnboundedSender<Msg>,
        bus: broadcast::Sender<LifecycleEvent>,
    ) -> Self {
        let machines = AdKind::FULL_SCREEN
            .into_iter()
            .map(|k| (k, UnitMachine::new(k, config.retry)))
            .collect();
        let cooldown = CooldownTracker::with_background_writes(deps.cooldown_store.clone());
        Self {
            config,
            deps,
            tx,
            bus,
            sdk: SdkPhase::NotStarted,
            machines,
            cooldown,
            deferred_loads: BTreeMap::new(),
            load_context: BTreeMap::new(),
            retry_timers: BTreeMap::new(),
            settle_timer: None,
            sessions: BTreeMap::new(),
            banner: BannerSupervisor::default(),
        }
    }

    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Msg>) {
        while let Some(msg) = rx.recv().await {
            if let Msg::Shutdown { reply } = msg {
                self.shutdown();
                rx.close();
                while let Ok(late) = rx.try_recv() {
                    Self::reject_after_shutdown(late);
                }
                self.cooldown.close().await;
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
                return;
            }
            self.handle(msg);
        }
        self.cooldown.close().await;
    }

    fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Init => self.init(),
            Msg::Load {
                kind,
                parent_facing,
            } => self.request_load(kind, parent_facing),
            Msg::Show { req, reply } => {
                let decision = self.request_show(req);
                let _ = reply.send(decision);
            }
            Msg::CreateBanner {
                parent_facing,
                reply,
            } => self.create_banner(parent_facing, reply),
            Msg::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Msg::Shutdown { .. } => {}

            Msg::ProviderInitialized(result) => self.on_provider_initialized(result),
            Msg::SettleElapsed => self.on_settle_elapsed(),
            Msg::LoadFinished { kind, result } => self.on_load_finished(kind, result),
            Msg::RetryFired {
                kind,
                parent_facing,
            } => self.on_retry_fired(kind, parent_facing),
            Msg::RewardGranted {
                kind,
                ticket,
                reward,
            } => self.on_reward_granted(kind, ticket, reward),
            Msg::ShowFinished {
                kind,
                ticket,
                outcome,
            } => self.on_show_finished(kind, ticket, outcome),
            Msg::BannerSurfaceCreated { result, reply } => {
                self.on_banner_surface_created(result, reply)
            }
            Msg::BannerLoadFinished { surface, result } => {
                self.on_banner_load_finished(surface, result)
            }
        }
    }

    // -----------------------------------------------------------------------
    // SDK readiness
    // -----------------------------------------------------------------------

    fn init(&mut self) {
        if !matches!(self.sdk, SdkPhase::NotStarted | SdkPhase::Failed) {
            debug!(phase = self.sdk.as_str(), "init already started");
            return;
        }
        if let Some(hash) = &self.config.config_hash {
            info!(config_hash = %hash, "ads config in effect");
        }
        for kind in &self.config.test_unit_mismatch {
            warn!(kind = %kind, unit_id = %self.config.units.for_kind(*kind), "unit id does not match test/production mode");
        }
        if let GateVerdict::Deny(refusal) = evaluate(&self.flags(false), Operation::Initialize) {
            info!(reason = %refusal, "ads bypassed; provider not initialised");
            self.publish(LifecycleEvent::InitSkipped {
                reason: refusal.to_string(),
            });
            return;
        }

        self.set_sdk(SdkPhase::Initializing);
        let provider = self.deps.provider.clone();
        let tx = self.tx.clone();
        let request = self.config.request;
        info!(
            provider = provider.name(),
            child_directed = request.child_directed,
            under_age_of_consent = request.under_age_of_consent,
            max_content_rating = %request.max_content_rating,
            "initialising provider"
        );
        tokio::spawn(async move {
            let result = provider.initialize(&request).await;
            let _ = tx.send(Msg::ProviderInitialized(result));
        });
    }

    fn on_provider_initialized(&mut self, result: Result<(), ProviderError>) {
        if self.sdk != SdkPhase::Initializing {
            self.violation(format!("provider initialised while {}", self.sdk.as_str()));
            return;
        }
        match result {
            Ok(()) => {
                self.set_sdk(SdkPhase::Settling);
                let settle = self.config.init_settle;
                let tx = self.tx.clone();
                debug!(settle_ms = settle.as_millis() as u64, "provider initialised; settling");
                self.settle_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(settle).await;
                    let _ = tx.send(Msg::SettleElapsed);
                }));
            }
            Err(e) => {
                error!(error = %e, "provider initialisation failed; loads stay deferred");
                self.set_sdk(SdkPhase::Failed);
            }
        }
    }

    fn on_settle_elapsed(&mut self) {
        self.settle_timer = None;
        if self.sdk != SdkPhase::Settling {
            return;
        }
        self.set_sdk(SdkPhase::Ready);
        info!("provider ready");

        for (kind, parent_facing) in std::mem::take(&mut self.deferred_loads) {
            debug!(kind = %kind, "releasing deferred load");
            self.request_load(kind, parent_facing);
        }
        for surface in self.banner.take_deferred() {
            self.load_banner(surface);
        }
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    fn request_load(&mut self, kind: AdKind, parent_facing: bool) {
        if !self.machines.contains_key(&kind) {
            warn!(kind = %kind, "load requested for a kind without a lifecycle; use create_banner_surface");
            return;
        }
        if let GateVerdict::Deny(refusal) = evaluate(&self.flags(parent_facing), Operation::Load(kind)) {
            debug!(kind = %kind, reason = %refusal, "load refused by gate");
            self.publish(LifecycleEvent::LoadRefused {
                kind,
                reason: refusal.to_string(),
            });
            return;
        }
        let unit_id = self.config.units.for_kind(kind).clone();
        if unit_id.is_blank() {
            warn!(kind = %kind, "unit id is blank; load aborted");
            self.publish(LifecycleEvent::LoadRefused {
                kind,
                reason: "blank unit id".to_string(),
            });
            return;
        }
        if self.sdk != SdkPhase::Ready {
            if !self.deferred_loads.contains_key(&kind) {
                self.deferred_loads.insert(kind, parent_facing);
                debug!(kind = %kind, phase = self.sdk.as_str(), "provider not ready; load deferred");
                self.publish(LifecycleEvent::LoadDeferred { kind });
            }
            return;
        }

        match self.apply(kind, UnitEvent::LoadRequested) {
            Ok(Step::IssueLoad) => {
                self.load_context.insert(kind, parent_facing);
                self.spawn_load(kind, unit_id);
            }
            Ok(_) => debug!(kind = %kind, "load already in flight or unit held"),
            Err(e) => self.transition_violation(e),
        }
    }

    fn spawn_load(&self, kind: AdKind, unit_id: UnitId) {
        let provider = self.deps.provider.clone();
        let tx = self.tx.clone();
        debug!(kind = %kind, unit_id = %unit_id, "load issued");
        tokio::spawn(async move {
            let result = provider.load_unit(kind, &unit_id).await;
            let _ = tx.send(Msg::LoadFinished { kind, result });
        });
    }

    fn on_load_finished(&mut self, kind: AdKind, result: Result<UnitHandle, LoadFailure>) {
        let parent_facing = self.load_context.remove(&kind).unwrap_or(false);
        match result {
            Ok(handle) => {
                let loading = self.machines.get(&kind).is_some_and(|m| m.is_loading());
                if kind == AdKind::Rewarded && loading {
                    let tag = identity_tag(self.deps.identity.as_ref());
                    if let Err(e) = self.deps.provider.attach_verification(&handle, &tag) {
                        warn!(kind = %kind, error = %e, "verification tag not attached");
                    }
                }
                match self.apply(kind, UnitEvent::LoadSucceeded(handle)) {
                    Ok(_) => info!(kind = %kind, "unit ready"),
                    Err(e) => self.transition_violation(e),
                }
            }
            Err(failure) => match self.apply(kind, UnitEvent::LoadFailed(failure.class)) {
                Ok(step) => {
                    self.publish(LifecycleEvent::LoadFailed {
                        kind,
                        class: failure.class,
                        code: failure.code,
                        message: failure.message.clone(),
                    });
                    match step {
                        Step::RetryAfter(delay) => {
                            warn!(
                                kind = %kind,
                                code = ?failure.code,
                                error = %failure.message,
                                delay_ms = delay.as_millis() as u64,
                                "transient load failure; retry scheduled"
                            );
                            self.schedule_retry(kind, delay, parent_facing);
                        }
                        Step::Settled(FailureClass::NoFill) => {
                            info!(kind = %kind, code = ?failure.code, "no fill; next request starts a fresh load");
                        }
                        _ => {
                            error!(kind = %kind, code = ?failure.code, error = %failure.message, "load failed; not retrying");
                        }
                    }
                }
                Err(e) => self.transition_violation(e),
            },
        }
    }

    fn schedule_retry(&mut self, kind: AdKind, delay: Duration, parent_facing: bool) {
        let tx = self.tx.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Msg::RetryFired {
                kind,
                parent_facing,
            });
        });
        if let Some(previous) = self.retry_timers.insert(kind, timer) {
            previous.abort();
        }
        self.publish(LifecycleEvent::RetryScheduled {
            kind,
            delay_ms: delay.as_millis() as u64,
        });
    }

    fn on_retry_fired(&mut self, kind: AdKind, parent_facing: bool) {
        self.retry_timers.remove(&kind);
        if self.machines.get(&kind).is_some_and(|m| m.is_absent()) {
            debug!(kind = %kind, "retry firing");
            self.request_load(kind, parent_facing);
        } else {
            debug!(kind = %kind, "retry voided; unit no longer absent");
        }
    }

    // -----------------------------------------------------------------------
    // Show
    // -----------------------------------------------------------------------

    fn request_show(&mut self, req: ShowRequest) -> ShowDecision {
        let ShowRequest {
            kind,
            parent_facing,
            force_show,
            surface,
            on_dismissed,
            on_reward,
        } = req;

        if !self.machines.contains_key(&kind) {
            warn!(kind = %kind, "show requested for a kind without a lifecycle");
            on_dismissed();
            return ShowDecision::Dismissed(DismissReason::UnsupportedKind);
        }

        if let GateVerdict::Deny(refusal) = evaluate(&self.flags(parent_facing), Operation::Show(kind)) {
            if refusal.bypasses_ads() {
                if let Some(on_reward) = on_reward {
                    info!(kind = %kind, reason = %refusal, "ads bypassed; granting reward");
                    self.publish(LifecycleEvent::FakeReward { kind });
                    on_reward(Reward::unlocked());
                    return ShowDecision::FakeReward;
                }
                debug!(kind = %kind, reason = %refusal, "ads bypassed; dismissing");
                on_dismissed();
                return ShowDecision::Dismissed(DismissReason::Bypassed(refusal));
            }
            debug!(kind = %kind, reason = %refusal, "show refused by gate");
            self.publish(LifecycleEvent::ShowRefused {
                kind,
                reason: refusal.to_string(),
            });
            on_dismissed();
            return ShowDecision::Dismissed(DismissReason::Refused(refusal));
        }

        if !force_show {
            let remaining = self
                .cooldown
                .remaining(kind, self.deps.clock.now(), self.config.cooldown_window);
            if !remaining.is_zero() {
                info!(kind = %kind, remaining_ms = remaining.as_millis() as u64, "show refused; cooling down");
                self.publish(LifecycleEvent::ShowRefused {
                    kind,
                    reason: format!("cooldown {}ms remaining", remaining.as_millis()),
                });
                on_dismissed();
                return ShowDecision::Dismissed(DismissReason::CoolingDown { remaining });
            }
        }

        let ready = self.machines.get(&kind).is_some_and(|m| m.is_ready());
        if ready && surface.is_none() {
            self.violation(format!("{kind} show requested without a display surface"));
            // Back to Absent; the dropped unit is replaced by a fresh load.
            match self.apply(kind, UnitEvent::Discarded) {
                Ok(_) => self.request_load(kind, parent_facing),
                Err(e) => self.transition_violation(e),
            }
            on_dismissed();
            return ShowDecision::Dismissed(DismissReason::MissingSurface);
        }

        let ticket = ShowTicket::new();
        match (self.apply(kind, UnitEvent::ShowRequested(ticket)), surface) {
            (Ok(Step::IssueShow(handle)), Some(surface)) => {
                self.start_show(kind, ticket, handle, surface, parent_facing, on_dismissed, on_reward);
                ShowDecision::Started(ticket)
            }
            (Ok(Step::NotReady { loading }), _) => {
                debug!(kind = %kind, loading, "no ready unit; dismissing and nudging a load");
                self.request_load(kind, parent_facing);
                on_dismissed();
                ShowDecision::Dismissed(DismissReason::NotReady { loading })
            }
            (Ok(step), _) => {
                self.violation(format!("{kind} show produced unexpected step {step:?}"));
                on_dismissed();
                ShowDecision::Dismissed(DismissReason::NotReady { loading: false })
            }
            (Err(e), _) => {
                self.transition_violation(e);
                on_dismissed();
                ShowDecision::Dismissed(DismissReason::NotReady { loading: false })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn start_show(
        &mut self,
        kind: AdKind,
        ticket: ShowTicket,
        handle: UnitHandle,
        surface: SurfaceHandle,
        parent_facing: bool,
        on_dismissed: DismissCallback,
        on_reward: Option<RewardCallback>,
    ) {
        // Cooldown counts from the show attempt, not its completion.
        let now = self.deps.clock.now();
        self.cooldown.record_shown(kind, now);
        self.publish(LifecycleEvent::CooldownRecorded { kind, at: now });

        self.sessions.insert(
            kind,
            ShowSession {
                ticket,
                parent_facing,
                on_dismissed: Some(on_dismissed),
                on_reward,
            },
        );

        let rewards = if kind == AdKind::Rewarded {
            let tx = self.tx.clone();
            RewardSink::new(move |reward| {
                let _ = tx.send(Msg::RewardGranted {
                    kind,
                    ticket,
                    reward,
                });
            })
        } else {
            RewardSink::discard()
        };

        let provider = self.deps.provider.clone();
        let tx = self.tx.clone();
        info!(kind = %kind, %ticket, "show started");
        self.publish(LifecycleEvent::ShowStarted { kind, ticket });
        tokio::spawn(async move {
            let outcome = provider.show(&handle, &surface, rewards).await;
            let _ = tx.send(Msg::ShowFinished {
                kind,
                ticket,
                outcome,
            });
        });
    }

    fn on_reward_granted(&mut self, kind: AdKind, ticket: ShowTicket, reward: Reward) {
        match self.apply(kind, UnitEvent::RewardGranted(ticket)) {
            Ok(Step::Rewarded) => {
                info!(kind = %kind, amount = reward.amount, reward_type = %reward.kind, "reward granted");
                self.publish(LifecycleEvent::RewardGranted {
                    kind,
                    amount: reward.amount,
                    reward_type: reward.kind.clone(),
                });
                let cb = self
                    .sessions
                    .get_mut(&kind)
                    .filter(|s| s.ticket == ticket)
                    .and_then(|s| s.on_reward.take());
                if let Some(cb) = cb {
                    cb(reward);
                }
            }
            Ok(step) => self.violation(format!("{kind} reward produced unexpected step {step:?}")),
            Err(e) => self.transition_violation(e),
        }
    }

    fn on_show_finished(&mut self, kind: AdKind, ticket: ShowTicket, outcome: ShowOutcome) {
        let event = match &outcome {
            ShowOutcome::Dismissed => UnitEvent::ShowDismissed(ticket),
            ShowOutcome::Failed(_) => UnitEvent::ShowFailed(ticket),
        };
        match self.apply(kind, event) {
            Ok(Step::ShowEnded) => {
                let failure = match outcome {
                    ShowOutcome::Dismissed => {
                        info!(kind = %kind, %ticket, "show dismissed");
                        None
                    }
                    ShowOutcome::Failed(reason) => {
                        error!(kind = %kind, %ticket, error = %reason, "show failed");
                        Some(reason)
                    }
                };
                self.publish(LifecycleEvent::ShowEnded {
                    kind,
                    ticket,
                    failure,
                });
                let parent_facing = match self.sessions.remove(&kind) {
                    Some(mut session) => {
                        session.dismiss();
                        session.parent_facing
                    }
                    None => true,
                };
                self.request_load(kind, parent_facing);
            }
            Ok(step) => self.violation(format!("{kind} show end produced unexpected step {step:?}")),
            Err(e) => self.transition_violation(e),
        }
    }

    // -----------------------------------------------------------------------
    // Banner
    // -----------------------------------------------------------------------

    fn create_banner(&mut self, parent_facing: bool, reply: oneshot::Sender<Option<SurfaceHandle>>) {
        if let GateVerdict::Deny(refusal) = evaluate(&self.flags(parent_facing), Operation::CreateBanner) {
            debug!(reason = %refusal, "banner refused by gate");
            let _ = reply.send(None);
            return;
        }
        let provider = self.deps.provider.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = provider.create_banner_surface().await;
            let _ = tx.send(Msg::BannerSurfaceCreated { result, reply });
        });
    }

    fn on_banner_surface_created(
        &mut self,
        result: Result<SurfaceHandle, ProviderError>,
        reply: oneshot::Sender<Option<SurfaceHandle>>,
    ) {
        let surface = match result {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "banner surface not created");
                let _ = reply.send(None);
                return;
            }
        };
        info!(surface = surface.token(), "banner surface created");
        self.publish(LifecycleEvent::BannerCreated {
            surface: surface.token().to_string(),
        });
        let _ = reply.send(Some(surface.clone()));

        let ready = self.sdk == SdkPhase::Ready;
        match self.banner.surface_created(surface, ready) {
            Some(s) => self.load_banner(s),
            None => debug!("provider not ready; banner load deferred"),
        }
    }

    fn load_banner(&mut self, surface: SurfaceHandle) {
        // The surface was created in a parent-facing context; only the
        // build/runtime mode can have changed since.
        if let GateVerdict::Deny(refusal) =
            evaluate(&self.flags(true), Operation::Load(AdKind::Banner))
        {
            debug!(surface = surface.token(), reason = %refusal, "banner load refused by gate");
            return;
        }
        let unit_id = self.config.units.banner.clone();
        if unit_id.is_blank() {
            warn!(surface = surface.token(), "banner unit id is blank; load aborted");
            self.publish(LifecycleEvent::BannerFailed {
                surface: surface.token().to_string(),
                message: "blank unit id".to_string(),
            });
            return;
        }
        let provider = self.deps.provider.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = provider.load_banner(&surface, &unit_id).await;
            let _ = tx.send(Msg::BannerLoadFinished { surface, result });
        });
    }

    fn on_banner_load_finished(&mut self, surface: SurfaceHandle, result: Result<(), LoadFailure>) {
        match result {
            Ok(()) => {
                info!(surface = surface.token(), "banner loaded");
                self.publish(LifecycleEvent::BannerLoaded {
                    surface: surface.token().to_string(),
                });
            }
            Err(failure) => {
                match failure.class {
                    FailureClass::NoFill => {
                        info!(surface = surface.token(), "banner no fill")
                    }
                    FailureClass::Transient => {
                        warn!(surface = surface.token(), error = %failure, "banner load failed")
                    }
                    FailureClass::Terminal => {
                        error!(surface = surface.token(), error = %failure, "banner load failed")
                    }
                }
                self.publish(LifecycleEvent::BannerFailed {
                    surface: surface.token().to_string(),
                    message: failure.to_string(),
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    fn shutdown(&mut self) {
        for (_, timer) in std::mem::take(&mut self.retry_timers) {
            timer.abort();
        }
        if let Some(timer) = self.settle_timer.take() {
            timer.abort();
        }
        self.deferred_loads.clear();
        for (kind, mut session) in std::mem::take(&mut self.sessions) {
            debug!(kind = %kind, ticket = %session.ticket, "dismissing show on shutdown");
            session.dismiss();
        }
        info!("controller shut down");
        self.publish(LifecycleEvent::ShutDown);
    }

    /// Answer a message that arrived after shutdown was processed.
    fn reject_after_shutdown(msg: Msg) {
        match msg {
            Msg::Show { req, reply } => {
                (req.on_dismissed)();
                let _ = reply.send(ShowDecision::Dismissed(DismissReason::ShutDown));
            }
            Msg::CreateBanner { reply, .. } | Msg::BannerSurfaceCreated { reply, .. } => {
                let _ = reply.send(None);
            }
            Msg::Shutdown { reply: Some(reply) } => {
                let _ = reply.send(());
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Current flags with the caller's parent-facing context.
    fn flags(&self, parent_facing: bool) -> GateFlags {
        GateFlags {
            is_parent_facing_context: parent_facing,
            ..self.deps.flags.current()
        }
    }

    /// Apply an event to `kind`'s machine and publish any state change.
    fn apply(&mut self, kind: AdKind, event: UnitEvent) -> Result<Step, TransitionError> {
        let policy = self.config.retry;
        let machine = self
            .machines
            .entry(kind)
            .or_insert_with(|| UnitMachine::new(kind, policy));
        let from = machine.state().name();
        let result = machine.apply(event);
        let to = machine.state().name();
        if from != to {
            self.publish(LifecycleEvent::StateChanged {
                kind,
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        result
    }

    fn set_sdk(&mut self, phase: SdkPhase) {
        self.sdk = phase;
        self.publish(LifecycleEvent::Sdk { phase });
    }

    fn transition_violation(&self, e: TransitionError) {
        self.violation(e.to_string());
    }

    fn violation(&self, detail: String) {
        warn!(detail = %detail, "protocol violation ignored");
        self.publish(LifecycleEvent::ProtocolViolation { detail });
    }

    fn publish(&self, ev: LifecycleEvent) {
        let _ = self.bus.send(ev);
    }

    fn snapshot(&self) -> ControllerSnapshot {
        let now = self.deps.clock.now();
        let kinds = self
            .machines
            .iter()
            .map(|(kind, m)| KindSnapshot {
                kind: *kind,
                state: m.state().name().to_string(),
                retry_delay_ms: m.retry().current().as_millis() as u64,
                retry_pending: self.retry_timers.contains_key(kind),
                load_deferred: self.deferred_loads.contains_key(kind),
                cooldown_remaining_ms: self
                    .cooldown
                    .remaining(*kind, now, self.config.cooldown_window)
                    .as_millis() as u64,
            })
            .collect();
        ControllerSnapshot {
            sdk: self.sdk,
            kinds,
            banner_surfaces: self.banner.surface_count(),
            banner_loads_deferred: self.banner.deferred_count(),
        }
    }
}
