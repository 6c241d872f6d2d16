//! Deterministic scripted provider.
//!
//! Every call is recorded. Outcomes are taken from per-operation queues; an
//! empty queue means "succeed immediately". Handles and surfaces get
//! sequential ids (`UNIT-000001`, `SURF-000001`). No randomness, no network.
//!
//! Load failures are scripted as raw vendor code and message and go through
//! a [`FailureClassifier`], the same way a real adapter reports them.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use adlc_config::ProviderSettings;
use adlc_provider::{
    AdProvider, FailureClassifier, ProviderError, RewardSink, ShowOutcome, SignatureClassifier,
};
use adlc_schemas::{
    AdKind, LoadFailure, RequestConfiguration, Reward, SurfaceHandle, UnitHandle, UnitId,
};
use async_trait::async_trait;

/// Scripted outcome of one `load_unit` call.
#[derive(Debug, Clone)]
pub enum LoadScript {
    Succeed,
    SucceedAfter(Duration),
    /// Vendor error, classified by the provider's classifier.
    Vendor { code: Option<i64>, message: String },
    /// Never resolves: the load stays in flight.
    Hang,
}

impl LoadScript {
    pub fn vendor(code: Option<i64>, message: impl Into<String>) -> Self {
        LoadScript::Vendor {
            code,
            message: message.into(),
        }
    }

    /// The vendor's JavaScript-engine start-up failure.
    pub fn transient() -> Self {
        Self::vendor(Some(0), "JavascriptEngine init error")
    }

    pub fn no_fill() -> Self {
        Self::vendor(Some(3), "No fill")
    }

    pub fn terminal() -> Self {
        Self::vendor(Some(1), "Invalid request")
    }
}

/// Scripted outcome of one `show` call.
#[derive(Debug, Clone)]
pub enum ShowScript {
    Dismiss,
    DismissAfter(Duration),
    /// Grant the reward, then dismiss.
    Reward(Reward),
    /// Grant the same reward twice (misbehaving SDK), then dismiss.
    RewardTwice(Reward),
    Fail(String),
    /// Stays on screen forever.
    Hang,
}

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Initialize(RequestConfiguration),
    LoadUnit { kind: AdKind, unit_id: String },
    Show { handle: String, surface: String },
    AttachVerification { handle: String, identity: String },
    CreateBannerSurface,
    LoadBanner { surface: String, unit_id: String },
}

#[derive(Default)]
struct ScriptState {
    init_error: Option<ProviderError>,
    loads: BTreeMap<AdKind, VecDeque<LoadScript>>,
    shows: VecDeque<ShowScript>,
    banner_loads: VecDeque<Result<(), LoadFailure>>,
    next_unit: u64,
    next_surface: u64,
    calls: Vec<ProviderCall>,
}

pub struct ScriptedProvider {
    state: Mutex<ScriptState>,
    classifier: Box<dyn FailureClassifier>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::from_settings(&ProviderSettings::default())
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify scripted vendor errors with the configured signatures.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::with_classifier(SignatureClassifier::from_settings(settings))
    }

    pub fn with_classifier(classifier: impl FailureClassifier + 'static) -> Self {
        Self {
            state: Mutex::new(ScriptState::default()),
            classifier: Box::new(classifier),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        // A panicking test thread must not hide the recorded calls.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    // --- scripting -------------------------------------------------------

    pub fn fail_initialize(&self, err: ProviderError) {
        self.state().init_error = Some(err);
    }

    pub fn script_load(&self, kind: AdKind, script: LoadScript) {
        self.state().loads.entry(kind).or_default().push_back(script);
    }

    pub fn script_show(&self, script: ShowScript) {
        self.state().shows.push_back(script);
    }

    pub fn script_banner_load(&self, result: Result<(), LoadFailure>) {
        self.state().banner_loads.push_back(result);
    }

    // --- inspection ------------------------------------------------------

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state().calls.clone()
    }

    pub fn init_calls(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Initialize(_)))
    }

    /// Request configuration passed to the most recent `initialize`.
    pub fn request_configuration(&self) -> Option<RequestConfiguration> {
        self.state().calls.iter().rev().find_map(|c| match c {
            ProviderCall::Initialize(rc) => Some(*rc),
            _ => None,
        })
    }

    pub fn load_calls(&self, kind: AdKind) -> usize {
        self.count(|c| matches!(c, ProviderCall::LoadUnit { kind: k, .. } if *k == kind))
    }

    pub fn show_calls(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Show { .. }))
    }

    pub fn banner_load_calls(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::LoadBanner { .. }))
    }

    /// `(handle, identity)` pairs passed to `attach_verification`.
    pub fn verifications(&self) -> Vec<(String, String)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProviderCall::AttachVerification { handle, identity } => {
                    Some((handle.clone(), identity.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&ProviderCall) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: ProviderCall) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl AdProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn initialize(&self, request: &RequestConfiguration) -> Result<(), ProviderError> {
        let err = {
            let mut st = self.state();
            st.calls.push(ProviderCall::Initialize(*request));
            st.init_error.take()
        };
        match err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn load_unit(&self, kind: AdKind, unit_id: &UnitId) -> Result<UnitHandle, LoadFailure> {
        let (script, handle) = {
            let mut st = self.state();
            st.calls.push(ProviderCall::LoadUnit {
                kind,
                unit_id: unit_id.to_string(),
            });
            st.next_unit += 1;
            let handle = UnitHandle::new(format!("UNIT-{:06}", st.next_unit));
            let script = st
                .loads
                .get_mut(&kind)
                .and_then(|q| q.pop_front())
                .unwrap_or(LoadScript::Succeed);
            (script, handle)
        };
        match script {
            LoadScript::Succeed => Ok(handle),
            LoadScript::SucceedAfter(d) => {
                tokio::time::sleep(d).await;
                Ok(handle)
            }
            LoadScript::Vendor { code, message } => Err(self.classifier.failure(code, &message)),
            LoadScript::Hang => std::future::pending().await,
        }
    }

    async fn show(
        &self,
        handle: &UnitHandle,
        surface: &SurfaceHandle,
        rewards: RewardSink,
    ) -> ShowOutcome {
        let script = {
            let mut st = self.state();
            st.calls.push(ProviderCall::Show {
                handle: handle.token().to_string(),
                surface: surface.token().to_string(),
            });
            st.shows.pop_front().unwrap_or(ShowScript::Dismiss)
        };
        match script {
            ShowScript::Dismiss => ShowOutcome::Dismissed,
            ShowScript::DismissAfter(d) => {
                tokio::time::sleep(d).await;
                ShowOutcome::Dismissed
            }
            ShowScript::Reward(r) => {
                rewards.grant(r);
                ShowOutcome::Dismissed
            }
            ShowScript::RewardTwice(r) => {
                rewards.grant(r.clone());
                rewards.grant(r);
                ShowOutcome::Dismissed
            }
            ShowScript::Fail(reason) => ShowOutcome::Failed(reason),
            ShowScript::Hang => std::future::pending().await,
        }
    }

    fn attach_verification(&self, handle: &UnitHandle, identity: &str) -> Result<(), ProviderError> {
        self.record(ProviderCall::AttachVerification {
            handle: handle.token().to_string(),
            identity: identity.to_string(),
        });
        Ok(())
    }

    async fn create_banner_surface(&self) -> Result<SurfaceHandle, ProviderError> {
        let mut st = self.state();
        st.calls.push(ProviderCall::CreateBannerSurface);
        st.next_surface += 1;
        Ok(SurfaceHandle::new(format!("SURF-{:06}", st.next_surface)))
    }

    async fn load_banner(&self, surface: &SurfaceHandle, unit_id: &UnitId) -> Result<(), LoadFailure> {
        let mut st = self.state();
        st.calls.push(ProviderCall::LoadBanner {
            surface: surface.token().to_string(),
            unit_id: unit_id.to_string(),
        });
        st.banner_loads.pop_front().unwrap_or(Ok(()))
    }
}
