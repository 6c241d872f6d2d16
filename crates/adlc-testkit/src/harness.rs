//! Controller wired to scripted collaborators.

use std::sync::Arc;
use std::time::Duration;

use adlc_config::{AdsConfig, UnitIds};
use adlc_cooldown::{CooldownStore, MemoryCooldownStore};
use adlc_gate::{GateFlags, SharedFlags};
use adlc_provider::{FixedIdentity, IdentitySource};
use adlc_runtime::{AdController, ControllerConfig, ControllerDeps, ControllerSnapshot, SdkPhase};
use adlc_schemas::{AdKind, SurfaceHandle, UnitId};
use anyhow::{bail, Result};

use crate::{ManualClock, ScriptedProvider};

/// Vendor public test units.
pub const TEST_INTERSTITIAL_UNIT: &str = "ca-app-pub-3940256099942544/1033173712";
pub const TEST_REWARDED_UNIT: &str = "ca-app-pub-3940256099942544/5224354917";
pub const TEST_BANNER_UNIT: &str = "ca-app-pub-3940256099942544/6300978111";

pub const TEST_IDENTITY: &str = "user-0001";

/// Ads enabled, test provider, vendor test units, default timings.
pub fn test_ads_config() -> AdsConfig {
    AdsConfig {
        ads_enabled: true,
        using_test_provider: true,
        units: UnitIds {
            interstitial: UnitId::new(TEST_INTERSTITIAL_UNIT),
            rewarded: UnitId::new(TEST_REWARDED_UNIT),
            banner: UnitId::new(TEST_BANNER_UNIT),
        },
        ..AdsConfig::default()
    }
}

pub fn test_config() -> ControllerConfig {
    ControllerConfig::from_ads(&test_ads_config())
}

/// Ads enabled, no unlock, parent-facing, test provider.
pub fn open_flags() -> GateFlags {
    GateFlags {
        ads_enabled: true,
        privileged_unlock: false,
        is_parent_facing_context: true,
        using_test_provider: true,
    }
}

pub struct HarnessBuilder {
    config: ControllerConfig,
    flags: GateFlags,
    provider: Arc<ScriptedProvider>,
    store: Arc<dyn CooldownStore>,
    identity: Arc<dyn IdentitySource>,
    clock: Arc<ManualClock>,
}

impl HarnessBuilder {
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn flags(mut self, flags: GateFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn provider(mut self, provider: Arc<ScriptedProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn store(mut self, store: Arc<dyn CooldownStore>) -> Self {
        self.store = store;
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentitySource>) -> Self {
        self.identity = identity;
        self
    }

    pub fn clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Spawns the controller; call inside a tokio runtime.
    pub fn build(self) -> Harness {
        let flags = SharedFlags::new(self.flags);
        let deps = ControllerDeps {
            provider: self.provider.clone(),
            flags: Arc::new(flags.clone()),
            identity: self.identity,
            cooldown_store: self.store.clone(),
            clock: self.clock.clone(),
        };
        let controller = AdController::new(self.config.clone(), deps);
        Harness {
            controller,
            provider: self.provider,
            flags,
            clock: self.clock,
            store: self.store,
            config: self.config,
        }
    }
}

pub struct Harness {
    pub controller: AdController,
    pub provider: Arc<ScriptedProvider>,
    /// Shared with the controller; toggles apply to the next operation.
    pub flags: SharedFlags,
    pub clock: Arc<ManualClock>,
    pub store: Arc<dyn CooldownStore>,
    pub config: ControllerConfig,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            config: test_config(),
            flags: open_flags(),
            provider: Arc::new(ScriptedProvider::from_settings(&test_ads_config().provider)),
            store: Arc::new(MemoryCooldownStore::new()),
            identity: Arc::new(FixedIdentity(TEST_IDENTITY.to_string())),
            clock: Arc::new(ManualClock::default()),
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn surface() -> SurfaceHandle {
        SurfaceHandle::new("screen-main")
    }

    /// `init()` and wait (in tokio time) until the SDK is ready.
    pub async fn start(&self) -> Result<()> {
        self.controller.init();
        for _ in 0..10_000 {
            let snap = self.snapshot().await?;
            match snap.sdk {
                SdkPhase::Ready => return Ok(()),
                SdkPhase::NotStarted => bail!("init was refused by the gate"),
                SdkPhase::Failed => bail!("provider initialisation failed"),
                SdkPhase::Initializing | SdkPhase::Settling => {}
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        bail!("provider never became ready")
    }

    /// Let spawned provider tasks run and their results drain through the
    /// controller, without advancing tokio time.
    pub async fn quiesce(&self) {
        for _ in 0..4 {
            for _ in 0..16 {
                tokio::task::yield_now().await;
            }
            let _ = self.controller.snapshot().await;
        }
    }

    pub async fn snapshot(&self) -> Result<ControllerSnapshot> {
        match self.controller.snapshot().await {
            Some(s) => Ok(s),
            None => bail!("controller has shut down"),
        }
    }

    /// Request a load and wait until the kind is ready.
    pub async fn load_ready(&self, kind: AdKind) -> Result<()> {
        self.controller.request_load(kind, true);
        self.quiesce().await;
        if !self.controller.is_ready(kind).await {
            bail!("{kind} did not become ready");
        }
        Ok(())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
