//! `adlc simulate`: one scripted session against the configured controller.
//!
//! The scripted provider fails the first interstitial load with the vendor's
//! engine start-up error, classified with the configured signatures, so the
//! retry path shows up in the event stream. Events are printed as JSON lines.

use std::sync::Arc;
use std::time::Duration;

use adlc_config::AdsConfig;
use adlc_cooldown::{CooldownStore, JsonFileCooldownStore, MemoryCooldownStore};
use adlc_gate::GateFlags;
use adlc_runtime::{ControllerConfig, ShowDecision, ShowRequest};
use adlc_schemas::{AdKind, Reward};
use adlc_testkit::{Harness, LoadScript, ManualClock, ScriptedProvider, ShowScript};
use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

const READY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run(config_paths: &[String]) -> Result<()> {
    let loaded = super::load_config(config_paths)?;
    let ads = AdsConfig::from_config_json(&loaded.config_json)?;
    info!(config_hash = %loaded.config_hash, ads_enabled = ads.ads_enabled, "simulation config loaded");

    let store: Arc<dyn CooldownStore> = match &ads.cooldown.store_path {
        Some(p) => Arc::new(JsonFileCooldownStore::new(p)),
        None => Arc::new(MemoryCooldownStore::new()),
    };
    let flags = GateFlags {
        ads_enabled: ads.ads_enabled,
        privileged_unlock: false,
        is_parent_facing_context: true,
        using_test_provider: ads.using_test_provider,
    };
    let h = Harness::builder()
        .config(ControllerConfig::from_ads(&ads).with_config_hash(&loaded.config_hash))
        .flags(flags)
        .provider(Arc::new(ScriptedProvider::from_settings(&ads.provider)))
        .store(store)
        .clock(Arc::new(ManualClock::new(Utc::now())))
        .build();
    let mut events = h.controller.subscribe();

    h.provider
        .script_load(AdKind::Interstitial, LoadScript::transient());
    h.provider
        .script_show(ShowScript::Reward(Reward::new(10, "coins")));

    if let Err(e) = h.start().await {
        warn!(error = %e, "controller not started; continuing with bypass paths");
    }
    for kind in AdKind::FULL_SCREEN {
        h.controller.request_load(kind, true);
    }
    for kind in AdKind::FULL_SCREEN {
        if !wait_ready(&h, kind).await {
            warn!(kind = %kind, "unit not ready within timeout");
        }
    }

    let rewarded = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, true, || info!("rewarded dismissed"))
                .with_surface(Harness::surface())
                .with_reward(|r| info!(amount = r.amount, reward_type = %r.kind, "reward delivered")),
        )
        .await;
    info!(decision = ?rewarded, "rewarded show");
    settle().await;

    // Same kind again: inside the cooldown window.
    let again = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, true, || info!("rewarded dismissed"))
                .with_surface(Harness::surface()),
        )
        .await;
    info!(decision = ?again, "rewarded show within cooldown");

    let interstitial = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Interstitial, true, || info!("interstitial dismissed"))
                .with_surface(Harness::surface()),
        )
        .await;
    if let ShowDecision::Started(ticket) = interstitial {
        info!(%ticket, "interstitial on screen");
    }
    settle().await;

    if let Some(surface) = h.controller.create_banner_surface(true).await {
        info!(surface = surface.token(), "banner surface created");
    }
    settle().await;

    h.controller.shutdown().await;

    loop {
        match events.try_recv() {
            Ok(ev) => {
                let line = serde_json::to_string(&ev).context("serialize lifecycle event")?;
                println!("{line}");
            }
            Err(TryRecvError::Lagged(n)) => warn!(skipped = n, "event stream lagged"),
            Err(_) => break,
        }
    }
    Ok(())
}

async fn wait_ready(h: &Harness, kind: AdKind) -> bool {
    let deadline = tokio::time::Instant::now() + READY_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if h.controller.is_ready(kind).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

/// Give spawned provider tasks a moment to report back.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
