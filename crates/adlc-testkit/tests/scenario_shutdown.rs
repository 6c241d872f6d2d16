//! Scenario: Controller shutdown.
//!
//! # Invariants under test
//! 1. A show still on screen is dismissed exactly once at shutdown, and not
//!    again if the provider reports late.
//! 2. Pending retry and settle timers are cancelled: no provider call after
//!    shutdown.
//! 3. Requests after shutdown are dismissed without reaching the provider.
//! 4. `shutdown` is idempotent.

use std::time::Duration;

use adlc_runtime::{DismissReason, ShowDecision, ShowRequest};
use adlc_schemas::AdKind;
use adlc_testkit::{CallbackRecorder, Harness, LoadScript, ShowScript};

#[tokio::test(start_paused = true)]
async fn open_show_is_dismissed_once() {
    let h = Harness::new();
    h.start().await.unwrap();
    h.load_ready(AdKind::Interstitial).await.unwrap();
    h.provider.script_show(ShowScript::DismissAfter(Duration::from_secs(10)));

    let calls = CallbackRecorder::new();
    let decision = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Interstitial, true, calls.on_dismissed())
                .with_surface(Harness::surface()),
        )
        .await;
    assert!(matches!(decision, ShowDecision::Started(_)));

    h.controller.shutdown().await;
    assert_eq!(calls.dismissed(), 1);

    tokio::time::advance(Duration::from_secs(10)).await;
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
    assert_eq!(calls.dismissed(), 1);
}

#[tokio::test(start_paused = true)]
async fn timers_are_cancelled() {
    let h = Harness::new();
    h.start().await.unwrap();
    h.provider.script_load(AdKind::Rewarded, LoadScript::transient());
    h.controller.request_load(AdKind::Rewarded, true);
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Rewarded), 1);

    h.controller.shutdown().await;
    tokio::time::advance(Duration::from_secs(60)).await;
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.provider.load_calls(AdKind::Rewarded), 1);
}

#[tokio::test(start_paused = true)]
async fn settle_timer_is_cancelled() {
    let h = Harness::new();
    h.controller.request_load(AdKind::Interstitial, true);
    h.controller.init();
    h.quiesce().await;

    h.controller.shutdown().await;
    tokio::time::advance(Duration::from_secs(5)).await;
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 0);
}

#[tokio::test(start_paused = true)]
async fn requests_after_shutdown_are_dismissed() {
    let h = Harness::new();
    h.start().await.unwrap();
    h.controller.shutdown().await;
    h.controller.shutdown().await;

    let calls = CallbackRecorder::new();
    let decision = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, true, calls.on_dismissed())
                .with_reward(calls.on_reward()),
        )
        .await;
    assert_eq!(decision, ShowDecision::Dismissed(DismissReason::ShutDown));
    assert_eq!(calls.dismissed(), 1);
    assert!(calls.rewards().is_empty());

    h.controller.request_load(AdKind::Interstitial, true);
    assert_eq!(h.controller.create_banner_surface(true).await, None);
    assert!(h.controller.snapshot().await.is_none());
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 0);
}
