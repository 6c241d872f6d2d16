//! Scenario: No-fill and terminal load failures.
//!
//! # Invariants under test
//! 1. Neither no-fill nor terminal failures schedule a retry.
//! 2. No-fill is logged below error severity; terminal failures at error.
//! 3. After either, the next explicit request starts a fresh load.

use std::time::Duration;

use adlc_schemas::AdKind;
use adlc_testkit::{Harness, LoadScript, LogCapture};
use tracing::Level;

#[tokio::test(start_paused = true)]
async fn no_fill_is_not_an_error_and_not_retried() {
    let (logs, _guard) = LogCapture::install();
    let h = Harness::new();
    h.start().await.unwrap();
    h.provider.script_load(AdKind::Interstitial, LoadScript::no_fill());

    h.controller.request_load(AdKind::Interstitial, true);
    h.quiesce().await;
    let snap = h.snapshot().await.unwrap();
    let k = snap.kind(AdKind::Interstitial).unwrap();
    assert_eq!(k.state, "absent");
    assert!(!k.retry_pending);

    tokio::time::advance(Duration::from_secs(120)).await;
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 1);

    let hits = logs.matching("no fill");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].level, Level::INFO);
    assert_eq!(logs.count_at(Level::ERROR), 0);
    assert_eq!(logs.count_at(Level::WARN), 0);

    h.controller.request_load(AdKind::Interstitial, true);
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 2);
    assert!(h.controller.is_ready(AdKind::Interstitial).await);
}

#[tokio::test(start_paused = true)]
async fn terminal_failure_is_an_error_and_not_retried() {
    let (logs, _guard) = LogCapture::install();
    let h = Harness::new();
    h.start().await.unwrap();
    h.provider.script_load(AdKind::Rewarded, LoadScript::terminal());

    h.controller.request_load(AdKind::Rewarded, true);
    h.quiesce().await;
    tokio::time::advance(Duration::from_secs(120)).await;
    h.quiesce().await;

    assert_eq!(h.provider.load_calls(AdKind::Rewarded), 1);
    assert_eq!(logs.matching("load failed; not retrying").len(), 1);
    assert_eq!(logs.count_at(Level::ERROR), 1);
    assert!(h.provider.verifications().is_empty());
}
