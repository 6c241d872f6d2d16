//! Scenario: Transient load failures retry on a doubling schedule.
//!
//! # Invariants under test
//! 1. A transient failure schedules exactly one retry after the floor delay:
//!    nothing at 1999ms, the second load at 2000ms.
//! 2. Consecutive failures double the delay up to the ceiling
//!    (2s, 4s, 8s, 16s, 30s, 30s).
//! 3. A successful load resets the schedule to the floor.
//! 4. A retry that fires after the unit left Absent is voided.
//! 5. Transient failures log at warning, never error.

use std::time::Duration;

use adlc_runtime::LifecycleEvent;
use adlc_schemas::AdKind;
use adlc_testkit::{Harness, LoadScript, LogCapture};
use tokio::sync::broadcast;
use tracing::Level;

fn retry_delays(rx: &mut broadcast::Receiver<LifecycleEvent>) -> Vec<u64> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if let LifecycleEvent::RetryScheduled { delay_ms, .. } = ev {
            out.push(delay_ms);
        }
    }
    out
}

#[tokio::test(start_paused = true)]
async fn retry_fires_at_floor_not_before() {
    let h = Harness::new();
    h.start().await.unwrap();
    h.provider.script_load(AdKind::Interstitial, LoadScript::transient());

    h.controller.request_load(AdKind::Interstitial, true);
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 1);
    assert!(h.snapshot().await.unwrap().kind(AdKind::Interstitial).unwrap().retry_pending);

    tokio::time::advance(Duration::from_millis(1999)).await;
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 1);

    tokio::time::advance(Duration::from_millis(1)).await;
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 2);
    assert!(h.controller.is_ready(AdKind::Interstitial).await);
}

#[tokio::test(start_paused = true)]
async fn delays_double_to_ceiling_then_reset() {
    let h = Harness::new();
    let mut rx = h.controller.subscribe();
    h.start().await.unwrap();
    for _ in 0..6 {
        h.provider.script_load(AdKind::Rewarded, LoadScript::transient());
    }

    h.controller.request_load(AdKind::Rewarded, true);
    h.quiesce().await;
    for delay in [2_000, 4_000, 8_000, 16_000, 30_000] {
        tokio::time::advance(Duration::from_millis(delay)).await;
        h.quiesce().await;
    }
    assert_eq!(
        retry_delays(&mut rx),
        vec![2_000, 4_000, 8_000, 16_000, 30_000, 30_000]
    );

    // Seventh attempt succeeds after the last 30s wait.
    tokio::time::advance(Duration::from_millis(30_000)).await;
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Rewarded), 7);
    let snap = h.snapshot().await.unwrap();
    let k = snap.kind(AdKind::Rewarded).unwrap();
    assert!(k.is_ready());
    assert_eq!(k.retry_delay_ms, 2_000);
    assert!(!k.retry_pending);
}

#[tokio::test(start_paused = true)]
async fn retry_is_voided_when_unit_no_longer_absent() {
    let h = Harness::new();
    h.start().await.unwrap();
    h.provider.script_load(AdKind::Interstitial, LoadScript::transient());

    h.controller.request_load(AdKind::Interstitial, true);
    h.quiesce().await;

    // A caller-driven load lands before the timer.
    h.controller.request_load(AdKind::Interstitial, true);
    h.quiesce().await;
    assert!(h.controller.is_ready(AdKind::Interstitial).await);

    tokio::time::advance(Duration::from_millis(2_000)).await;
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 2);
    assert!(h.controller.is_ready(AdKind::Interstitial).await);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_warnings() {
    let (logs, _guard) = LogCapture::install();
    let h = Harness::new();
    h.start().await.unwrap();
    h.provider.script_load(AdKind::Interstitial, LoadScript::transient());

    h.controller.request_load(AdKind::Interstitial, true);
    h.quiesce().await;

    let hits = logs.matching("transient load failure");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].level, Level::WARN);
    assert_eq!(logs.count_at(Level::ERROR), 0);
}
