//! Scenario: Cooldown survives a controller restart.
//!
//! # Invariants under test
//! 1. A show recorded by one controller blocks shows on a new controller
//!    backed by the same store file, for the remainder of the window.
//! 2. Once the window has passed on wall time, the new controller shows.

use std::sync::Arc;
use std::time::Duration;

use adlc_cooldown::JsonFileCooldownStore;
use adlc_runtime::{DismissReason, ShowDecision, ShowRequest};
use adlc_schemas::AdKind;
use adlc_testkit::{CallbackRecorder, Harness, ManualClock};

#[tokio::test(start_paused = true)]
async fn cooldown_carries_over_to_new_controller() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("cooldown.json");
    let clock = Arc::new(ManualClock::default());

    let first = Harness::builder()
        .store(Arc::new(JsonFileCooldownStore::new(path.clone())))
        .clock(clock.clone())
        .build();
    first.start().await.unwrap();
    first.load_ready(AdKind::Rewarded).await.unwrap();
    let calls = CallbackRecorder::new();
    let decision = first
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, true, calls.on_dismissed())
                .with_surface(Harness::surface()),
        )
        .await;
    assert!(matches!(decision, ShowDecision::Started(_)));
    first.quiesce().await;
    first.controller.shutdown().await;
    assert!(path.exists());

    clock.advance(Duration::from_secs(20));
    let second = Harness::builder()
        .store(Arc::new(JsonFileCooldownStore::new(path.clone())))
        .clock(clock.clone())
        .build();
    second.start().await.unwrap();
    second.load_ready(AdKind::Rewarded).await.unwrap();

    let blocked = second
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, true, calls.on_dismissed())
                .with_surface(Harness::surface()),
        )
        .await;
    assert_eq!(
        blocked,
        ShowDecision::Dismissed(DismissReason::CoolingDown {
            remaining: Duration::from_secs(40)
        })
    );
    assert_eq!(second.provider.show_calls(), 0);

    clock.advance(Duration::from_secs(40));
    let shown = second
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, true, calls.on_dismissed())
                .with_surface(Harness::surface()),
        )
        .await;
    assert!(matches!(shown, ShowDecision::Started(_)));
}
