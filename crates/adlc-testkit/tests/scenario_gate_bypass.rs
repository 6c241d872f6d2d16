//! Scenario: Gate refusals keep the provider untouched.
//!
//! # Invariants under test
//! 1. With ads disabled, `init`, loads, shows and banners never reach the
//!    provider.
//! 2. A bypassed rewarded show with a reward callback grants the synthetic
//!    reward and does not dismiss.
//! 3. A bypassed show without a reward callback dismisses once.
//! 4. Privileged unlock behaves exactly like ads disabled.
//! 5. A non parent-facing context is refused and dismissed, never rewarded.
//! 6. Flags are sampled per operation: toggling after start takes effect on
//!    the next call.

use adlc_gate::{GateFlags, GateRefusal};
use adlc_runtime::{DismissReason, LifecycleEvent, SdkPhase, ShowDecision, ShowRequest};
use adlc_schemas::{AdKind, Reward};
use adlc_testkit::{open_flags, CallbackRecorder, Harness};

fn disabled() -> GateFlags {
    GateFlags {
        ads_enabled: false,
        ..open_flags()
    }
}

#[tokio::test(start_paused = true)]
async fn ads_disabled_never_touches_provider() {
    let h = Harness::builder().flags(disabled()).build();
    let mut rx = h.controller.subscribe();

    assert!(h.start().await.is_err());
    h.controller.request_load(AdKind::Interstitial, true);
    h.controller.request_load(AdKind::Rewarded, true);
    let calls = CallbackRecorder::new();
    let decision = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Interstitial, true, calls.on_dismissed())
                .with_surface(Harness::surface()),
        )
        .await;
    let banner = h.controller.create_banner_surface(true).await;
    h.quiesce().await;

    assert_eq!(
        decision,
        ShowDecision::Dismissed(DismissReason::Bypassed(GateRefusal::AdsDisabled))
    );
    assert_eq!(calls.dismissed(), 1);
    assert_eq!(banner, None);
    assert!(h.provider.calls().is_empty());
    assert_eq!(h.snapshot().await.unwrap().sdk, SdkPhase::NotStarted);
    let skipped = std::iter::from_fn(|| rx.try_recv().ok())
        .any(|ev| matches!(ev, LifecycleEvent::InitSkipped { .. }));
    assert!(skipped);
}

#[tokio::test(start_paused = true)]
async fn bypassed_rewarded_show_grants_fake_reward() {
    let h = Harness::builder().flags(disabled()).build();
    let calls = CallbackRecorder::new();

    let decision = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, true, calls.on_dismissed())
                .with_reward(calls.on_reward()),
        )
        .await;

    assert_eq!(decision, ShowDecision::FakeReward);
    assert_eq!(calls.rewards(), vec![Reward::unlocked()]);
    assert_eq!(calls.dismissed(), 0);
    assert!(h.provider.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn privileged_unlock_matches_disabled() {
    let flags = GateFlags {
        privileged_unlock: true,
        ..open_flags()
    };
    let h = Harness::builder().flags(flags).build();
    assert!(h.start().await.is_err());

    let calls = CallbackRecorder::new();
    let rewarded = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, true, calls.on_dismissed())
                .with_reward(calls.on_reward()),
        )
        .await;
    let interstitial = h
        .controller
        .request_show(ShowRequest::new(AdKind::Interstitial, true, calls.on_dismissed()))
        .await;

    assert_eq!(rewarded, ShowDecision::FakeReward);
    assert_eq!(
        interstitial,
        ShowDecision::Dismissed(DismissReason::Bypassed(GateRefusal::PrivilegedUnlock))
    );
    assert_eq!(calls.rewards().len(), 1);
    assert_eq!(calls.dismissed(), 1);
    assert!(h.provider.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn child_context_is_refused() {
    let h = Harness::new();
    h.start().await.unwrap();
    h.load_ready(AdKind::Rewarded).await.unwrap();

    let calls = CallbackRecorder::new();
    let decision = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Rewarded, false, calls.on_dismissed())
                .with_surface(Harness::surface())
                .with_reward(calls.on_reward()),
        )
        .await;
    assert_eq!(
        decision,
        ShowDecision::Dismissed(DismissReason::Refused(GateRefusal::NotParentFacing))
    );
    assert_eq!(calls.dismissed(), 1);
    assert!(calls.rewards().is_empty());
    assert_eq!(h.provider.show_calls(), 0);

    h.controller.request_load(AdKind::Interstitial, false);
    assert_eq!(h.controller.create_banner_surface(false).await, None);
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 0);
}

#[tokio::test(start_paused = true)]
async fn flags_are_sampled_per_operation() {
    let h = Harness::new();
    h.start().await.unwrap();

    h.flags.set_ads_enabled(false);
    h.controller.request_load(AdKind::Interstitial, true);
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 0);

    h.flags.set_ads_enabled(true);
    h.controller.request_load(AdKind::Interstitial, true);
    h.quiesce().await;
    assert_eq!(h.provider.load_calls(AdKind::Interstitial), 1);
    assert!(h.controller.is_ready(AdKind::Interstitial).await);

    h.flags.set_privileged_unlock(true);
    let calls = CallbackRecorder::new();
    let decision = h
        .controller
        .request_show(
            ShowRequest::new(AdKind::Interstitial, true, calls.on_dismissed())
                .with_surface(Harness::surface()),
        )
        .await;
    assert!(matches!(decision, ShowDecision::Dismissed(DismissReason::Bypassed(_))));
    assert_eq!(h.provider.show_calls(), 0);
    assert!(h.controller.is_ready(AdKind::Interstitial).await);
}
