use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use adlc_schemas::AdKind;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::{CooldownStore, CooldownWriter};

/// Last-shown timestamps backed by a [`CooldownStore`].
///
/// Reads are served from the cache, which always reflects the latest
/// `record_shown`. Writes go straight to the store, or through a
/// [`CooldownWriter`] when built with [`CooldownTracker::with_background_writes`].
/// Store failures are logged and never propagate: a lost cooldown record
/// only means an ad may be eligible slightly early.
pub struct CooldownTracker {
    store: Arc<dyn CooldownStore>,
    writer: Option<CooldownWriter>,
    cache: BTreeMap<AdKind, DateTime<Utc>>,
}

impl CooldownTracker {
    /// Hydrate from `store`. An unreadable store starts empty.
    pub fn new(store: Arc<dyn CooldownStore>) -> Self {
        let cache = match store.load_all() {
            Ok(records) => records
                .into_iter()
                .filter(|(k, _)| k.has_cooldown())
                .collect(),
            Err(e) => {
                warn!(error = %e, "cooldown store unreadable; starting with no records");
                BTreeMap::new()
            }
        };
        Self {
            store,
            writer: None,
            cache,
        }
    }

    /// Like [`new`](Self::new), but store writes run on tokio's blocking
    /// pool. Must be called inside a tokio runtime; call
    /// [`close`](Self::close) to flush before the runtime goes away.
    pub fn with_background_writes(store: Arc<dyn CooldownStore>) -> Self {
        let mut tracker = Self::new(store.clone());
        tracker.writer = Some(CooldownWriter::spawn(store));
        tracker
    }

    pub fn record_shown(&mut self, kind: AdKind, now: DateTime<Utc>) {
        if !kind.has_cooldown() {
            return;
        }
        self.cache.insert(kind, now);
        match &self.writer {
            Some(w) => w.store(kind, now),
            None => {
                if let Err(e) = self.store.store(kind, now) {
                    warn!(kind = %kind, error = %e, "cooldown record not persisted");
                }
            }
        }
    }

    /// Wait for queued background writes. Later writes go straight to the store.
    pub async fn close(&mut self) {
        if let Some(w) = self.writer.take() {
            w.close().await;
        }
    }

    pub fn last_shown(&self, kind: AdKind) -> Option<DateTime<Utc>> {
        self.cache.get(&kind).copied()
    }

    /// `true` if no record exists or at least `window` has elapsed.
    pub fn is_eligible(&self, kind: AdKind, now: DateTime<Utc>, window: Duration) -> bool {
        self.remaining(kind, now, window).is_zero()
    }

    /// `max(0, window - (now - last_shown))`.
    ///
    /// A record in the future (clock moved backwards) counts as zero elapsed.
    pub fn remaining(&self, kind: AdKind, now: DateTime<Utc>, window: Duration) -> Duration {
        let Some(last) = self.last_shown(kind) else {
            return Duration::ZERO;
        };
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        window.saturating_sub(elapsed)
    }

    /// Drop cached and persisted records for one kind, or all kinds.
    pub fn reset(&mut self, kind: Option<AdKind>) {
        match kind {
            Some(k) => {
                self.cache.remove(&k);
            }
            None => self.cache.clear(),
        }
        match &self.writer {
            Some(w) => w.clear(kind),
            None => {
                if let Err(e) = self.store.clear(kind) {
                    warn!(error = %e, "cooldown reset not persisted");
                }
            }
        }
    }
}

impl std::fmt::Debug for CooldownTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownTracker")
            .field("cache", &self.cache)
            .field("background_writes", &self.writer.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCooldownStore;
    use chrono::TimeZone;

    const WINDOW: Duration = Duration::from_secs(60);

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn tracker() -> CooldownTracker {
        CooldownTracker::new(Arc::new(MemoryCooldownStore::new()))
    }

    #[test]
    fn no_record_is_eligible() {
        let c = tracker();
        assert!(c.is_eligible(AdKind::Interstitial, t(0), WINDOW));
        assert_eq!(c.remaining(AdKind::Interstitial, t(0), WINDOW), Duration::ZERO);
    }

    #[test]
    fn banner_is_never_recorded() {
        let mut c = tracker();
        c.record_shown(AdKind::Banner, t(0));
        assert_eq!(c.last_shown(AdKind::Banner), None);
        assert!(c.is_eligible(AdKind::Banner, t(1), WINDOW));
    }

    #[test]
    fn clock_going_backwards_keeps_full_window() {
        let mut c = tracker();
        c.record_shown(AdKind::Rewarded, t(100));
        assert_eq!(c.remaining(AdKind::Rewarded, t(90), WINDOW), WINDOW);
    }

    #[test]
    fn reset_clears_one_kind() {
        let mut c = tracker();
        c.record_shown(AdKind::Rewarded, t(0));
        c.record_shown(AdKind::Interstitial, t(0));
        c.reset(Some(AdKind::Rewarded));
        assert!(c.is_eligible(AdKind::Rewarded, t(1), WINDOW));
        assert!(!c.is_eligible(AdKind::Interstitial, t(1), WINDOW));
    }
}
