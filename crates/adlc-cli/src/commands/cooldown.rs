//! `adlc cooldown status|reset` against a JSON-file cooldown store.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adlc_cooldown::{CooldownStore, CooldownTracker, JsonFileCooldownStore};
use adlc_schemas::AdKind;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

/// One line of `cooldown status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownRow {
    pub kind: AdKind,
    pub last_shown: Option<DateTime<Utc>>,
    pub remaining: Duration,
}

impl fmt::Display for CooldownRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self
            .last_shown
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "never".to_string());
        write!(
            f,
            "kind={} last_shown={} remaining_secs={} eligible={}",
            self.kind,
            last,
            self.remaining.as_secs(),
            self.remaining.is_zero()
        )
    }
}

pub fn status(store_path: &Path, window: Duration, now: DateTime<Utc>) -> Result<Vec<CooldownRow>> {
    let store = Arc::new(JsonFileCooldownStore::new(store_path));
    // Surface an unreadable store here; the tracker would silently start empty.
    store
        .load_all()
        .with_context(|| format!("read cooldown store failed: {}", store_path.display()))?;

    let tracker = CooldownTracker::new(store);
    Ok(AdKind::FULL_SCREEN
        .into_iter()
        .map(|kind| CooldownRow {
            kind,
            last_shown: tracker.last_shown(kind),
            remaining: tracker.remaining(kind, now, window),
        })
        .collect())
}

pub fn reset(store_path: &Path, kind: Option<AdKind>) -> Result<()> {
    JsonFileCooldownStore::new(store_path)
        .clear(kind)
        .with_context(|| format!("reset cooldown store failed: {}", store_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn status_reports_remaining_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cooldown.json");
        JsonFileCooldownStore::new(&path)
            .store(AdKind::Rewarded, t(1_000))
            .unwrap();

        let rows = status(&path, Duration::from_secs(60), t(1_003)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, AdKind::Interstitial);
        assert_eq!(rows[0].last_shown, None);
        assert!(rows[0].remaining.is_zero());
        assert_eq!(rows[1].remaining, Duration::from_secs(57));
        assert!(rows[1].to_string().contains("remaining_secs=57 eligible=false"));
    }

    #[test]
    fn reset_one_kind_keeps_the_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cooldown.json");
        let store = JsonFileCooldownStore::new(&path);
        store.store(AdKind::Rewarded, t(1_000)).unwrap();
        store.store(AdKind::Interstitial, t(1_000)).unwrap();

        reset(&path, Some(AdKind::Rewarded)).unwrap();
        let all = store.load_all().unwrap();
        assert!(!all.contains_key(&AdKind::Rewarded));
        assert!(all.contains_key(&AdKind::Interstitial));
    }

    #[test]
    fn corrupt_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cooldown.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = status(&path, Duration::from_secs(60), t(0)).unwrap_err();
        assert!(format!("{err:#}").contains("read cooldown store failed"));
    }
}
