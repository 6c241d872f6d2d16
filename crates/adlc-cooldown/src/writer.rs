//! Ordered background persistence for cooldown records.
//!
//! Store IO runs on tokio's blocking pool, one operation at a time in
//! submission order, so a read-modify-write file store never interleaves
//! with itself and the submitting task never waits on the disk.

use std::sync::Arc;

use adlc_schemas::AdKind;
use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::CooldownStore;

#[derive(Debug, Clone, Copy)]
enum WriteOp {
    Store(AdKind, DateTime<Utc>),
    Clear(Option<AdKind>),
}

impl WriteOp {
    fn apply(self, store: &dyn CooldownStore) -> Result<()> {
        match self {
            WriteOp::Store(kind, at) => store.store(kind, at),
            WriteOp::Clear(kind) => store.clear(kind),
        }
    }
}

/// Handle to the writer task. Must be created inside a tokio runtime.
pub struct CooldownWriter {
    tx: mpsc::UnboundedSender<WriteOp>,
    join: JoinHandle<()>,
}

impl CooldownWriter {
    pub fn spawn(store: Arc<dyn CooldownStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteOp>();
        let join = tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                let store = store.clone();
                match tokio::task::spawn_blocking(move || op.apply(store.as_ref())).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(op = ?op, error = %e, "cooldown write failed"),
                    Err(e) => warn!(op = ?op, error = %e, "cooldown write task aborted"),
                }
            }
        });
        Self { tx, join }
    }

    pub fn store(&self, kind: AdKind, at: DateTime<Utc>) {
        self.submit(WriteOp::Store(kind, at));
    }

    pub fn clear(&self, kind: Option<AdKind>) {
        self.submit(WriteOp::Clear(kind));
    }

    /// Stop accepting writes and wait until every queued write has landed.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.join.await {
            warn!(error = %e, "cooldown writer ended abnormally");
        }
    }

    fn submit(&self, op: WriteOp) {
        if self.tx.send(op).is_err() {
            warn!(op = ?op, "cooldown writer stopped; record not persisted");
        }
    }
}

impl std::fmt::Debug for CooldownWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownWriter")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonFileCooldownStore;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn writes_land_in_order_before_close_returns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cooldown.json");
        let store = Arc::new(JsonFileCooldownStore::new(path.clone()));

        let writer = CooldownWriter::spawn(store.clone());
        writer.store(AdKind::Interstitial, t(0));
        writer.store(AdKind::Rewarded, t(5));
        writer.store(AdKind::Interstitial, t(10));
        writer.clear(Some(AdKind::Rewarded));
        writer.close().await;

        let records = store.load_all().unwrap();
        assert_eq!(records.get(&AdKind::Interstitial), Some(&t(10)));
        assert!(!records.contains_key(&AdKind::Rewarded));
    }
}
