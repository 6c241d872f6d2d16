use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use adlc_schemas::AdKind;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Durable last-shown timestamps keyed by kind. Last write wins.
pub trait CooldownStore: Send + Sync {
    fn load_all(&self) -> Result<BTreeMap<AdKind, DateTime<Utc>>>;

    fn load(&self, kind: AdKind) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load_all()?.get(&kind).copied())
    }

    fn store(&self, kind: AdKind, at: DateTime<Utc>) -> Result<()>;

    /// Remove one kind's record, or every record when `kind` is `None`.
    fn clear(&self, kind: Option<AdKind>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryCooldownStore {
    records: Mutex<BTreeMap<AdKind, DateTime<Utc>>>,
}

impl MemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<AdKind, DateTime<Utc>>>> {
        self.records
            .lock()
            .map_err(|_| anyhow!("cooldown store mutex poisoned"))
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn load_all(&self) -> Result<BTreeMap<AdKind, DateTime<Utc>>> {
        Ok(self.lock()?.clone())
    }

    fn store(&self, kind: AdKind, at: DateTime<Utc>) -> Result<()> {
        self.lock()?.insert(kind, at);
        Ok(())
    }

    fn clear(&self, kind: Option<AdKind>) -> Result<()> {
        let mut records = self.lock()?;
        match kind {
            Some(k) => {
                records.remove(&k);
            }
            None => records.clear(),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CooldownFile {
    schema_version: u32,
    last_shown: BTreeMap<AdKind, DateTime<Utc>>,
}

/// One JSON document holding every kind's last-shown timestamp.
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous document intact. A missing file
/// reads as "no records".
#[derive(Debug, Clone)]
pub struct JsonFileCooldownStore {
    path: PathBuf,
}

impl JsonFileCooldownStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<AdKind, DateTime<Utc>>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read cooldown store failed: {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let doc: CooldownFile = serde_json::from_str(&raw)
            .with_context(|| format!("parse cooldown store failed: {}", self.path.display()))?;
        if doc.schema_version != STORE_SCHEMA_VERSION {
            bail!(
                "unsupported cooldown store schema_version {} in {} (expected {})",
                doc.schema_version,
                self.path.display(),
                STORE_SCHEMA_VERSION
            );
        }
        Ok(doc.last_shown)
    }

    fn write(&self, last_shown: BTreeMap<AdKind, DateTime<Utc>>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("create cooldown store dir failed: {}", dir.display()))?;
        }
        let doc = CooldownFile {
            schema_version: STORE_SCHEMA_VERSION,
            last_shown,
        };
        let json = serde_json::to_string_pretty(&doc).context("serialize cooldown store failed")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)
            .with_context(|| format!("write cooldown store failed: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace cooldown store failed: {}", self.path.display()))?;
        Ok(())
    }
}

impl CooldownStore for JsonFileCooldownStore {
    fn load_all(&self) -> Result<BTreeMap<AdKind, DateTime<Utc>>> {
        self.read()
    }

    fn store(&self, kind: AdKind, at: DateTime<Utc>) -> Result<()> {
        let mut records = match self.read() {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "replacing unreadable cooldown store");
                BTreeMap::new()
            }
        };
        records.insert(kind, at);
        self.write(records)
    }

    fn clear(&self, kind: Option<AdKind>) -> Result<()> {
        let records = match kind {
            Some(k) => {
                let mut r = self.read()?;
                r.remove(&k);
                r
            }
            None => BTreeMap::new(),
        };
        self.write(records)
    }
}
