//! Typed ads configuration read from the merged config tree.
//!
//! Every field has a default so a partial document is valid. `ads.enabled`
//! defaults to `false`: a build that ships without an explicit opt-in never
//! contacts the provider.

use std::path::PathBuf;
use std::time::Duration;

use adlc_schemas::{AdKind, ContentRating, RequestConfiguration, UnitId};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

pub const DEFAULT_RETRY_FLOOR_MS: u64 = 2_000;
pub const DEFAULT_RETRY_CEILING_MS: u64 = 30_000;
pub const DEFAULT_COOLDOWN_WINDOW_SECS: u64 = 60;
pub const DEFAULT_INIT_SETTLE_MS: u64 = 2_000;
pub const DEFAULT_TRANSIENT_SIGNATURES: &[&str] = &["JavascriptEngine", "Unable to obtain"];
pub const DEFAULT_NO_FILL_CODES: &[i64] = &[3];
pub const DEFAULT_NO_FILL_SIGNATURES: &[&str] = &["No fill"];

/// Unit identifiers per kind. Blank means "do not load this kind".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitIds {
    pub interstitial: UnitId,
    pub rewarded: UnitId,
    pub banner: UnitId,
}

impl UnitIds {
    pub fn for_kind(&self, kind: AdKind) -> &UnitId {
        match kind {
            AdKind::Interstitial => &self.interstitial,
            AdKind::Rewarded => &self.rewarded,
            AdKind::Banner => &self.banner,
        }
    }
}

/// Exponential backoff bounds for transient load failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub floor: Duration,
    pub ceiling: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            floor: Duration::from_millis(DEFAULT_RETRY_FLOOR_MS),
            ceiling: Duration::from_millis(DEFAULT_RETRY_CEILING_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownSettings {
    pub window: Duration,
    /// Durable store location. `None` keeps cooldowns in memory only.
    pub store_path: Option<PathBuf>,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(DEFAULT_COOLDOWN_WINDOW_SECS),
            store_path: None,
        }
    }
}

/// Settings consumed by provider adapters and SDK readiness handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Wait after the provider reports initialised before loads are issued.
    pub init_settle: Duration,
    /// Substrings marking a vendor load error as transient.
    pub transient_signatures: Vec<String>,
    pub no_fill_codes: Vec<i64>,
    pub no_fill_signatures: Vec<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            init_settle: Duration::from_millis(DEFAULT_INIT_SETTLE_MS),
            transient_signatures: to_strings(DEFAULT_TRANSIENT_SIGNATURES),
            no_fill_codes: DEFAULT_NO_FILL_CODES.to_vec(),
            no_fill_signatures: to_strings(DEFAULT_NO_FILL_SIGNATURES),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdsConfig {
    pub ads_enabled: bool,
    pub using_test_provider: bool,
    pub units: UnitIds,
    pub retry: RetrySettings,
    pub cooldown: CooldownSettings,
    pub provider: ProviderSettings,
    /// Audience settings; defaults to the child-safe profile.
    pub request: RequestConfiguration,
}

impl AdsConfig {
    /// Build from canonical config JSON (produced by `load_layered_yaml*`).
    ///
    /// All keys are optional. Present keys must have the right type;
    /// `retry.floor_ms` must be positive and not exceed `retry.ceiling_ms`.
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let ads_enabled = opt_bool(cfg, "/ads/enabled")?.unwrap_or(false);
        let using_test_provider = opt_bool(cfg, "/ads/test_provider")?.unwrap_or(false);

        let units = UnitIds {
            interstitial: UnitId::new(opt_str(cfg, "/ads/units/interstitial")?.unwrap_or_default()),
            rewarded: UnitId::new(opt_str(cfg, "/ads/units/rewarded")?.unwrap_or_default()),
            banner: UnitId::new(opt_str(cfg, "/ads/units/banner")?.unwrap_or_default()),
        };

        let floor_ms = opt_u64(cfg, "/retry/floor_ms")?.unwrap_or(DEFAULT_RETRY_FLOOR_MS);
        let ceiling_ms = opt_u64(cfg, "/retry/ceiling_ms")?.unwrap_or(DEFAULT_RETRY_CEILING_MS);
        if floor_ms == 0 {
            bail!("retry.floor_ms must be > 0");
        }
        if floor_ms > ceiling_ms {
            bail!("retry.floor_ms ({floor_ms}) must not exceed retry.ceiling_ms ({ceiling_ms})");
        }

        let window_secs =
            opt_u64(cfg, "/cooldown/window_secs")?.unwrap_or(DEFAULT_COOLDOWN_WINDOW_SECS);
        let store_path = opt_str(cfg, "/cooldown/store_path")?
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let init_settle_ms =
            opt_u64(cfg, "/provider/init_settle_ms")?.unwrap_or(DEFAULT_INIT_SETTLE_MS);
        let transient_signatures = opt_str_list(cfg, "/provider/transient_signatures")?
            .unwrap_or_else(|| to_strings(DEFAULT_TRANSIENT_SIGNATURES));
        let no_fill_signatures = opt_str_list(cfg, "/provider/no_fill_signatures")?
            .unwrap_or_else(|| to_strings(DEFAULT_NO_FILL_SIGNATURES));
        let no_fill_codes = match cfg.pointer("/provider/no_fill_codes") {
            None | Some(Value::Null) => DEFAULT_NO_FILL_CODES.to_vec(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_i64()
                        .ok_or_else(|| anyhow!("provider.no_fill_codes entries must be integers"))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => bail!("provider.no_fill_codes must be a list of integers"),
        };

        let child_safe = RequestConfiguration::default();
        let max_content_rating = match opt_str(cfg, "/request/max_content_rating")? {
            Some(s) => ContentRating::parse(&s).context("config /request/max_content_rating")?,
            None => child_safe.max_content_rating,
        };
        let request = RequestConfiguration {
            child_directed: opt_bool(cfg, "/request/child_directed")?
                .unwrap_or(child_safe.child_directed),
            under_age_of_consent: opt_bool(cfg, "/request/under_age_of_consent")?
                .unwrap_or(child_safe.under_age_of_consent),
            max_content_rating,
        };

        Ok(Self {
            ads_enabled,
            using_test_provider,
            units,
            retry: RetrySettings {
                floor: std::time::Duration::from_millis(floor_ms),
                ceiling: std::time::Duration::from_millis(ceiling_ms),
            },
            cooldown: CooldownSettings {
                window: Duration::from_secs(window_secs),
                store_path,
            },
            provider: ProviderSettings {
                init_settle: Duration::from_millis(init_settle_ms),
                transient_signatures,
                no_fill_codes,
                no_fill_signatures,
            },
            request,
        })
    }

    /// Kinds whose configured identifier disagrees with `ads.test_provider`:
    /// a vendor test unit in a production build, or a production unit in a
    /// test build. Blank identifiers are skipped.
    pub fn mismatched_units(&self) -> Vec<AdKind> {
        AdKind::ALL
            .into_iter()
            .filter(|k| {
                let id = self.units.for_kind(*k);
                !id.is_blank() && id.is_vendor_test_unit() != self.using_test_provider
            })
            .collect()
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn opt_bool(cfg: &Value, ptr: &str) -> Result<Option<bool>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .with_context(|| format!("config {ptr} must be a boolean")),
    }
}

fn opt_str(cfg: &Value, ptr: &str) -> Result<Option<String>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .with_context(|| format!("config {ptr} must be a string")),
    }
}

fn opt_u64(cfg: &Value, ptr: &str) -> Result<Option<u64>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .with_context(|| format!("config {ptr} must be a non-negative integer")),
    }
}

fn opt_str_list(cfg: &Value, ptr: &str) -> Result<Option<Vec<String>>> {
    match cfg.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .with_context(|| format!("config {ptr} entries must be strings"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => bail!("config {ptr} must be a list of strings"),
    }
}
