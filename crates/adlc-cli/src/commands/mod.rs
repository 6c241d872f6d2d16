//! Command handler modules for adlc-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod cooldown;
#[cfg(feature = "testkit")]
pub mod simulate;

use adlc_config::{LoadedConfig, UnusedKeyPolicy};
use adlc_schemas::AdKind;
use anyhow::{Context, Result};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    adlc_config::load_layered_yaml(&path_refs)
        .with_context(|| format!("load layered config failed: {}", paths.join(", ")))
}

/// Leaf pointers nothing reads. `strict` turns any hit into an error.
pub fn unused_keys(config_json: &Value, strict: bool) -> Result<Vec<String>> {
    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = adlc_config::report_unused_keys(config_json, policy)?;
    Ok(report.unused_leaf_pointers)
}

/// Parse a CLI `--kind` for cooldown commands. Banner has no cooldown.
pub fn parse_cooldown_kind(kind: Option<&str>) -> Result<Option<AdKind>> {
    let Some(raw) = kind else {
        return Ok(None);
    };
    let kind = AdKind::parse(raw)?;
    if !kind.has_cooldown() {
        anyhow::bail!("invalid --kind '{}': {} has no cooldown", raw, kind);
    }
    Ok(Some(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_kind_rejects_banner() {
        assert_eq!(parse_cooldown_kind(None).unwrap(), None);
        assert_eq!(
            parse_cooldown_kind(Some("Rewarded")).unwrap(),
            Some(AdKind::Rewarded)
        );
        assert!(parse_cooldown_kind(Some("banner")).is_err());
        assert!(parse_cooldown_kind(Some("popup")).is_err());
    }
}
