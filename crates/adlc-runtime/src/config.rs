use std::time::Duration;

use adlc_config::{AdsConfig, UnitIds};
use adlc_lifecycle::RetryPolicy;
use adlc_schemas::{AdKind, RequestConfiguration};

/// Controller settings derived from [`AdsConfig`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub units: UnitIds,
    pub retry: RetryPolicy,
    pub cooldown_window: Duration,
    pub init_settle: Duration,
    /// Handed to the provider at initialisation.
    pub request: RequestConfiguration,
    /// Kinds whose unit identifier disagrees with the test/production flag.
    /// Reported once at `init()`.
    pub test_unit_mismatch: Vec<AdKind>,
    /// Hash of the layered config this was built from, logged at `init()`.
    pub config_hash: Option<String>,
}

impl ControllerConfig {
    pub fn from_ads(cfg: &AdsConfig) -> Self {
        Self {
            units: cfg.units.clone(),
            retry: RetryPolicy::new(cfg.retry.floor, cfg.retry.ceiling),
            cooldown_window: cfg.cooldown.window,
            init_settle: cfg.provider.init_settle,
            request: cfg.request,
            test_unit_mismatch: cfg.mismatched_units(),
            config_hash: None,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from_ads(&AdsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlc_schemas::UnitId;

    #[test]
    fn defaults_follow_ads_config() {
        let c = ControllerConfig::default();
        assert_eq!(c.retry.floor(), Duration::from_secs(2));
        assert_eq!(c.retry.ceiling(), Duration::from_secs(30));
        assert_eq!(c.cooldown_window, Duration::from_secs(60));
        assert_eq!(c.init_settle, Duration::from_secs(2));
        assert!(c.test_unit_mismatch.is_empty());
        assert_eq!(c.request, RequestConfiguration::default());
    }

    #[test]
    fn mismatch_is_carried_over() {
        let mut ads = AdsConfig::default();
        ads.using_test_provider = true;
        ads.units.rewarded = UnitId::new("ca-app-pub-1234/5678");
        let c = ControllerConfig::from_ads(&ads);
        assert_eq!(c.test_unit_mismatch, vec![AdKind::Rewarded]);
    }
}
