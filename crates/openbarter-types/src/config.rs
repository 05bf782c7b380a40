//! Configuration for the OpenBarter engine.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunables for the trade lifecycle engine and its background reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum card entries per trade side; larger offers are rejected as
    /// validation errors before any state is touched.
    #[serde(default = "default_max_cards_per_side")]
    pub max_cards_per_side: usize,
    /// Interval between background expiry sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_cards_per_side() -> usize {
    constants::DEFAULT_MAX_CARDS_PER_SIDE
}

fn default_sweep_interval_secs() -> u64 {
    constants::DEFAULT_SWEEP_INTERVAL_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cards_per_side: default_max_cards_per_side(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl EngineConfig {
    /// The sweep interval as a [`std::time::Duration`].
    #[must_use]
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_cards_per_side, constants::DEFAULT_MAX_CARDS_PER_SIDE);
        assert_eq!(cfg.sweep_interval_secs, constants::DEFAULT_SWEEP_INTERVAL_SECS);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.max_cards_per_side, constants::DEFAULT_MAX_CARDS_PER_SIDE);
        assert_eq!(
            cfg.sweep_interval(),
            std::time::Duration::from_secs(constants::DEFAULT_SWEEP_INTERVAL_SECS)
        );
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = EngineConfig {
            max_cards_per_side: 10,
            sweep_interval_secs: 5,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_cards_per_side, 10);
        assert_eq!(back.sweep_interval_secs, 5);
    }
}
