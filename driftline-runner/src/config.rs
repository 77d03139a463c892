//! Replay configuration: TOML surface over the core's validated sections.

use driftline_core::config::{self, ExecutionConfig, GuardConfig, RiskConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] config::ConfigError),
    #[error("trading.instruments must not be empty")]
    NoInstruments,
    #[error("trading.max_open_positions must be >= 1")]
    ZeroMaxOpen,
}

/// Instrument universe and loop-level limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TradingConfig {
    /// Instruments in evaluation order. The first one is the replay clock.
    pub instruments: Vec<String>,
    /// Global cap on simultaneously open positions across instruments.
    pub max_open_positions: usize,
    /// Minimum bars of history before the predictor is consulted.
    pub warmup_bars: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            instruments: vec!["EUR/USD".into(), "GBP/USD".into()],
            max_open_positions: 2,
            warmup_bars: 250,
        }
    }
}

/// Full replay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    pub trading: TradingConfig,
    pub execution: ExecutionConfig,
    pub risk: RiskConfig,
    pub guards: GuardConfig,
}

impl ReplayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trading.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        if self.trading.max_open_positions == 0 {
            return Err(ConfigError::ZeroMaxOpen);
        }
        self.execution.validate()?;
        self.risk.validate()?;
        self.guards.validate()?;
        Ok(())
    }

    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: ReplayConfig = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }

    /// Default config rendered as TOML, for `init-config`.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&ReplayConfig::default())
            .expect("default config serializes")
    }
}
