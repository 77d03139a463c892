//! Validated configuration for the engine, risk controller, and guards.
//!
//! Every struct carries fixed defaults and a `validate()` that rejects
//! non-finite or out-of-range fields at load time. Malformed values are a
//! `ConfigError`, never silently coerced.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{section}.{field}: value {value} is not finite")]
    NotFinite {
        section: &'static str,
        field: &'static str,
        value: f64,
    },
    #[error("{section}.{field}: {message} (got {value})")]
    OutOfRange {
        section: &'static str,
        field: &'static str,
        message: &'static str,
        value: f64,
    },
}

fn require_finite(
    section: &'static str,
    field: &'static str,
    value: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { section, field, value })
    }
}

fn require(
    section: &'static str,
    field: &'static str,
    value: f64,
    ok: bool,
    message: &'static str,
) -> Result<(), ConfigError> {
    require_finite(section, field, value)?;
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { section, field, message, value })
    }
}

/// Stop/target/time-stop parameters for the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Stop distance as a multiple of ATR.
    pub sl_atr_mult: f64,
    /// Target distance as a multiple of the stop distance (R-multiple).
    pub tp_r_mult: f64,
    /// Exit at close after this many bars held without hitting a level.
    pub time_stop_bars: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { sl_atr_mult: 2.0, tp_r_mult: 3.0, time_stop_bars: 24 }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("execution", "sl_atr_mult", self.sl_atr_mult, self.sl_atr_mult > 0.0, "must be > 0")?;
        require("execution", "tp_r_mult", self.tp_r_mult, self.tp_r_mult > 0.0, "must be > 0")?;
        require(
            "execution",
            "time_stop_bars",
            self.time_stop_bars as f64,
            self.time_stop_bars >= 1,
            "must be >= 1",
        )
    }
}

/// Equity and drawdown parameters for the risk controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    pub starting_equity: f64,
    /// Fractional intraday drawdown that halts trading for the day.
    pub daily_max_loss: f64,
    /// Fraction of current equity risked per trade.
    pub risk_per_trade: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self { starting_equity: 10_000.0, daily_max_loss: 0.05, risk_per_trade: 0.01 }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(
            "risk",
            "starting_equity",
            self.starting_equity,
            self.starting_equity > 0.0,
            "must be > 0",
        )?;
        require(
            "risk",
            "daily_max_loss",
            self.daily_max_loss,
            self.daily_max_loss > 0.0 && self.daily_max_loss < 1.0,
            "must be in (0, 1)",
        )?;
        require(
            "risk",
            "risk_per_trade",
            self.risk_per_trade,
            self.risk_per_trade > 0.0 && self.risk_per_trade < 1.0,
            "must be in (0, 1)",
        )
    }
}

/// Regime filter: trend/range classification from the baseline slope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegimeConfig {
    pub enabled: bool,
    /// Minimum one-bar baseline slope, as a fraction of ATR, to call the
    /// market trending.
    pub slope_min_atr_frac: f64,
    /// Minimum ADX for a trend call when an ADX reading is supplied.
    pub adx_min_trend: f64,
    /// Permit entries while the regime is classified as range.
    pub allow_range_trades: bool,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slope_min_atr_frac: 0.05,
            adx_min_trend: 18.0,
            allow_range_trades: false,
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(
            "regime",
            "slope_min_atr_frac",
            self.slope_min_atr_frac,
            self.slope_min_atr_frac >= 0.0,
            "must be >= 0",
        )?;
        require(
            "regime",
            "adx_min_trend",
            self.adx_min_trend,
            self.adx_min_trend >= 0.0,
            "must be >= 0",
        )
    }
}

/// Volatility filter: ATR floor/ceiling and spike z-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolatilityConfig {
    pub enabled: bool,
    pub atr_min: f64,
    pub atr_max: f64,
    pub block_on_spike: bool,
    pub vol_spike_z: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            atr_min: 0.0,
            atr_max: 1e9,
            block_on_spike: true,
            vol_spike_z: 2.5,
        }
    }
}

impl VolatilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("volatility", "atr_min", self.atr_min, self.atr_min >= 0.0, "must be >= 0")?;
        require(
            "volatility",
            "atr_max",
            self.atr_max,
            self.atr_max >= self.atr_min,
            "must be >= atr_min",
        )?;
        require_finite("volatility", "vol_spike_z", self.vol_spike_z)
    }
}

/// Trend guard: directional confirmation against the trend baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrendConfig {
    pub enabled: bool,
    pub require_price_above_trend_for_long: bool,
    pub require_price_below_trend_for_short: bool,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_price_above_trend_for_long: true,
            require_price_below_trend_for_short: true,
        }
    }
}

/// Clustered-entry guard: cooldowns, same-side streaks, loss-streak pauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    pub enabled: bool,
    /// Bars after any closed trade during which no new entry is admitted.
    pub cooldown_bars: u32,
    /// Maximum consecutive same-side entries inside the streak window.
    pub max_same_side_entries: u32,
    /// Streak window length in bars.
    pub window_bars: u32,
    /// Consecutive losses that trigger a pause.
    pub block_after_losses: u32,
    /// Pause length in bars once the loss streak triggers.
    pub pause_bars_after_loss_streak: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_bars: 2,
            max_same_side_entries: 2,
            window_bars: 12,
            block_after_losses: 2,
            pause_bars_after_loss_streak: 8,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(
            "clustered_entries",
            "max_same_side_entries",
            self.max_same_side_entries as f64,
            self.max_same_side_entries >= 1,
            "must be >= 1",
        )?;
        require(
            "clustered_entries",
            "block_after_losses",
            self.block_after_losses as f64,
            self.block_after_losses >= 1,
            "must be >= 1",
        )
    }
}

/// Every guard plus the base signal threshold, bundled for the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    /// Probability threshold for the base directional signal. Long requires
    /// `prob_up >= prob_threshold`; short requires `1 - prob_up >= prob_threshold`.
    pub prob_threshold: f64,
    pub regime: RegimeConfig,
    pub volatility: VolatilityConfig,
    pub trend: TrendConfig,
    pub clustered_entries: ClusterConfig,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            prob_threshold: 0.55,
            regime: RegimeConfig::default(),
            volatility: VolatilityConfig::default(),
            trend: TrendConfig::default(),
            clustered_entries: ClusterConfig::default(),
        }
    }
}

impl GuardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(
            "guards",
            "prob_threshold",
            self.prob_threshold,
            self.prob_threshold >= 0.5 && self.prob_threshold <= 1.0,
            "must be in [0.5, 1]",
        )?;
        self.regime.validate()?;
        self.volatility.validate()?;
        self.clustered_entries.validate()
    }
}
