//! Volatility filter: ATR floor/ceiling and spike z-score.
//!
//! Non-finite inputs fail closed — a missing ATR is not a quiet market.

use crate::config::VolatilityConfig;

/// Verdict of one volatility evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolVerdict {
    pub allow: bool,
    pub reason: String,
}

impl VolVerdict {
    fn allow(reason: impl Into<String>) -> Self {
        Self { allow: true, reason: reason.into() }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self { allow: false, reason: reason.into() }
    }
}

/// Blocks entries in dead markets (ATR under the floor), excessively
/// volatile markets (ATR over the ceiling), and during volatility spikes
/// (z-score at or above the threshold).
#[derive(Debug, Clone)]
pub struct VolatilityFilter {
    cfg: VolatilityConfig,
}

impl VolatilityFilter {
    pub fn new(cfg: VolatilityConfig) -> Self {
        Self { cfg }
    }

    pub fn decide(&self, atr: f64, vol_z: f64) -> VolVerdict {
        if !self.cfg.enabled {
            return VolVerdict::allow("vol_disabled");
        }

        if !atr.is_finite() {
            return VolVerdict::deny("vol_input_unavailable");
        }
        if atr < self.cfg.atr_min {
            return VolVerdict::deny(format!("atr_too_low<{}", self.cfg.atr_min));
        }
        if atr > self.cfg.atr_max {
            return VolVerdict::deny(format!("atr_too_high>{}", self.cfg.atr_max));
        }

        if self.cfg.block_on_spike {
            if !vol_z.is_finite() {
                return VolVerdict::deny("vol_input_unavailable");
            }
            if vol_z >= self.cfg.vol_spike_z {
                return VolVerdict::deny(format!("vol_spike_z>={}", self.cfg.vol_spike_z));
            }
        }

        VolVerdict::allow("vol_ok")
    }
}
