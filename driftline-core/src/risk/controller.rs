//! Risk controller: equity, intraday drawdown, sticky daily halt.

use crate::config::RiskConfig;
use serde::{Deserialize, Serialize};

/// Tracks equity against a start-of-day baseline and derives the halt
/// flag and per-trade risk budget.
///
/// The halt is sticky: once set it survives any intraday equity recovery
/// and is cleared only by [`reset_day`]. Drawdown is measured from the
/// intraday baseline, never all-time equity, so losses never compound
/// across days toward the same halt.
///
/// [`reset_day`]: RiskController::reset_day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskController {
    cfg: RiskConfig,
    equity: f64,
    day_start_equity: f64,
    halted: bool,
}

impl RiskController {
    pub fn new(cfg: RiskConfig) -> Self {
        let equity = cfg.starting_equity;
        Self { cfg, equity, day_start_equity: equity, halted: false }
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Fractional drawdown from the start-of-day baseline. Negative while
    /// underwater.
    pub fn day_drawdown(&self) -> f64 {
        (self.equity - self.day_start_equity) / self.day_start_equity
    }

    /// Rebase the daily baseline to current equity and clear the halt.
    /// Called exactly once per calendar-day rollover; the caller detects
    /// the rollover from bar timestamps.
    pub fn reset_day(&mut self) {
        self.day_start_equity = self.equity;
        self.halted = false;
    }

    /// Set equity and re-derive the halt flag.
    pub fn update_equity(&mut self, new_equity: f64) {
        self.equity = new_equity;
        if self.day_drawdown() <= -self.cfg.daily_max_loss {
            self.halted = true;
        }
    }

    /// False while halted. Re-checks the drawdown condition so a breach
    /// is caught even when equity moved without an `update_equity` call.
    pub fn can_trade(&mut self) -> bool {
        if self.halted {
            return false;
        }
        if self.day_drawdown() <= -self.cfg.daily_max_loss {
            self.halted = true;
            return false;
        }
        true
    }

    /// Per-trade risk budget, recomputed from current equity on every
    /// call so sizing compounds and shrinks with equity.
    pub fn risk_amount(&self) -> f64 {
        self.equity * self.cfg.risk_per_trade
    }
}
