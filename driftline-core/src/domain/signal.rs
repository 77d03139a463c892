//! SignalContext — the per-instrument, per-bar bundle the predictor hands
//! to the admission pipeline.
//!
//! The core never computes these values; it only branches on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only prediction bundle for one instrument at one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContext {
    pub timestamp: DateTime<Utc>,
    /// Model probability of upward movement over the horizon.
    pub prob_up: f64,
    /// Directional EMA difference (fast minus slow, normalized).
    pub ema_diff: f64,
    /// Slow trend baseline (e.g. a long EMA of close).
    pub trend_baseline: f64,
    /// Previous bar's trend baseline, for the one-bar slope proxy.
    pub trend_baseline_prev: f64,
    /// ATR-based volatility magnitude.
    pub atr: f64,
    /// Volatility z-score (ATR vs. its rolling distribution).
    pub vol_z: f64,
    /// Optional ADX reading; absent means the regime filter's ADX clause
    /// passes unconditionally.
    pub adx: Option<f64>,
    /// Close price of the evaluated bar.
    pub close: f64,
}
