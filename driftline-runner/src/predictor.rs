//! Predictor seam: the external probability model.
//!
//! The core only consumes a [`SignalContext`]; anything that can produce
//! one per instrument per bar plugs in here. `BaselinePredictor` is the
//! built-in deterministic stand-in used for replay: a logistic squash of
//! volatility-normalized EMA divergence instead of a trained model.

use driftline_core::domain::{Bar, SignalContext};
use thiserror::Error;

use crate::indicators::{atr, ema, rolling_zscore};

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    /// Fewer bars than the model's warmup. Non-fatal: the instrument is
    /// skipped for the tick.
    #[error("insufficient history: have {have}, need {need}")]
    InsufficientHistory { have: usize, need: usize },
}

/// Produces the signal context for the latest bar of a history slice.
pub trait Predictor {
    fn predict(&self, instrument: &str, bars: &[Bar]) -> Result<SignalContext, PredictError>;

    /// Label recorded alongside saved signals.
    fn model_name(&self) -> &str;
}

/// Deterministic replay predictor.
///
/// Features mirror the strategy's training pipeline: fast/slow EMAs of
/// close for direction, a slow EMA as the trend baseline, ATR for
/// magnitude, and an ATR z-score for spikes. The probability is
/// `sigmoid(gain * ema_diff / atr_norm)` — monotone in trend strength,
/// 0.5 on a flat tape.
#[derive(Debug, Clone)]
pub struct BaselinePredictor {
    pub fast_span: usize,
    pub slow_span: usize,
    pub trend_span: usize,
    pub atr_period: usize,
    pub vol_window: usize,
    pub min_bars: usize,
    /// Steepness of the logistic mapping from trend strength to probability.
    pub gain: f64,
}

impl Default for BaselinePredictor {
    fn default() -> Self {
        Self {
            fast_span: 20,
            slow_span: 50,
            trend_span: 100,
            atr_period: 14,
            vol_window: 20,
            min_bars: 250,
            gain: 1.5,
        }
    }
}

impl Predictor for BaselinePredictor {
    fn predict(&self, _instrument: &str, bars: &[Bar]) -> Result<SignalContext, PredictError> {
        if bars.len() < self.min_bars {
            return Err(PredictError::InsufficientHistory {
                have: bars.len(),
                need: self.min_bars,
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let last = bars.len() - 1;
        let close = closes[last];

        let fast = ema(&closes, self.fast_span);
        let slow = ema(&closes, self.slow_span);
        let trend = ema(&closes, self.trend_span);
        let atr_series = atr(bars, self.atr_period);
        let vol_z = rolling_zscore(&atr_series, self.vol_window);

        let ema_diff = (fast[last] - slow[last]) / close;
        let atr_now = atr_series[last];
        let atr_norm = atr_now / close;

        let strength = if atr_norm > 0.0 { ema_diff / atr_norm } else { 0.0 };
        let prob_up = 1.0 / (1.0 + (-self.gain * strength).exp());

        Ok(SignalContext {
            timestamp: bars[last].timestamp,
            prob_up,
            ema_diff,
            trend_baseline: trend[last],
            trend_baseline_prev: trend[last - 1],
            atr: atr_now,
            vol_z: vol_z[last],
            adx: None,
            close,
        })
    }

    fn model_name(&self) -> &str {
        "baseline-ema"
    }
}
