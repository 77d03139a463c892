//! Regime filter: trend/range classification from the baseline slope.

use crate::config::RegimeConfig;
use crate::domain::SignalContext;
use serde::{Deserialize, Serialize};

/// Market state classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Trend,
    Range,
    /// Filter disabled; direction comes from the EMA difference alone.
    None,
}

/// Verdict of one regime evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeDecision {
    pub regime: Regime,
    pub allow_long: bool,
    pub allow_short: bool,
    pub reason: String,
}

/// Classifies the market from the one-bar slope of the slow trend
/// baseline relative to ATR, optionally confirmed by ADX, and gates the
/// entry direction accordingly.
#[derive(Debug, Clone)]
pub struct RegimeFilter {
    cfg: RegimeConfig,
}

impl RegimeFilter {
    pub fn new(cfg: RegimeConfig) -> Self {
        Self { cfg }
    }

    pub fn decide(&self, ctx: &SignalContext) -> RegimeDecision {
        if !self.cfg.enabled {
            let d = if ctx.ema_diff.is_finite() { ctx.ema_diff } else { 0.0 };
            return RegimeDecision {
                regime: Regime::None,
                allow_long: d > 0.0,
                allow_short: d < 0.0,
                reason: "regime_disabled".into(),
            };
        }

        if !ctx.trend_baseline.is_finite() || !ctx.close.is_finite() {
            return RegimeDecision {
                regime: Regime::Range,
                allow_long: false,
                allow_short: false,
                reason: "regime_input_unavailable".into(),
            };
        }

        let baseline_prev = if ctx.trend_baseline_prev.is_finite() {
            ctx.trend_baseline_prev
        } else {
            ctx.trend_baseline
        };
        let atr = if ctx.atr.is_finite() { ctx.atr.max(1e-9) } else { 1e-9 };

        let slope = ctx.trend_baseline - baseline_prev;
        let slope_ok = slope.abs() >= self.cfg.slope_min_atr_frac * atr;
        let adx_ok = match ctx.adx {
            Some(adx) => adx.is_finite() && adx >= self.cfg.adx_min_trend,
            None => true,
        };

        let regime = if slope_ok && adx_ok { Regime::Trend } else { Regime::Range };

        if regime == Regime::Range && !self.cfg.allow_range_trades {
            return RegimeDecision {
                regime,
                allow_long: false,
                allow_short: false,
                reason: "range_blocked".into(),
            };
        }

        let direction = if ctx.ema_diff.is_finite() {
            ctx.ema_diff
        } else {
            ctx.close - ctx.trend_baseline
        };

        RegimeDecision {
            regime,
            allow_long: direction > 0.0,
            allow_short: direction < 0.0,
            reason: format!("{regime:?}: slope_ok={slope_ok}, adx_ok={adx_ok}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ctx(trend_baseline: f64, trend_baseline_prev: f64, atr: f64, ema_diff: f64) -> SignalContext {
        SignalContext {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
            prob_up: 0.6,
            ema_diff,
            trend_baseline,
            trend_baseline_prev,
            atr,
            vol_z: 0.0,
            adx: None,
            close: 1.2000,
        }
    }

    #[test]
    fn steep_slope_classifies_trend() {
        let filter = RegimeFilter::new(RegimeConfig::default());
        // slope = 0.0002, threshold = 0.05 * 0.0010 = 0.00005
        let d = filter.decide(&ctx(1.1950, 1.1948, 0.0010, 0.0004));
        assert_eq!(d.regime, Regime::Trend);
        assert!(d.allow_long);
        assert!(!d.allow_short);
    }

    #[test]
    fn flat_slope_classifies_range_and_blocks_both() {
        let filter = RegimeFilter::new(RegimeConfig::default());
        let d = filter.decide(&ctx(1.1950, 1.19499, 0.0010, 0.0004));
        assert_eq!(d.regime, Regime::Range);
        assert!(!d.allow_long);
        assert!(!d.allow_short);
        assert_eq!(d.reason, "range_blocked");
    }

    #[test]
    fn range_trading_can_be_allowed_explicitly() {
        let cfg = RegimeConfig { allow_range_trades: true, ..Default::default() };
        let filter = RegimeFilter::new(cfg);
        let d = filter.decide(&ctx(1.1950, 1.19499, 0.0010, -0.0004));
        assert_eq!(d.regime, Regime::Range);
        assert!(d.allow_short);
        assert!(!d.allow_long);
    }

    #[test]
    fn adx_below_threshold_downgrades_to_range() {
        let filter = RegimeFilter::new(RegimeConfig::default());
        let mut c = ctx(1.1950, 1.1948, 0.0010, 0.0004);
        c.adx = Some(12.0);
        assert_eq!(filter.decide(&c).regime, Regime::Range);
        c.adx = Some(25.0);
        assert_eq!(filter.decide(&c).regime, Regime::Trend);
    }

    #[test]
    fn disabled_filter_follows_ema_diff_sign() {
        let filter = RegimeFilter::new(RegimeConfig { enabled: false, ..Default::default() });
        let d = filter.decide(&ctx(1.1950, 1.1948, 0.0010, -0.0004));
        assert_eq!(d.regime, Regime::None);
        assert!(!d.allow_long);
        assert!(d.allow_short);
    }

    #[test]
    fn missing_ema_diff_falls_back_to_price_vs_baseline() {
        let filter = RegimeFilter::new(RegimeConfig::default());
        // close 1.2000 > baseline 1.1950 -> long direction
        let d = filter.decide(&ctx(1.1950, 1.1948, 0.0010, f64::NAN));
        assert!(d.allow_long);
        assert!(!d.allow_short);
    }

    #[test]
    fn nan_baseline_fails_closed() {
        let filter = RegimeFilter::new(RegimeConfig::default());
        let d = filter.decide(&ctx(f64::NAN, 1.1948, 0.0010, 0.0004));
        assert!(!d.allow_long);
        assert!(!d.allow_short);
        assert_eq!(d.reason, "regime_input_unavailable");
    }

    #[test]
    fn missing_prev_baseline_reads_as_zero_slope() {
        let filter = RegimeFilter::new(RegimeConfig::default());
        let d = filter.decide(&ctx(1.1950, f64::NAN, 0.0010, 0.0004));
        assert_eq!(d.regime, Regime::Range);
    }
}
