//! Trend guard: counter-trend protection against the slow baseline.
//!
//! Independent of the regime filter's direction logic; both must agree
//! before an entry is admitted.

use crate::config::TrendConfig;

/// Verdict of one trend-guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendVerdict {
    pub allow_long: bool,
    pub allow_short: bool,
    pub reason: String,
}

/// Blocks longs at or below the trend baseline and shorts at or above it.
/// Each direction requirement is independently toggleable.
#[derive(Debug, Clone)]
pub struct TrendGuard {
    cfg: TrendConfig,
}

impl TrendGuard {
    pub fn new(cfg: TrendConfig) -> Self {
        Self { cfg }
    }

    pub fn decide(&self, price: f64, trend_baseline: f64) -> TrendVerdict {
        if !self.cfg.enabled {
            return TrendVerdict {
                allow_long: true,
                allow_short: true,
                reason: "trend_guard_disabled".into(),
            };
        }

        if !price.is_finite() || !trend_baseline.is_finite() {
            return TrendVerdict {
                allow_long: false,
                allow_short: false,
                reason: "trend_input_unavailable".into(),
            };
        }

        let mut allow_long = true;
        let mut allow_short = true;

        if self.cfg.require_price_above_trend_for_long && price <= trend_baseline {
            allow_long = false;
        }
        if self.cfg.require_price_below_trend_for_short && price >= trend_baseline {
            allow_short = false;
        }

        TrendVerdict { allow_long, allow_short, reason: "trend_guard_ok".into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_above_baseline_allows_long_only() {
        let g = TrendGuard::new(TrendConfig::default());
        let v = g.decide(1.2010, 1.1990);
        assert!(v.allow_long);
        assert!(!v.allow_short);
    }

    #[test]
    fn price_below_baseline_allows_short_only() {
        let g = TrendGuard::new(TrendConfig::default());
        let v = g.decide(1.1970, 1.1990);
        assert!(!v.allow_long);
        assert!(v.allow_short);
    }

    #[test]
    fn price_at_baseline_blocks_both() {
        let g = TrendGuard::new(TrendConfig::default());
        let v = g.decide(1.1990, 1.1990);
        assert!(!v.allow_long);
        assert!(!v.allow_short);
    }

    #[test]
    fn requirements_toggle_independently() {
        let g = TrendGuard::new(TrendConfig {
            enabled: true,
            require_price_above_trend_for_long: false,
            require_price_below_trend_for_short: true,
        });
        let v = g.decide(1.1970, 1.1990);
        assert!(v.allow_long, "long requirement disabled");
        assert!(v.allow_short);
    }

    #[test]
    fn disabled_guard_allows_both() {
        let g = TrendGuard::new(TrendConfig { enabled: false, ..Default::default() });
        let v = g.decide(f64::NAN, f64::NAN);
        assert!(v.allow_long && v.allow_short);
    }

    #[test]
    fn nan_inputs_fail_closed() {
        let g = TrendGuard::new(TrendConfig::default());
        let v = g.decide(f64::NAN, 1.1990);
        assert!(!v.allow_long && !v.allow_short);
    }
}
