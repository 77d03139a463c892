//! Indicator series for signal-context production.
//!
//! EMA follows pandas `ewm(span, adjust=False)` semantics (seeded with the
//! first value), since that is what the strategy was tuned against. ATR is
//! the rolling mean of true range; the z-score uses a trailing window with
//! sample standard deviation.

use driftline_core::domain::Bar;

/// Exponential moving average with span semantics: alpha = 2 / (span + 1),
/// seeded at index 0 with the first value. Output is full length.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    assert!(span >= 1, "span must be >= 1");
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if n == 0 {
        return out;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[0];
    out[0] = prev;
    for i in 1..n {
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        out[i] = prev;
    }
    out
}

/// True range series. The first bar has no previous close, so its true
/// range is just high minus low.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];
    if n == 0 {
        return tr;
    }
    tr[0] = bars[0].high - bars[0].low;
    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }
    tr
}

/// ATR: rolling mean of true range over `period` bars. NaN until a full
/// window is available.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    assert!(period >= 1, "period must be >= 1");
    let tr = true_range(bars);
    rolling_mean(&tr, period)
}

/// Rolling mean with a full-window requirement.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 1, "window must be >= 1");
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = slice.iter().sum::<f64>() / window as f64;
    }
    out
}

/// Trailing z-score of each value against its own window (current value
/// included), with sample standard deviation. NaN until a full window is
/// available or while the window is degenerate (zero variance).
pub fn rolling_zscore(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 2, "window must be >= 2");
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window as f64 - 1.0);
        let std = var.sqrt();
        if std > 0.0 {
            out[i] = (values[i] - mean) / std;
        }
    }
    out
}
