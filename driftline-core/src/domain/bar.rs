//! Bar — one OHLC sample for an instrument at a timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLC bar. Timestamps are UTC and must be strictly increasing per
/// instrument; the data loader enforces that at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Basic OHLC sanity: finite fields, high is the top of the range,
    /// low is the bottom.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
