//! Position — one open trade tracked by the execution engine.

use super::ids::TradeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }
}

/// An open position. Created by [`ExecutionEngine::open`], mutated only by
/// the per-bar advance (bars-held increment), removed from the ledger the
/// instant it exits.
///
/// Invariant: for `Long`, `stop < entry_price < target`; for `Short`,
/// `target < entry_price < stop`. `size` is always positive and immutable
/// after open.
///
/// [`ExecutionEngine::open`]: crate::execution::ExecutionEngine::open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub trade_id: TradeId,
    pub instrument: String,
    pub side: Side,
    pub entry_ts: DateTime<Utc>,
    pub entry_price: f64,
    /// Size in units. Risk per unit equals the stop distance, so a
    /// stop-out loses exactly the risk amount used at open.
    pub size: f64,
    pub stop: f64,
    pub target: f64,
    /// Incremented once per bar evaluated while open.
    pub bars_held: u32,
}

impl Position {
    /// Stop/target bracket sanity for the position's side.
    pub fn levels_are_sane(&self) -> bool {
        match self.side {
            Side::Long => self.stop < self.entry_price && self.entry_price < self.target,
            Side::Short => self.target < self.entry_price && self.entry_price < self.stop,
        }
    }
}
