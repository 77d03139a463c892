//! Trade records emitted toward the persistence layer.

use super::ids::TradeId;
use super::position::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a trade left the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Stop loss hit. Checked before the target when both are touched in
    /// the same bar.
    Sl,
    /// Take profit hit.
    Tp,
    /// Time stop: held for the configured bar count without hitting a level.
    Time,
    /// Open aborted because the stop distance was unusable (ATR <= 0).
    /// Synthetic terminal record with zero PnL; never entered the ledger.
    NoAtr,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Sl => "SL",
            ExitReason::Tp => "TP",
            ExitReason::Time => "TIME",
            ExitReason::NoAtr => "NO_ATR",
        }
    }
}

/// Emitted on open so persistence can backfill the reserved trade record
/// with the engine-computed levels and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenedTrade {
    pub trade_id: TradeId,
    pub instrument: String,
    pub side: Side,
    pub entry_ts: DateTime<Utc>,
    pub entry_price: f64,
    pub size: f64,
    pub stop: f64,
    pub target: f64,
}

/// Terminal exit record. Exactly one is produced per position; the engine
/// forgets the position the instant this exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub trade_id: TradeId,
    pub instrument: String,
    pub side: Side,
    pub exit_ts: DateTime<Utc>,
    pub exit_price: f64,
    pub pnl: f64,
    pub reason: ExitReason,
}

impl ClosedTrade {
    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }
}
