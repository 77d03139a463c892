//! Trade persistence seam.
//!
//! The flow mirrors the live system: a trade row is reserved first (so the
//! id exists before the engine accepts the open), then backfilled with the
//! engine-computed levels, then closed with the exit record. An open that
//! the engine refuses is closed immediately as a zero-PnL `NO_ATR` row, so
//! no reserved id is ever left dangling.

use chrono::{DateTime, Utc};
use driftline_core::domain::{ClosedTrade, ExitReason, OpenedTrade, Side, TradeId};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv export failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a trade row is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Reserved,
    Open,
    Closed,
}

/// One persisted trade row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub trade_id: TradeId,
    pub instrument: String,
    pub side: Side,
    pub status: TradeStatus,
    pub entry_ts: DateTime<Utc>,
    pub entry_price: f64,
    pub size: f64,
    pub stop: f64,
    pub target: f64,
    pub exit_ts: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,
    pub pnl: Option<f64>,
    pub reason: Option<ExitReason>,
}

/// One persisted signal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub prob_up: f64,
    pub model: String,
}

/// Persistence seam consumed by the replay loop.
pub trait TradeStore {
    /// Reserve a trade row and return its id. Called before the engine
    /// accepts the open.
    fn reserve(
        &mut self,
        instrument: &str,
        side: Side,
        entry_ts: DateTime<Utc>,
        entry_price: f64,
    ) -> TradeId;

    /// Backfill the reserved row with engine-computed size and levels.
    fn commit_open(&mut self, open: &OpenedTrade);

    /// Record a terminal exit (including synthetic `NO_ATR` aborts).
    fn record_close(&mut self, close: &ClosedTrade);

    /// Record the model output for one instrument at one bar.
    fn save_signal(&mut self, instrument: &str, ts: DateTime<Utc>, prob_up: f64, model: &str);
}

/// In-memory store used for replay and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: i64,
    trades: Vec<TradeRow>,
    signals: Vec<SignalRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trades(&self) -> &[TradeRow] {
        &self.trades
    }

    pub fn signals(&self) -> &[SignalRow] {
        &self.signals
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &TradeRow> {
        self.trades.iter().filter(|t| t.status == TradeStatus::Closed)
    }

    fn row_mut(&mut self, trade_id: TradeId) -> Option<&mut TradeRow> {
        self.trades.iter_mut().find(|t| t.trade_id == trade_id)
    }

    /// Export all trade rows as CSV.
    pub fn export_trades<W: Write>(&self, writer: W) -> Result<(), StoreError> {
        let mut w = csv::Writer::from_writer(writer);
        for row in &self.trades {
            w.serialize(row)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn export_trades_to_path(&self, path: &Path) -> Result<(), StoreError> {
        let file = std::fs::File::create(path)?;
        self.export_trades(file)
    }
}

impl TradeStore for MemoryStore {
    fn reserve(
        &mut self,
        instrument: &str,
        side: Side,
        entry_ts: DateTime<Utc>,
        entry_price: f64,
    ) -> TradeId {
        self.next_id += 1;
        let trade_id = TradeId(self.next_id);
        self.trades.push(TradeRow {
            trade_id,
            instrument: instrument.to_string(),
            side,
            status: TradeStatus::Reserved,
            entry_ts,
            entry_price,
            size: 0.0,
            stop: 0.0,
            target: 0.0,
            exit_ts: None,
            exit_price: None,
            pnl: None,
            reason: None,
        });
        trade_id
    }

    fn commit_open(&mut self, open: &OpenedTrade) {
        if let Some(row) = self.row_mut(open.trade_id) {
            row.status = TradeStatus::Open;
            row.size = open.size;
            row.stop = open.stop;
            row.target = open.target;
        }
    }

    fn record_close(&mut self, close: &ClosedTrade) {
        if let Some(row) = self.row_mut(close.trade_id) {
            row.status = TradeStatus::Closed;
            row.exit_ts = Some(close.exit_ts);
            row.exit_price = Some(close.exit_price);
            row.pnl = Some(close.pnl);
            row.reason = Some(close.reason);
        }
    }

    fn save_signal(&mut self, instrument: &str, ts: DateTime<Utc>, prob_up: f64, model: &str) {
        self.signals.push(SignalRow {
            instrument: instrument.to_string(),
            timestamp: ts,
            prob_up,
            model: model.to_string(),
        });
    }
}
