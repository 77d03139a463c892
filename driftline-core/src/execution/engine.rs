//! Position ledger and the per-bar advance state machine.
//!
//! Lifecycle: `NONE -> OPEN` on a successful open (or an immediate abort
//! when the stop distance is unusable) `-> CLOSED(SL|TP|TIME)`, terminal.
//! Exit tie-break inside one bar is stop before target: if both levels are
//! touched, assume the adverse excursion happened first.

use crate::config::ExecutionConfig;
use crate::domain::{ClosedTrade, ExitReason, Position, Side, TradeId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Why an open was refused. Business-rule denials (guard rejections) are
/// not errors; this covers only unusable inputs.
#[derive(Debug, Error, PartialEq)]
pub enum OpenError {
    /// Stop distance `sl_atr_mult * atr` was zero, negative, or not finite.
    /// Zero ATR is unusable, not zero risk.
    #[error("unusable stop distance {dist} (atr={atr})")]
    NoAtr { atr: f64, dist: f64 },
}

/// Outcome of advancing one instrument by one bar.
///
/// Atomic per position: every position that was open going in is counted
/// in `still_open` or appears in exactly one entry of `exits` — never
/// both, never dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceResult {
    pub still_open: usize,
    pub exits: Vec<ClosedTrade>,
}

/// Opens positions with ATR-derived stop/target/size and advances every
/// open position bar by bar. Owns the per-instrument position ledger.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    cfg: ExecutionConfig,
    positions: HashMap<String, Vec<Position>>,
}

impl ExecutionEngine {
    pub fn new(cfg: ExecutionConfig) -> Self {
        Self { cfg, positions: HashMap::new() }
    }

    /// Total open positions across all instruments. Used by the
    /// orchestration loop for the global position cap.
    pub fn open_count(&self) -> usize {
        self.positions.values().map(Vec::len).sum()
    }

    /// Open positions on one instrument, in open order.
    pub fn open_positions(&self, instrument: &str) -> &[Position] {
        self.positions.get(instrument).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Open a position. The trade id comes from the persistence layer,
    /// which reserves the record before the engine accepts it.
    ///
    /// Stop distance is `sl_atr_mult * atr`; size is `risk_amount / dist`
    /// so a stop-out loses exactly `risk_amount` before slippage. Fails
    /// with [`OpenError::NoAtr`] when the distance is unusable, in which
    /// case nothing is appended to the ledger.
    pub fn open(
        &mut self,
        trade_id: TradeId,
        instrument: &str,
        side: Side,
        ts: DateTime<Utc>,
        price: f64,
        atr: f64,
        risk_amount: f64,
    ) -> Result<Position, OpenError> {
        let dist = self.cfg.sl_atr_mult * atr;
        if !(dist > 0.0) || !dist.is_finite() {
            return Err(OpenError::NoAtr { atr, dist });
        }

        let (stop, target) = match side {
            Side::Long => (price - dist, price + self.cfg.tp_r_mult * dist),
            Side::Short => (price + dist, price - self.cfg.tp_r_mult * dist),
        };

        let pos = Position {
            trade_id,
            instrument: instrument.to_string(),
            side,
            entry_ts: ts,
            entry_price: price,
            size: risk_amount / dist,
            stop,
            target,
            bars_held: 0,
        };

        self.positions.entry(instrument.to_string()).or_default().push(pos.clone());
        Ok(pos)
    }

    /// Advance every open position on `instrument` by one bar.
    ///
    /// Per position: increment bars-held, then check the stop (long:
    /// `low <= stop`, short: `high >= stop`), then — only if the stop did
    /// not trigger — the target (long: `high >= target`, short:
    /// `low <= target`), then the time stop at the bar's close. Stop and
    /// target fill at the level itself, not the bar extreme.
    pub fn advance(
        &mut self,
        instrument: &str,
        ts: DateTime<Utc>,
        high: f64,
        low: f64,
        close: f64,
    ) -> AdvanceResult {
        let Some(open) = self.positions.get_mut(instrument) else {
            return AdvanceResult { still_open: 0, exits: Vec::new() };
        };

        let mut still: Vec<Position> = Vec::with_capacity(open.len());
        let mut exits: Vec<ClosedTrade> = Vec::new();

        for mut pos in open.drain(..) {
            pos.bars_held += 1;

            let hit = match pos.side {
                Side::Long => {
                    if low <= pos.stop {
                        Some((pos.stop, ExitReason::Sl))
                    } else if high >= pos.target {
                        Some((pos.target, ExitReason::Tp))
                    } else {
                        None
                    }
                }
                Side::Short => {
                    if high >= pos.stop {
                        Some((pos.stop, ExitReason::Sl))
                    } else if low <= pos.target {
                        Some((pos.target, ExitReason::Tp))
                    } else {
                        None
                    }
                }
            };

            let hit = match hit {
                None if pos.bars_held >= self.cfg.time_stop_bars => {
                    Some((close, ExitReason::Time))
                }
                other => other,
            };

            match hit {
                Some((exit_price, reason)) => {
                    let pnl = match pos.side {
                        Side::Long => (exit_price - pos.entry_price) * pos.size,
                        Side::Short => (pos.entry_price - exit_price) * pos.size,
                    };
                    exits.push(ClosedTrade {
                        trade_id: pos.trade_id,
                        instrument: pos.instrument,
                        side: pos.side,
                        exit_ts: ts,
                        exit_price,
                        pnl,
                        reason,
                    });
                }
                None => still.push(pos),
            }
        }

        let still_open = still.len();
        *open = still;
        AdvanceResult { still_open, exits }
    }
}
