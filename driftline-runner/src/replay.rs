//! Bar-by-bar replay loop.
//!
//! Each tick runs in two phases. Phase one advances every instrument's open
//! positions against its new bar and settles the consequences (persistence,
//! equity, cluster-guard notification) before any entry logic runs. Phase
//! two walks the instruments in configured order and evaluates one entry
//! candidate per instrument. A position opened at tick N therefore sees its
//! first advance at tick N+1, and an exit at tick N already counts against
//! the same tick's entry admission.
//!
//! The first configured instrument is the replay clock: its bar count sets
//! the tick count and its timestamps drive the calendar-day rollover.

use chrono::{DateTime, NaiveDate, Utc};
use driftline_core::domain::{Bar, OpenedTrade, Side, TradeId};
use driftline_core::execution::{ExecutionEngine, OpenError};
use driftline_core::guards::{EntryDecision, EntryPipeline};
use driftline_core::risk::{ClusterGuard, RiskController};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ReplayConfig;
use crate::predictor::{PredictError, Predictor};
use crate::store::TradeStore;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("config names no instruments")]
    NoInstruments,
    #[error("no bar history provided for instrument {0}")]
    MissingHistory(String),
    #[error("bar history for instrument {0} is empty")]
    EmptyHistory(String),
}

/// What happened for one instrument in the entry phase of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A position was opened.
    Opened { trade_id: TradeId, side: Side },
    /// Admission ran and rejected the candidate (or the open was aborted
    /// on an unusable stop distance).
    NoEntry { reason: String },
    /// Admission never ran: warmup, exhausted history, or the global
    /// position cap.
    Skipped { reason: String },
    /// The instrument was faulted for this tick. Other instruments are
    /// unaffected.
    Failed { error: String },
}

/// One entry-phase record.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRecord {
    pub tick: u64,
    pub instrument: String,
    pub outcome: TickOutcome,
}

/// Replay summary. The per-trade ledger lives in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub ticks: u64,
    pub final_equity: f64,
    /// Equity sampled once per tick, after exits settle and before entries.
    pub equity_curve: Vec<(DateTime<Utc>, f64)>,
    pub outcomes: Vec<TickRecord>,
}

impl ReplayReport {
    pub fn opened(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|r| matches!(r.outcome, TickOutcome::Opened { .. }))
            .count()
    }
}

/// Run a full replay over pre-loaded bar histories.
pub fn run_replay<P: Predictor, S: TradeStore>(
    cfg: &ReplayConfig,
    data: &HashMap<String, Vec<Bar>>,
    predictor: &P,
    store: &mut S,
) -> Result<ReplayReport, ReplayError> {
    // Config loading already validates this, but run_replay is public and
    // the clock-instrument lookup below would otherwise index out of bounds.
    if cfg.trading.instruments.is_empty() {
        return Err(ReplayError::NoInstruments);
    }
    for instrument in &cfg.trading.instruments {
        let bars = data
            .get(instrument)
            .ok_or_else(|| ReplayError::MissingHistory(instrument.clone()))?;
        if bars.is_empty() {
            return Err(ReplayError::EmptyHistory(instrument.clone()));
        }
    }

    let clock = &cfg.trading.instruments[0];
    let ticks = data[clock].len() as u64;

    let mut engine = ExecutionEngine::new(cfg.execution.clone());
    let mut risk = RiskController::new(cfg.risk.clone());
    let mut cluster = ClusterGuard::new(cfg.guards.clustered_entries.clone());
    let pipeline = EntryPipeline::new(&cfg.guards);

    let mut current_day: Option<NaiveDate> = None;
    let mut equity_curve: Vec<(DateTime<Utc>, f64)> = Vec::with_capacity(ticks as usize);
    let mut outcomes: Vec<TickRecord> = Vec::new();

    for tick in 0..ticks {
        let clock_bar = &data[clock][tick as usize];
        let day = clock_bar.timestamp.date_naive();
        if current_day != Some(day) {
            risk.reset_day();
            current_day = Some(day);
            info!(%day, equity = risk.equity(), "day rollover");
        }

        // Phase one: advance every instrument and settle exits before any
        // entry is considered.
        let mut faulted: Vec<&str> = Vec::new();
        for instrument in &cfg.trading.instruments {
            let bars = &data[instrument];
            let Some(bar) = bars.get(tick as usize) else { continue };
            if !bar.is_sane() {
                faulted.push(instrument.as_str());
                continue;
            }

            let advanced = engine.advance(instrument, bar.timestamp, bar.high, bar.low, bar.close);
            for exit in &advanced.exits {
                store.record_close(exit);
                let was_halted = risk.halted();
                risk.update_equity(risk.equity() + exit.pnl);
                cluster.on_trade_closed(instrument, exit.side, tick, exit.pnl);
                info!(
                    trade_id = %exit.trade_id,
                    instrument = instrument.as_str(),
                    reason = exit.reason.as_str(),
                    pnl = exit.pnl,
                    equity = risk.equity(),
                    "position closed"
                );
                if risk.halted() && !was_halted {
                    warn!(
                        equity = risk.equity(),
                        drawdown = risk.day_drawdown(),
                        "daily loss limit breached; trading halted until day rollover"
                    );
                }
            }
        }

        equity_curve.push((clock_bar.timestamp, risk.equity()));

        // Phase two: one entry candidate per instrument, in configured order.
        for instrument in &cfg.trading.instruments {
            let bars = &data[instrument];
            let outcome = evaluate_entry(
                cfg,
                instrument,
                tick,
                bars,
                faulted.contains(&instrument.as_str()),
                predictor,
                store,
                &mut engine,
                &mut risk,
                &mut cluster,
                &pipeline,
            );
            outcomes.push(TickRecord { tick, instrument: instrument.clone(), outcome });
        }
    }

    Ok(ReplayReport { ticks, final_equity: risk.equity(), equity_curve, outcomes })
}

#[allow(clippy::too_many_arguments)]
fn evaluate_entry<P: Predictor, S: TradeStore>(
    cfg: &ReplayConfig,
    instrument: &str,
    tick: u64,
    bars: &[Bar],
    faulted: bool,
    predictor: &P,
    store: &mut S,
    engine: &mut ExecutionEngine,
    risk: &mut RiskController,
    cluster: &mut ClusterGuard,
    pipeline: &EntryPipeline,
) -> TickOutcome {
    if faulted {
        return TickOutcome::Failed { error: "insane bar".into() };
    }
    let Some(bar) = bars.get(tick as usize) else {
        return TickOutcome::Skipped { reason: "history_exhausted".into() };
    };

    let history = &bars[..=tick as usize];
    if history.len() < cfg.trading.warmup_bars {
        return TickOutcome::Skipped { reason: "warmup".into() };
    }

    let ctx = match predictor.predict(instrument, history) {
        Ok(ctx) => ctx,
        Err(PredictError::InsufficientHistory { .. }) => {
            return TickOutcome::Skipped { reason: "insufficient_history".into() };
        }
    };
    store.save_signal(instrument, ctx.timestamp, ctx.prob_up, predictor.model_name());

    if engine.open_count() >= cfg.trading.max_open_positions {
        debug!(instrument, tick, "global position cap reached");
        return TickOutcome::Skipped { reason: "max_open_positions".into() };
    }

    let side = match pipeline.evaluate(instrument, tick, &ctx, risk, cluster) {
        EntryDecision::Open(side) => side,
        EntryDecision::Rejected { stage, reason } => {
            debug!(instrument, tick, ?stage, %reason, "entry rejected");
            return TickOutcome::NoEntry { reason };
        }
    };

    let trade_id = store.reserve(instrument, side, bar.timestamp, bar.close);
    match engine.open(trade_id, instrument, side, bar.timestamp, bar.close, ctx.atr, risk.risk_amount()) {
        Ok(pos) => {
            store.commit_open(&OpenedTrade {
                trade_id,
                instrument: instrument.to_string(),
                side,
                entry_ts: pos.entry_ts,
                entry_price: pos.entry_price,
                size: pos.size,
                stop: pos.stop,
                target: pos.target,
            });
            info!(
                %trade_id,
                instrument,
                side = side.as_str(),
                price = pos.entry_price,
                size = pos.size,
                stop = pos.stop,
                target = pos.target,
                "position opened"
            );
            TickOutcome::Opened { trade_id, side }
        }
        Err(err @ OpenError::NoAtr { .. }) => {
            // Close the reserved row immediately with zero PnL. The cluster
            // guard is not notified: an aborted open is neither a trade nor
            // a loss.
            warn!(%trade_id, instrument, %err, "open aborted");
            store.record_close(&driftline_core::domain::ClosedTrade {
                trade_id,
                instrument: instrument.to_string(),
                side,
                exit_ts: bar.timestamp,
                exit_price: bar.close,
                pnl: 0.0,
                reason: driftline_core::domain::ExitReason::NoAtr,
            });
            TickOutcome::NoEntry { reason: "no_atr".into() }
        }
    }
}
