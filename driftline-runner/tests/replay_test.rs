//! End-to-end replay scenarios over scripted bar tapes and signals.

use chrono::{DateTime, TimeZone, Utc};
use driftline_core::domain::{Bar, ExitReason, Side, SignalContext};
use driftline_runner::replay::{run_replay, ReplayError, TickOutcome};
use driftline_runner::store::{MemoryStore, TradeStatus};
use driftline_runner::{PredictError, Predictor, ReplayConfig};
use std::collections::HashMap;

/// Returns scripted contexts keyed by (instrument, tick); everything else
/// gets a neutral no-signal context.
struct ScriptedPredictor {
    signals: HashMap<(String, usize), SignalContext>,
}

impl ScriptedPredictor {
    fn new() -> Self {
        Self { signals: HashMap::new() }
    }

    fn at(mut self, instrument: &str, tick: usize, ctx: SignalContext) -> Self {
        self.signals.insert((instrument.to_string(), tick), ctx);
        self
    }
}

impl Predictor for ScriptedPredictor {
    fn predict(&self, instrument: &str, bars: &[Bar]) -> Result<SignalContext, PredictError> {
        let tick = bars.len() - 1;
        Ok(self
            .signals
            .get(&(instrument.to_string(), tick))
            .cloned()
            .unwrap_or_else(|| neutral_ctx(bars[tick].timestamp)))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn hour(day: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, h, 0, 0).unwrap()
}

fn bar(ts: DateTime<Utc>, high: f64, low: f64, close: f64) -> Bar {
    Bar { timestamp: ts, open: (high + low) / 2.0, high, low, close }
}

fn flat_bar(ts: DateTime<Utc>) -> Bar {
    bar(ts, 1.2005, 1.1995, 1.2000)
}

fn neutral_ctx(ts: DateTime<Utc>) -> SignalContext {
    SignalContext {
        timestamp: ts,
        prob_up: 0.5,
        ema_diff: 0.0,
        trend_baseline: 1.1950,
        trend_baseline_prev: 1.1948,
        atr: 0.0010,
        vol_z: 0.0,
        adx: None,
        close: 1.2000,
    }
}

fn long_ctx(ts: DateTime<Utc>) -> SignalContext {
    SignalContext { prob_up: 0.62, ema_diff: 0.0004, ..neutral_ctx(ts) }
}

fn config(instruments: &[&str]) -> ReplayConfig {
    let mut cfg = ReplayConfig::default();
    cfg.trading.instruments = instruments.iter().map(|s| s.to_string()).collect();
    cfg.trading.warmup_bars = 1;
    cfg
}

fn outcome_at<'a>(
    report: &'a driftline_runner::replay::ReplayReport,
    tick: u64,
    instrument: &str,
) -> &'a TickOutcome {
    &report
        .outcomes
        .iter()
        .find(|r| r.tick == tick && r.instrument == instrument)
        .expect("outcome recorded")
        .outcome
}

#[test]
fn open_then_stop_out_settles_equity_and_ledger() {
    let cfg = config(&["EUR/USD"]);
    let data = HashMap::from([(
        "EUR/USD".to_string(),
        vec![
            flat_bar(hour(15, 0)),
            flat_bar(hour(15, 1)),
            bar(hour(15, 2), 1.2005, 1.1970, 1.1975),
        ],
    )]);
    let predictor = ScriptedPredictor::new().at("EUR/USD", 1, long_ctx(hour(15, 1)));

    let mut store = MemoryStore::new();
    let report = run_replay(&cfg, &data, &predictor, &mut store).unwrap();

    assert!(matches!(outcome_at(&report, 0, "EUR/USD"), TickOutcome::NoEntry { .. }));
    assert!(matches!(
        outcome_at(&report, 1, "EUR/USD"),
        TickOutcome::Opened { side: Side::Long, .. }
    ));
    assert_eq!(report.opened(), 1);

    // One position, opened at tick 1 and first advanced at tick 2 where the
    // stop (1.2000 - 2 * 0.0010) is touched. Size 1% of 10_000 over the
    // 0.0020 stop distance loses exactly the risked 100.
    let row = &store.trades()[0];
    assert_eq!(row.status, TradeStatus::Closed);
    assert_eq!(row.reason, Some(ExitReason::Sl));
    assert_eq!(row.exit_ts, Some(hour(15, 2)));
    assert!((row.stop - 1.1980).abs() < 1e-12);
    assert!((row.size - 50_000.0).abs() < 1e-6);
    assert!((row.pnl.unwrap() + 100.0).abs() < 1e-6);

    assert!((report.final_equity - 9_900.0).abs() < 1e-6);
    assert_eq!(report.equity_curve.last().unwrap().0, hour(15, 2));
    assert!((report.equity_curve.last().unwrap().1 - 9_900.0).abs() < 1e-6);

    // One signal saved per instrument per tick.
    assert_eq!(store.signals().len(), 3);
    assert!(store.signals().iter().all(|s| s.model == "scripted"));
}

#[test]
fn daily_halt_blocks_entries_until_the_next_day() {
    let mut cfg = config(&["EUR/USD"]);
    cfg.risk.daily_max_loss = 0.009; // one stop-out (-1%) halts the day

    let data = HashMap::from([(
        "EUR/USD".to_string(),
        vec![
            flat_bar(hour(15, 0)),
            flat_bar(hour(15, 1)),
            bar(hour(15, 2), 1.2005, 1.1970, 1.1975), // stop-out, halt
            flat_bar(hour(15, 3)),
            flat_bar(hour(16, 0)), // day rollover clears the halt
            flat_bar(hour(16, 1)),
        ],
    )]);
    let predictor = ScriptedPredictor::new()
        .at("EUR/USD", 1, long_ctx(hour(15, 1)))
        .at("EUR/USD", 3, long_ctx(hour(15, 3)))
        .at("EUR/USD", 4, long_ctx(hour(16, 0)))
        .at("EUR/USD", 5, long_ctx(hour(16, 1)));

    let mut store = MemoryStore::new();
    let report = run_replay(&cfg, &data, &predictor, &mut store).unwrap();

    // Same day after the halt: rejected by the risk stage, not the cluster.
    assert_eq!(
        outcome_at(&report, 3, "EUR/USD"),
        &TickOutcome::NoEntry { reason: "daily_loss_halt".into() }
    );
    // Next day the halt is cleared, but the post-trade cooldown (close at
    // tick 2, cooldown 2 bars) still covers tick 4.
    match outcome_at(&report, 4, "EUR/USD") {
        TickOutcome::NoEntry { reason } => {
            assert!(reason.starts_with("cooldown"), "expected cooldown, got {reason}")
        }
        other => panic!("expected NoEntry, got {other:?}"),
    }
    assert!(matches!(
        outcome_at(&report, 5, "EUR/USD"),
        TickOutcome::Opened { side: Side::Long, .. }
    ));
}

#[test]
fn aborted_open_records_no_atr_without_throttling_later_entries() {
    let cfg = config(&["EUR/USD"]);
    let data = HashMap::from([(
        "EUR/USD".to_string(),
        vec![flat_bar(hour(15, 0)), flat_bar(hour(15, 1)), flat_bar(hour(15, 2))],
    )]);
    let zero_atr = SignalContext { atr: 0.0, ..long_ctx(hour(15, 1)) };
    let predictor = ScriptedPredictor::new()
        .at("EUR/USD", 1, zero_atr)
        .at("EUR/USD", 2, long_ctx(hour(15, 2)));

    let mut store = MemoryStore::new();
    let report = run_replay(&cfg, &data, &predictor, &mut store).unwrap();

    assert_eq!(
        outcome_at(&report, 1, "EUR/USD"),
        &TickOutcome::NoEntry { reason: "no_atr".into() }
    );
    let aborted = &store.trades()[0];
    assert_eq!(aborted.status, TradeStatus::Closed);
    assert_eq!(aborted.reason, Some(ExitReason::NoAtr));
    assert_eq!(aborted.pnl, Some(0.0));

    // An aborted open is not a trade: no cooldown, the very next tick opens.
    assert!(matches!(outcome_at(&report, 2, "EUR/USD"), TickOutcome::Opened { .. }));
    assert!((report.final_equity - 10_000.0).abs() < 1e-9);
}

#[test]
fn global_position_cap_skips_later_instruments() {
    let mut cfg = config(&["EUR/USD", "GBP/USD"]);
    cfg.trading.max_open_positions = 1;

    let bars = vec![flat_bar(hour(15, 0)), flat_bar(hour(15, 1))];
    let data = HashMap::from([
        ("EUR/USD".to_string(), bars.clone()),
        ("GBP/USD".to_string(), bars),
    ]);
    let predictor = ScriptedPredictor::new()
        .at("EUR/USD", 1, long_ctx(hour(15, 1)))
        .at("GBP/USD", 1, long_ctx(hour(15, 1)));

    let mut store = MemoryStore::new();
    let report = run_replay(&cfg, &data, &predictor, &mut store).unwrap();

    assert!(matches!(outcome_at(&report, 1, "EUR/USD"), TickOutcome::Opened { .. }));
    assert_eq!(
        outcome_at(&report, 1, "GBP/USD"),
        &TickOutcome::Skipped { reason: "max_open_positions".into() }
    );
    assert_eq!(report.opened(), 1);
}

#[test]
fn replay_is_deterministic() {
    let cfg = config(&["EUR/USD"]);
    let data = HashMap::from([(
        "EUR/USD".to_string(),
        vec![
            flat_bar(hour(15, 0)),
            flat_bar(hour(15, 1)),
            bar(hour(15, 2), 1.2070, 1.1990, 1.2065), // take profit
            flat_bar(hour(15, 3)),
        ],
    )]);
    let predictor = ScriptedPredictor::new().at("EUR/USD", 1, long_ctx(hour(15, 1)));

    let mut store_a = MemoryStore::new();
    let mut store_b = MemoryStore::new();
    let a = run_replay(&cfg, &data, &predictor, &mut store_a).unwrap();
    let b = run_replay(&cfg, &data, &predictor, &mut store_b).unwrap();

    assert_eq!(a, b);
    assert_eq!(store_a.trades(), store_b.trades());
    // Take profit banked 3R on a 1% risk budget.
    assert!((a.final_equity - 10_300.0).abs() < 1e-6);
}

#[test]
fn empty_instrument_list_is_an_error_not_a_panic() {
    let cfg = config(&[]);
    let data = HashMap::from([(
        "EUR/USD".to_string(),
        vec![flat_bar(hour(15, 0))],
    )]);
    let predictor = ScriptedPredictor::new();
    let mut store = MemoryStore::new();
    let err = run_replay(&cfg, &data, &predictor, &mut store).unwrap_err();
    assert!(matches!(err, ReplayError::NoInstruments));
}

#[test]
fn missing_instrument_history_is_an_error() {
    let cfg = config(&["EUR/USD", "GBP/USD"]);
    let data = HashMap::from([(
        "EUR/USD".to_string(),
        vec![flat_bar(hour(15, 0))],
    )]);
    let predictor = ScriptedPredictor::new();
    let mut store = MemoryStore::new();
    let err = run_replay(&cfg, &data, &predictor, &mut store).unwrap_err();
    assert!(matches!(err, ReplayError::MissingHistory(i) if i == "GBP/USD"));
}
