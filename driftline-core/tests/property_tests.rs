//! Property-based tests for the execution engine invariants.

use chrono::{TimeZone, Utc};
use driftline_core::config::ExecutionConfig;
use driftline_core::domain::{ExitReason, Side, TradeId};
use driftline_core::execution::ExecutionEngine;
use proptest::prelude::*;

fn engine(sl_atr_mult: f64, tp_r_mult: f64) -> ExecutionEngine {
    ExecutionEngine::new(ExecutionConfig { sl_atr_mult, tp_r_mult, time_stop_bars: 1_000 })
}

proptest! {
    /// Bracket invariant: stop < entry < target for longs, mirrored for
    /// shorts, for any usable inputs.
    #[test]
    fn bracket_invariant_holds_at_open(
        price in 0.5f64..500.0,
        atr in 1e-6f64..10.0,
        risk in 1.0f64..10_000.0,
        sl_mult in 0.5f64..5.0,
        tp_mult in 0.5f64..5.0,
        is_long in any::<bool>(),
    ) {
        let mut eng = engine(sl_mult, tp_mult);
        let side = if is_long { Side::Long } else { Side::Short };
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let pos = eng.open(TradeId(1), "X", side, ts, price, atr, risk).unwrap();

        prop_assert!(pos.levels_are_sane());
        prop_assert!(pos.size > 0.0);
    }

    /// A stop exit realizes a loss of exactly the risked amount, and a
    /// target exit realizes the R-multiple of it, regardless of inputs.
    #[test]
    fn stop_and_target_pnl_match_the_risk_budget(
        price in 0.5f64..500.0,
        atr in 1e-4f64..1.0,
        risk in 1.0f64..1_000.0,
        is_long in any::<bool>(),
    ) {
        let tp_mult = 3.0;
        let side = if is_long { Side::Long } else { Side::Short };
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        // Stop-out bar.
        let mut eng = engine(2.0, tp_mult);
        let pos = eng.open(TradeId(1), "X", side, ts, price, atr, risk).unwrap();
        let (high, low) = match side {
            Side::Long => (price, pos.stop - atr),
            Side::Short => (pos.stop + atr, price),
        };
        let out = eng.advance("X", ts, high, low, price);
        prop_assert_eq!(out.exits[0].reason, ExitReason::Sl);
        prop_assert!((out.exits[0].pnl + risk).abs() < 1e-6 * risk.max(1.0));

        // Target bar.
        let mut eng = engine(2.0, tp_mult);
        let pos = eng.open(TradeId(2), "X", side, ts, price, atr, risk).unwrap();
        let (high, low) = match side {
            Side::Long => (pos.target + atr, price),
            Side::Short => (price, pos.target - atr),
        };
        let out = eng.advance("X", ts, high, low, price);
        prop_assert_eq!(out.exits[0].reason, ExitReason::Tp);
        prop_assert!((out.exits[0].pnl - tp_mult * risk).abs() < 1e-6 * risk.max(1.0));
    }

    /// Partition property: every advance returns each open position in
    /// exactly one of still-open or exits.
    #[test]
    fn advance_never_drops_or_duplicates_positions(
        n_positions in 1usize..8,
        high_off in 0.0f64..0.01,
        low_off in 0.0f64..0.01,
    ) {
        let mut eng = engine(2.0, 3.0);
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        for i in 0..n_positions {
            let side = if i % 2 == 0 { Side::Long } else { Side::Short };
            eng.open(TradeId(i as i64), "X", side, ts, 1.2, 0.001, 100.0).unwrap();
        }

        let out = eng.advance("X", ts, 1.2 + high_off, 1.2 - low_off, 1.2);
        prop_assert_eq!(out.still_open + out.exits.len(), n_positions);
        prop_assert_eq!(eng.open_count(), out.still_open);

        // No duplicate trade ids among the exits.
        let mut ids: Vec<_> = out.exits.iter().map(|e| e.trade_id).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), out.exits.len());
    }

    /// When a bar spans both levels the recorded reason is always SL.
    #[test]
    fn stop_beats_target_in_spanning_bars(
        price in 0.5f64..500.0,
        atr in 1e-4f64..1.0,
        is_long in any::<bool>(),
    ) {
        let side = if is_long { Side::Long } else { Side::Short };
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut eng = engine(2.0, 3.0);
        let pos = eng.open(TradeId(1), "X", side, ts, price, atr, 100.0).unwrap();

        let top = pos.stop.max(pos.target) + atr;
        let bottom = pos.stop.min(pos.target) - atr;
        let out = eng.advance("X", ts, top, bottom, price);
        prop_assert_eq!(out.exits[0].reason, ExitReason::Sl);
    }
}
