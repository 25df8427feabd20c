//! Property tests for simulator invariants.
//!
//! Uses proptest to verify:
//! 1. At most one open position: entries and exits strictly alternate
//! 2. Every buy flag seen while flat opens a position
//! 3. Summary is consistent with the sell-flagged bars
//! 4. Holding period never exceeds the timeout

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use signals_core::{run_backtest, Bar, ExitPolicy};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_bar() -> impl Strategy<Value = (f64, f64, bool)> {
    (50.0..150.0_f64, 0.0..0.06_f64, prop::bool::weighted(0.3)).prop_map(|(close, up, buy)| {
        let close = (close * 100.0).round() / 100.0;
        (close, close * (1.0 + up), buy)
    })
}

fn arb_series() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(arb_bar(), 0..120).prop_map(|rows| {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(index, (close, high, buy_signal))| Bar {
                index,
                date: start + Duration::days(index as i64),
                close,
                high,
                buy_signal,
            })
            .collect()
    })
}

proptest! {
    /// Between an entry and its exit, no other entry occurs.
    #[test]
    fn at_most_one_open_position(bars in arb_series()) {
        let run = run_backtest(&bars);
        let mut open = false;
        for b in &run.bars {
            if b.is_entry() {
                prop_assert!(!open, "entry at {} while a position is open", b.bar.index);
                open = true;
            }
            if b.sell_signal {
                prop_assert!(open, "exit at {} while flat", b.bar.index);
                open = false;
            }
        }
        prop_assert_eq!(open, run.open_position.is_some());
    }

    /// A buy flag on a flat bar always produces an entry.
    #[test]
    fn flat_buy_flags_always_enter(bars in arb_series()) {
        let run = run_backtest(&bars);
        let mut open = false;
        for b in &run.bars {
            if !open && b.bar.buy_signal {
                prop_assert!(b.is_entry());
            }
            if b.is_entry() {
                open = true;
            }
            if b.sell_signal {
                open = false;
            }
        }
    }

    /// Summary fields agree with the sell-flagged bars.
    #[test]
    fn summary_matches_sell_bars(bars in arb_series()) {
        let run = run_backtest(&bars);
        let results: Vec<f64> = run.bars.iter().filter(|b| b.sell_signal).map(|b| b.trade_result).collect();
        prop_assert_eq!(run.summary.total_trades, results.len());
        prop_assert_eq!(run.trades.len(), results.len());
        let pnl: f64 = results.iter().sum();
        prop_assert!((run.summary.total_pnl - pnl).abs() < 1e-9);
        if results.is_empty() {
            prop_assert_eq!(run.summary.win_rate, 0.0);
        } else {
            prop_assert!(run.summary.win_rate >= 0.0 && run.summary.win_rate <= 1.0);
        }
    }

    /// No trade is held longer than the timeout, and results are bounded by the levels.
    #[test]
    fn trades_respect_policy_bounds(bars in arb_series()) {
        let policy = ExitPolicy::default();
        let run = run_backtest(&bars);
        for t in &run.trades {
            prop_assert!(t.bars_held <= policy.max_holding_bars);
            prop_assert!(t.trade_result <= t.target_price - t.entry_price + 1e-9);
            prop_assert!(t.trade_result >= t.stop_loss_price - t.entry_price - 1e-9);
        }
    }
}
