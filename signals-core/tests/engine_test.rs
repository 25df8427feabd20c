//! Scenario tests for the backtest simulator.
//!
//! Each test builds a short bar series by hand and checks the derived
//! columns and the summary against values worked out on paper.

use chrono::{Duration, NaiveDate};
use signals_core::{run_backtest, Bar, ExitReason, Summary};

fn bars(rows: &[(f64, f64, bool)]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    rows.iter()
        .enumerate()
        .map(|(index, &(close, high, buy_signal))| Bar {
            index,
            date: start + Duration::days(index as i64),
            close,
            high,
            buy_signal,
        })
        .collect()
}

#[test]
fn output_preserves_length_and_order() {
    let input = bars(&[
        (100.0, 100.5, true),
        (100.2, 100.9, false),
        (99.0, 99.5, false),
        (101.0, 101.2, true),
    ]);
    let run = run_backtest(&input);
    assert_eq!(run.bars.len(), input.len());
    for (out, original) in run.bars.iter().zip(&input) {
        assert_eq!(&out.bar, original);
    }
}

#[test]
fn entry_at_100_sets_exact_levels() {
    let run = run_backtest(&bars(&[(100.0, 100.0, true)]));
    assert_eq!(run.bars[0].stop_loss_price, 99.0);
    assert_eq!(run.bars[0].target_price, 103.0);
}

#[test]
fn simultaneous_target_and_stop_books_target() {
    let run = run_backtest(&bars(&[(100.0, 100.0, true), (98.9, 103.0, false)]));
    let exit = &run.bars[1];
    assert!(exit.sell_signal);
    assert_eq!(exit.exit_reason, Some(ExitReason::Target));
    assert!((exit.trade_result - 3.0).abs() < 1e-12);
}

#[test]
fn timeout_is_k_plus_two_not_one_or_three() {
    let run = run_backtest(&bars(&[
        (100.0, 100.0, true),
        (100.1, 100.3, false),
        (99.6, 100.2, false),
        (99.8, 100.0, false),
    ]));
    assert!(!run.bars[1].sell_signal);
    assert!(run.bars[2].sell_signal);
    assert_eq!(run.bars[2].exit_reason, Some(ExitReason::Timeout));
    assert!((run.bars[2].trade_result - (99.6 - 100.0)).abs() < 1e-9);
    assert!(!run.bars[3].sell_signal);
}

#[test]
fn same_bar_entry_and_target_exit() {
    let run = run_backtest(&bars(&[(100.0, 100.0, false), (50.0, 60.0, true)]));
    let entry = &run.bars[1];
    assert!((entry.target_price - 51.5).abs() < 1e-12);
    assert!(entry.sell_signal);
    assert!((entry.trade_result - 1.5).abs() < 1e-12);
}

#[test]
fn last_bar_entry_dangles() {
    let run = run_backtest(&bars(&[(100.0, 100.0, false), (100.0, 101.0, true)]));
    assert!(!run.bars[1].sell_signal);
    assert_eq!(run.bars[1].target_price, 103.0);
    assert!(run.open_position.is_some());
    assert!(!run.summary.has_trades());
}

#[test]
fn summary_over_three_trades() {
    // Trade 1: target (+3), trade 2: stop (-0.99), trade 3: timeout (+0.5)
    let run = run_backtest(&bars(&[
        (100.0, 100.0, true),
        (101.0, 103.2, false),
        (99.0, 99.0, true),
        (97.0, 98.0, false),
        (100.0, 100.0, true),
        (100.2, 100.4, false),
        (100.5, 101.0, false),
    ]));
    assert_eq!(run.summary.total_trades, 3);
    let reasons: Vec<ExitReason> = run.trades.iter().map(|t| t.reason).collect();
    assert_eq!(
        reasons,
        vec![ExitReason::Target, ExitReason::StopLoss, ExitReason::Timeout]
    );
    assert!((run.summary.win_rate - 2.0 / 3.0).abs() < 1e-12);
    let expected = 3.0 + (99.0 * 0.99 - 99.0) + 0.5;
    assert!((run.summary.total_pnl - expected).abs() < 1e-9);
    assert_eq!(run.summary, Summary::from_bars(&run.bars));
}

#[test]
fn no_buy_signals_means_no_trades() {
    let run = run_backtest(&bars(&[(100.0, 110.0, false), (90.0, 91.0, false)]));
    assert_eq!(run.summary.total_trades, 0);
    assert_eq!(run.summary.win_rate, 0.0);
    assert_eq!(
        run.summary.to_string(),
        "No trades were executed in the backtest."
    );
}

#[test]
fn empty_series() {
    let run = run_backtest(&[]);
    assert!(run.bars.is_empty());
    assert!(run.trades.is_empty());
    assert!(!run.summary.has_trades());
}

#[test]
fn trade_records_match_sell_bars() {
    let run = run_backtest(&bars(&[
        (100.0, 100.0, true),
        (101.0, 103.2, false),
        (101.0, 101.0, true),
        (99.0, 101.5, false),
    ]));
    let sell_idx: Vec<usize> = run
        .bars
        .iter()
        .filter(|b| b.sell_signal)
        .map(|b| b.bar.index)
        .collect();
    let trade_idx: Vec<usize> = run.trades.iter().map(|t| t.exit_index).collect();
    assert_eq!(sell_idx, trade_idx);
    for t in &run.trades {
        assert_eq!(run.bars[t.exit_index].trade_result, t.trade_result);
        assert!(run.bars[t.entry_index].is_entry());
    }
}
