//! Single-pass backtest simulator.
//!
//! Walks bars in index order with two states, `Flat` and `InPosition`. On each
//! bar the entry check runs before the exit check, so a position opened on a
//! bar can also close on that same bar against its freshly set levels.
//!
//! A position still open when the bars run out is left open: it gets no sell
//! flag, no trade result, and does not count toward the summary.

use serde::{Deserialize, Serialize};

use crate::domain::{BacktestBar, Bar, TradeRecord};
use crate::engine::policy::{ExitPolicy, OpenPosition};
use crate::engine::summary::Summary;

/// Output of one simulator pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRun {
    /// Input bars, same order and length, with derived fields filled in.
    pub bars: Vec<BacktestBar>,
    /// Completed round trips in exit order.
    pub trades: Vec<TradeRecord>,
    pub summary: Summary,
    /// Position left open at the end of the series, if any.
    pub open_position: Option<OpenPosition>,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Flat,
    InPosition(OpenPosition),
}

/// Run the simulator with the standard 1% stop / 3% target / 2-bar timeout.
pub fn run_backtest(bars: &[Bar]) -> BacktestRun {
    simulate(bars, &ExitPolicy::default())
}

/// Run the simulator over `bars` under `policy`.
pub fn simulate(bars: &[Bar], policy: &ExitPolicy) -> BacktestRun {
    let mut out: Vec<BacktestBar> = bars.iter().cloned().map(BacktestBar::new).collect();
    let mut trades = Vec::new();
    let mut state = State::Flat;

    for (i, slot) in out.iter_mut().enumerate() {
        if let State::Flat = state {
            if slot.bar.buy_signal {
                let position = policy.open(i, &slot.bar);
                slot.stop_loss_price = position.stop_loss_price;
                slot.target_price = position.target_price;
                tracing::debug!(
                    index = i,
                    entry = position.entry_price,
                    stop = position.stop_loss_price,
                    target = position.target_price,
                    "entry"
                );
                state = State::InPosition(position);
            }
        }

        if let State::InPosition(position) = state {
            if let Some((reason, exit_price)) = policy.check_exit(&position, i, &slot.bar) {
                let trade_result = exit_price - position.entry_price;
                slot.sell_signal = true;
                slot.trade_result = trade_result;
                slot.exit_reason = Some(reason);
                tracing::debug!(index = i, reason = reason.as_str(), trade_result, "exit");

                trades.push(TradeRecord {
                    entry_index: position.entry_index,
                    entry_date: position.entry_date,
                    entry_price: position.entry_price,
                    stop_loss_price: position.stop_loss_price,
                    target_price: position.target_price,
                    exit_index: i,
                    exit_date: slot.bar.date,
                    exit_price,
                    reason,
                    trade_result,
                    bars_held: i - position.entry_index,
                });
                state = State::Flat;
            }
        }
    }

    let open_position = match state {
        State::Flat => None,
        State::InPosition(position) => {
            tracing::debug!(
                entry_index = position.entry_index,
                "position still open at end of data"
            );
            Some(position)
        }
    };

    let summary = Summary::from_bars(&out);
    tracing::info!(
        bars = out.len(),
        trades = summary.total_trades,
        total_pnl = summary.total_pnl,
        "backtest pass complete"
    );

    BacktestRun {
        bars: out,
        trades,
        summary,
        open_position,
    }
}
