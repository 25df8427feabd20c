//! Aggregate metrics over completed trades.
//!
//! The trade set is every bar with a sell flag. A position still open at the
//! end of the series has no sell flag and is not counted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::BacktestBar;

/// Trade count, win rate, and total P&L for one backtest pass.
///
/// With no trades every field is zero and `has_trades()` is false.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_trades: usize,
    /// Fraction of trades with a strictly positive result.
    pub win_rate: f64,
    pub total_pnl: f64,
}

impl Summary {
    /// Aggregate over the sell-signal bars of a simulated series.
    pub fn from_bars(bars: &[BacktestBar]) -> Self {
        let results: Vec<f64> = bars
            .iter()
            .filter(|b| b.sell_signal)
            .map(|b| b.trade_result)
            .collect();
        Self::from_results(&results)
    }

    /// Aggregate over per-trade results.
    pub fn from_results(results: &[f64]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let wins = results.iter().filter(|&&r| r > 0.0).count();
        Self {
            total_trades: results.len(),
            win_rate: wins as f64 / results.len() as f64,
            total_pnl: results.iter().sum(),
        }
    }

    pub fn has_trades(&self) -> bool {
        self.total_trades > 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_trades() {
            return write!(f, "No trades were executed in the backtest.");
        }
        writeln!(f, "--- Backtest Results ---")?;
        writeln!(f, "Total Trades: {}", self.total_trades)?;
        writeln!(f, "Win Rate: {:.2}%", self.win_rate * 100.0)?;
        writeln!(f, "Total Profit/Loss: {:.2}", self.total_pnl)?;
        write!(f, "------------------------")
    }
}
