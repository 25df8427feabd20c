//! Bar: one row of the price series, before and after simulation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::trade::ExitReason;

/// A single price bar carrying the classifier's buy flag.
///
/// `index` is the 0-based position in the series and doubles as time order.
/// Bars are never reordered or dropped by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub index: usize,
    pub date: NaiveDateTime,
    pub close: f64,
    pub high: f64,
    pub buy_signal: bool,
}

/// A bar augmented with the fields the simulator derives.
///
/// All derived fields start at zero/false; only entry bars get exit levels and
/// only exit bars get a sell flag and a trade result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestBar {
    pub bar: Bar,
    pub stop_loss_price: f64,
    pub target_price: f64,
    pub sell_signal: bool,
    pub trade_result: f64,
    pub exit_reason: Option<ExitReason>,
}

impl BacktestBar {
    pub fn new(bar: Bar) -> Self {
        Self {
            bar,
            stop_loss_price: 0.0,
            target_price: 0.0,
            sell_signal: false,
            trade_result: 0.0,
            exit_reason: None,
        }
    }

    pub fn is_entry(&self) -> bool {
        self.target_price != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            index: 0,
            date: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            close: 100.0,
            high: 101.5,
            buy_signal: true,
        }
    }

    #[test]
    fn derived_fields_start_at_zero() {
        let out = BacktestBar::new(sample_bar());
        assert_eq!(out.stop_loss_price, 0.0);
        assert_eq!(out.target_price, 0.0);
        assert!(!out.sell_signal);
        assert_eq!(out.trade_result, 0.0);
        assert!(out.exit_reason.is_none());
        assert!(!out.is_entry());
    }
}
