//! TradeRecord: a completed round trip, entry bar to exit bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which exit rule closed the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Bar high reached the target level.
    Target,
    /// Bar close fell to or through the stop level.
    StopLoss,
    /// Holding period elapsed; exited at the bar's close.
    Timeout,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Target => "target",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::Timeout => "timeout",
        }
    }
}

/// Long-only, unit-size round trip. No fees or slippage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_index: usize,
    pub entry_date: NaiveDateTime,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub target_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_date: NaiveDateTime,
    pub exit_price: f64,
    pub reason: ExitReason,

    // ── Result ──
    pub trade_result: f64,
    pub bars_held: usize,
}
