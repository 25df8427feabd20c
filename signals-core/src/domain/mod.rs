//! Domain types for the signal backtester

pub mod bar;
pub mod trade;

pub use bar::{BacktestBar, Bar};
pub use trade::{ExitReason, TradeRecord};
