//! Signals Core: domain types, CSV loading, and the exit-policy backtest simulator.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, simulated bars, trade records)
//! - CSV price loader with required-column validation
//! - Single-pass `Flat`/`InPosition` simulator with target, stop-loss, and timeout exits
//! - Summary metrics over completed trades

pub mod data;
pub mod domain;
pub mod engine;

pub use data::{load_csv, DataError, PriceTable};
pub use domain::{BacktestBar, Bar, ExitReason, TradeRecord};
pub use engine::{
    run_backtest, simulate, BacktestRun, ExitPolicy, OpenPosition, PolicyError, Summary,
};
