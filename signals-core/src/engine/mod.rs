//! Backtest engine: exit policy, single-pass simulator, summary metrics.

pub mod policy;
pub mod simulator;
pub mod summary;

pub use policy::{ExitPolicy, OpenPosition, PolicyError};
pub use simulator::{run_backtest, simulate, BacktestRun};
pub use summary::Summary;
