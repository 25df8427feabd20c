//! Signals Runner: model training, signal generation, and result export.
//!
//! This crate builds on `signals-core` to provide:
//! - Feature selection over the numeric columns of a price table
//! - Lookahead target labels for training
//! - A gradient-boosted stump classifier with JSON persistence
//! - TOML configuration for model, labels, hold-out, and exit policy
//! - Train and predict pipelines, plus CSV/JSON export of backtest results

pub mod config;
pub mod export;
pub mod features;
pub mod model;
pub mod runner;
pub mod target;

pub use config::{ConfigError, SignalsConfig, TrainingConfig};
pub use export::{write_backtest_csv, write_trades_json, BACKTEST_COLUMNS};
pub use features::{select_features, FeatureError, FeatureMatrix, EXCLUDED_COLUMNS};
pub use model::{BoostingParams, GradientBoostingClassifier, ModelError};
pub use runner::{generate_signals, predict, train, PredictOutcome, RunError, TrainOutcome};
pub use target::{create_target, TargetConfig};
