//! Training and prediction pipelines over a loaded price table.
//!
//! - `train()`: select features, build labels, fit on the leading rows,
//!   score on the trailing hold-out.
//! - `generate_signals()`: classify every row with a trained model.
//! - `predict()`: generate signals, then run the backtest simulator over them.

use signals_core::{simulate, BacktestRun, DataError, ExitPolicy, PriceTable};
use thiserror::Error;

use crate::config::SignalsConfig;
use crate::features::{select_features, FeatureError, FeatureMatrix};
use crate::model::{GradientBoostingClassifier, ModelError};
use crate::target::create_target;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("feature error: {0}")]
    Features(#[from] FeatureError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("{train_rows} training rows after holding out {test_rows} for testing")]
    NotEnoughRows { train_rows: usize, test_rows: usize },
}

/// Result of a training pass.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: GradientBoostingClassifier,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Positive labels across the whole table.
    pub positive_labels: usize,
    /// Hold-out accuracy; `None` when nothing was held out.
    pub test_accuracy: Option<f64>,
}

/// Result of a prediction pass.
#[derive(Debug, Clone)]
pub struct PredictOutcome {
    /// Buy flag per row, as produced by the model.
    pub signals: Vec<bool>,
    pub run: BacktestRun,
}

/// Rows held out from the tail for `n` rows at `test_fraction`.
pub fn test_rows_for(n: usize, test_fraction: f64) -> usize {
    ((n as f64 * test_fraction).ceil() as usize).min(n)
}

/// Fit a classifier on `table` and score it on the chronological hold-out.
pub fn train(table: &PriceTable, config: &SignalsConfig) -> Result<TrainOutcome, RunError> {
    let names = select_features(table)?;
    let features = FeatureMatrix::from_table(table, &names)?;
    let labels = create_target(table.close(), table.high(), &config.target);
    let positive_labels = labels.iter().filter(|&&y| y).count();

    let test_rows = test_rows_for(table.len(), config.training.test_fraction);
    let train_rows = table.len() - test_rows;
    if train_rows == 0 {
        return Err(RunError::NotEnoughRows {
            train_rows,
            test_rows,
        });
    }

    tracing::info!(
        features = ?names,
        train_rows,
        test_rows,
        positive_labels,
        "training"
    );

    let (x_train, x_test) = features.split_at(train_rows);
    let (y_train, y_test) = labels.split_at(train_rows);
    let model = GradientBoostingClassifier::fit(&x_train, y_train, config.model)?;

    let test_accuracy = if test_rows > 0 {
        Some(model.score(&x_test, y_test)?)
    } else {
        None
    };

    Ok(TrainOutcome {
        model,
        train_rows,
        test_rows,
        positive_labels,
        test_accuracy,
    })
}

/// Classify every row of `table` with `model`, reading the model's own feature list.
pub fn generate_signals(
    table: &PriceTable,
    model: &GradientBoostingClassifier,
) -> Result<Vec<bool>, RunError> {
    let features = FeatureMatrix::from_table(table, model.feature_names())?;
    let signals = model.predict(&features)?;
    tracing::info!(
        rows = signals.len(),
        buy_signals = signals.iter().filter(|&&s| s).count(),
        "generated signals"
    );
    Ok(signals)
}

/// Generate signals and backtest them under `policy`.
pub fn predict(
    table: &PriceTable,
    model: &GradientBoostingClassifier,
    policy: &ExitPolicy,
) -> Result<PredictOutcome, RunError> {
    let signals = generate_signals(table, model)?;
    let bars = table.bars_with_signals(&signals)?;
    let run = simulate(&bars, policy);
    Ok(PredictOutcome { signals, run })
}
