//! Signals CLI: train a buy-signal classifier and backtest its predictions.
//!
//! Commands:
//! - `train`: fit the classifier on a price CSV and save it as JSON
//! - `predict`: classify every row, run the exit-policy backtest, write results CSV

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use signals_core::{load_csv, simulate};
use signals_runner::runner::{generate_signals, train};
use signals_runner::{
    write_backtest_csv, write_trades_json, GradientBoostingClassifier, PredictOutcome,
    SignalsConfig,
};

#[derive(Parser)]
#[command(
    name = "signals",
    version,
    about = "Train a trading signal model and backtest its buy signals"
)]
struct Cli {
    /// Log level for diagnostics on stderr. RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the classifier and save it to a file.
    Train {
        /// Path to the input CSV file.
        #[arg(long, value_parser = existing_file)]
        input_file: PathBuf,

        /// Path to save the trained model.
        #[arg(long)]
        model_file: PathBuf,

        /// Optional TOML config with [model], [training], and [target] sections.
        #[arg(long, value_parser = existing_file)]
        config: Option<PathBuf>,
    },
    /// Generate signals and run a backtest.
    Predict {
        /// Path to the input CSV file.
        #[arg(long, value_parser = existing_file)]
        input_file: PathBuf,

        /// Path to the trained model file.
        #[arg(long, value_parser = existing_file)]
        model_file: PathBuf,

        /// Path to save the output CSV file.
        #[arg(long)]
        output_file: PathBuf,

        /// Optional TOML config; only the [exit] section is used here.
        #[arg(long, value_parser = existing_file)]
        config: Option<PathBuf>,

        /// Also write completed trades and the summary as JSON.
        #[arg(long)]
        trades_file: Option<PathBuf>,
    },
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("path '{s}' does not exist"))
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Train {
            input_file,
            model_file,
            config,
        } => run_train(&input_file, &model_file, config.as_deref()),
        Commands::Predict {
            input_file,
            model_file,
            output_file,
            config,
            trades_file,
        } => run_predict(
            &input_file,
            &model_file,
            &output_file,
            config.as_deref(),
            trades_file.as_deref(),
        ),
    }
}

fn run_train(input_file: &Path, model_file: &Path, config: Option<&Path>) -> Result<()> {
    let config = SignalsConfig::load_or_default(config)?;

    println!("Loading data from {}...", input_file.display());
    let table = load_csv(input_file)?;

    println!("Training model...");
    let outcome = train(&table, &config)?;
    outcome
        .model
        .save(model_file)
        .with_context(|| format!("saving model to {}", model_file.display()))?;
    println!("Model trained and saved to {}", model_file.display());

    match outcome.test_accuracy {
        Some(acc) => println!("Model accuracy on test set: {acc:.2}"),
        None => println!("No rows held out; skipping test accuracy."),
    }
    println!("Training complete.");
    Ok(())
}

fn run_predict(
    input_file: &Path,
    model_file: &Path,
    output_file: &Path,
    config: Option<&Path>,
    trades_file: Option<&Path>,
) -> Result<()> {
    let config = SignalsConfig::load_or_default(config)?;

    println!("Loading data from {}...", input_file.display());
    let table = load_csv(input_file)?;

    println!("Loading model from {}...", model_file.display());
    let model = GradientBoostingClassifier::load(model_file)?;

    println!("Generating predictions...");
    let signals = generate_signals(&table, &model)?;

    println!("Running backtest...");
    let bars = table.bars_with_signals(&signals)?;
    let run = simulate(&bars, &config.exit);
    let outcome = PredictOutcome { signals, run };

    println!();
    println!("{}", outcome.run.summary);
    if let Some(open) = &outcome.run.open_position {
        tracing::warn!(
            entry_index = open.entry_index,
            "position still open at end of data, not counted"
        );
    }

    write_backtest_csv(output_file, &table, &outcome)?;
    if let Some(path) = trades_file {
        write_trades_json(path, &outcome)?;
        println!("Trade log saved to {}", path.display());
    }
    println!("Backtest complete. Results saved to {}", output_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_requires_output_file() {
        let manifest = env!("CARGO_MANIFEST_DIR");
        let result = Cli::try_parse_from([
            "signals",
            "predict",
            "--input-file",
            manifest,
            "--model-file",
            manifest,
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_input_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "signals",
            "train",
            "--input-file",
            "/no/such/file.csv",
            "--model-file",
            "model.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn train_parses_with_existing_input() {
        let cli = Cli::try_parse_from([
            "signals",
            "train",
            "--input-file",
            env!("CARGO_MANIFEST_DIR"),
            "--model-file",
            "model.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Train { config: None, .. }));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn train_then_predict_writes_results() {
        let input = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("signals-core/tests/fixtures/sample_prices.csv");
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        let output = dir.path().join("results.csv");
        let trades = dir.path().join("trades.json");

        run_train(&input, &model, None).unwrap();
        run_predict(&input, &model, &output, None, Some(&trades)).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 161);
        assert!(written
            .lines()
            .next()
            .unwrap()
            .ends_with("Buy_Signal,StopLoss_Price,Target_Price,Sell_Signal,Trade_Result"));
        assert!(trades.exists());
    }
}
