//! Result export: the annotated price CSV and an optional trade log in JSON.
//!
//! The CSV keeps every input column and cell as read, then appends the
//! backtest columns. An input column whose name collides with a backtest
//! column (say, a file that was already run once) is dropped in favour of
//! the fresh values.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Serialize;
use signals_core::{OpenPosition, PriceTable, Summary, TradeRecord};

use crate::runner::PredictOutcome;

/// Columns appended to the output CSV, in order.
pub const BACKTEST_COLUMNS: [&str; 5] = [
    "Buy_Signal",
    "StopLoss_Price",
    "Target_Price",
    "Sell_Signal",
    "Trade_Result",
];

fn is_backtest_column(name: &str) -> bool {
    BACKTEST_COLUMNS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name.trim()))
}

/// Integral values keep a trailing `.0` so price columns always read as floats.
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn flag(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

/// Render the annotated table as CSV text.
pub fn backtest_csv(table: &PriceTable, outcome: &PredictOutcome) -> Result<String> {
    let bars = &outcome.run.bars;
    ensure!(
        bars.len() == table.len(),
        "backtest has {} bars but the table has {} rows",
        bars.len(),
        table.len()
    );

    let keep: Vec<usize> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_backtest_column(h))
        .map(|(i, _)| i)
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);

    let header = keep
        .iter()
        .map(|&i| table.headers()[i].as_str())
        .chain(BACKTEST_COLUMNS);
    wtr.write_record(header)?;

    for (cells, out) in table.rows().zip(bars) {
        let mut record: Vec<String> = keep
            .iter()
            .map(|&i| cells.get(i).cloned().unwrap_or_default())
            .collect();
        record.push(flag(out.bar.buy_signal).to_string());
        record.push(format_float(out.stop_loss_price));
        record.push(format_float(out.target_price));
        record.push(flag(out.sell_signal).to_string());
        record.push(format_float(out.trade_result));
        wtr.write_record(&record)?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Write the annotated table to `path`.
pub fn write_backtest_csv(path: &Path, table: &PriceTable, outcome: &PredictOutcome) -> Result<()> {
    let csv = backtest_csv(table, outcome)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = table.len(), "wrote backtest csv");
    Ok(())
}

#[derive(Serialize)]
struct TradeLog<'a> {
    summary: &'a Summary,
    trades: &'a [TradeRecord],
    open_position: Option<&'a OpenPosition>,
}

/// Serialize completed trades, the summary, and any dangling position as pretty JSON.
pub fn trades_json(outcome: &PredictOutcome) -> Result<String> {
    let log = TradeLog {
        summary: &outcome.run.summary,
        trades: &outcome.run.trades,
        open_position: outcome.run.open_position.as_ref(),
    };
    serde_json::to_string_pretty(&log).context("failed to serialize trade log to JSON")
}

pub fn write_trades_json(path: &Path, outcome: &PredictOutcome) -> Result<()> {
    let json = trades_json(outcome)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
