//! CSV loading for price series.
//!
//! The loader is a validated passthrough: it checks that the required columns
//! exist, parses `Date` into a timestamp and `Close`/`High` into floats, and
//! keeps every other cell verbatim so the output file can reproduce the input
//! table alongside the derived backtest columns.

use chrono::NaiveDateTime;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::data::schema::{parse_timestamp, ColumnLayout};
use crate::domain::Bar;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("input file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    #[error("input CSV must contain the columns Date, Close, High (missing: {})", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: column '{column}' is not numeric: '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("got {signals} signals for {rows} rows")]
    SignalLengthMismatch { signals: usize, rows: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded price file: raw cells plus the parsed required columns.
#[derive(Debug, Clone)]
pub struct PriceTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    dates: Vec<NaiveDateTime>,
    close: Vec<f64>,
    high: Vec<f64>,
}

/// Load a price table from a CSV file.
pub fn load_csv(path: &Path) -> Result<PriceTable, DataError> {
    if !path.exists() {
        return Err(DataError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => DataError::Io(e),
    })?;
    let table = PriceTable::from_reader(file)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers().len(),
        "loaded price table"
    );
    Ok(table)
}

impl PriceTable {
    /// Parse a price table from any CSV source with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();
        let layout = ColumnLayout::resolve(&headers)
            .map_err(|missing| DataError::MissingColumns { missing })?;

        let mut rows = Vec::new();
        let mut dates = Vec::new();
        let mut close = Vec::new();
        let mut high = Vec::new();

        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(String::from).collect();

            let raw_date = &cells[layout.date];
            let date = parse_timestamp(raw_date).ok_or_else(|| DataError::InvalidDate {
                row,
                value: raw_date.clone(),
            })?;
            dates.push(date);
            close.push(parse_price(&cells, layout.close, &headers, row)?);
            high.push(parse_price(&cells, layout.high, &headers, row)?);
            rows.push(cells);
        }

        Ok(Self {
            headers,
            rows,
            dates,
            close,
            high,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Raw cells of one row, in header order.
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn dates(&self) -> &[NaiveDateTime] {
        &self.dates
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    /// Position of a column by name (case-insensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Values of a column if every non-empty cell parses as a float.
    ///
    /// Empty cells become NaN. Returns `None` for a missing or non-numeric column.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .map(|cells| parse_cell(&cells[idx]))
            .collect()
    }

    /// Names of every column whose cells are all numeric, in header order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.rows.iter().all(|cells| parse_cell(&cells[*idx]).is_some()))
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Build simulator input by pairing each row with its buy flag.
    pub fn bars_with_signals(&self, signals: &[bool]) -> Result<Vec<Bar>, DataError> {
        if signals.len() != self.len() {
            return Err(DataError::SignalLengthMismatch {
                signals: signals.len(),
                rows: self.len(),
            });
        }
        Ok(signals
            .iter()
            .enumerate()
            .map(|(index, &buy_signal)| Bar {
                index,
                date: self.dates[index],
                close: self.close[index],
                high: self.high[index],
                buy_signal,
            })
            .collect())
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}

fn parse_price(
    cells: &[String],
    idx: usize,
    headers: &[String],
    row: usize,
) -> Result<f64, DataError> {
    cells[idx]
        .trim()
        .parse::<f64>()
        .map_err(|_| DataError::InvalidNumber {
            row,
            column: headers[idx].clone(),
            value: cells[idx].clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Volume,Symbol
2024-01-02,100.0,101.0,99.0,100.5,1000,SPY
2024-01-03,100.5,102.0,100.0,101.5,1200,SPY
2024-01-04,101.5,103.5,101.0,103.0,,SPY
";

    fn sample_table() -> PriceTable {
        PriceTable::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn parses_required_columns() {
        let table = sample_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.close(), &[100.5, 101.5, 103.0]);
        assert_eq!(table.high(), &[101.0, 102.0, 103.5]);
        assert_eq!(table.dates()[2].to_string(), "2024-01-04 00:00:00");
    }

    #[test]
    fn keeps_raw_cells() {
        let table = sample_table();
        assert_eq!(table.row(0).unwrap()[6], "SPY");
        assert_eq!(table.row(2).unwrap()[5], "");
    }

    #[test]
    fn numeric_columns_skip_text_and_treat_blank_as_nan() {
        let table = sample_table();
        let numeric = table.numeric_columns();
        assert_eq!(numeric, vec!["Open", "High", "Low", "Close", "Volume"]);

        let volume = table.numeric_column("volume").unwrap();
        assert_eq!(volume[0], 1000.0);
        assert!(volume[2].is_nan());
        assert!(table.numeric_column("Symbol").is_none());
        assert!(table.numeric_column("Missing").is_none());
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = PriceTable::from_reader("Date,Open\n2024-01-02,1.0\n".as_bytes()).unwrap_err();
        match err {
            DataError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["Close".to_string(), "High".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_date_is_rejected() {
        let err = PriceTable::from_reader("Date,Close,High\nnot-a-date,1.0,1.0\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidDate { row: 0, .. }));
    }

    #[test]
    fn non_numeric_close_is_rejected() {
        let err = PriceTable::from_reader("Date,Close,High\n2024-01-02,abc,1.0\n".as_bytes())
            .unwrap_err();
        match err {
            DataError::InvalidNumber { row, column, value } => {
                assert_eq!(row, 0);
                assert_eq!(column, "Close");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let table = PriceTable::from_reader("Date,Close,High\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert!(table.bars_with_signals(&[]).unwrap().is_empty());
    }

    #[test]
    fn bars_carry_signals_and_index() {
        let table = sample_table();
        let bars = table.bars_with_signals(&[false, true, false]).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].index, 1);
        assert!(bars[1].buy_signal);
        assert_eq!(bars[1].close, 101.5);
    }

    #[test]
    fn signal_length_must_match() {
        let err = sample_table().bars_with_signals(&[true]).unwrap_err();
        assert!(matches!(
            err,
            DataError::SignalLengthMismatch { signals: 1, rows: 3 }
        ));
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let err = load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DataError::InputNotFound { .. }));
    }
}
