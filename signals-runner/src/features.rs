//! Feature selection and the feature matrix fed to the classifier.
//!
//! Features are chosen once, at training time: every numeric column except the
//! price columns the exit policy reads, the label artifact, and the columns the
//! backtest writes. The chosen names are stored in the model, so prediction
//! always reads exactly the same explicit list.

use signals_core::PriceTable;
use thiserror::Error;

/// Columns that are never used as model inputs (case-insensitive).
pub const EXCLUDED_COLUMNS: [&str; 9] = [
    "Date",
    "Close",
    "High",
    "future_high",
    "Buy_Signal",
    "StopLoss_Price",
    "Target_Price",
    "Sell_Signal",
    "Trade_Result",
];

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("no numeric feature columns besides Date, Close, and High")]
    NoFeatures,

    #[error("feature column '{name}' is missing or not numeric")]
    MissingFeature { name: String },

    #[error("row {row} has {actual} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

pub fn is_excluded(name: &str) -> bool {
    let name = name.trim();
    EXCLUDED_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Numeric, non-excluded columns in header order.
pub fn select_features(table: &PriceTable) -> Result<Vec<String>, FeatureError> {
    let names: Vec<String> = table
        .numeric_columns()
        .into_iter()
        .filter(|name| !is_excluded(name))
        .map(String::from)
        .collect();
    if names.is_empty() {
        return Err(FeatureError::NoFeatures);
    }
    Ok(names)
}

/// Row-major feature values with their column names.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Extract the named columns from a price table.
    pub fn from_table(table: &PriceTable, names: &[String]) -> Result<Self, FeatureError> {
        let columns = names
            .iter()
            .map(|name| {
                table
                    .numeric_column(name)
                    .ok_or_else(|| FeatureError::MissingFeature { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = (0..table.len())
            .map(|i| columns.iter().map(|col| col[i]).collect())
            .collect();
        Ok(Self {
            names: names.to_vec(),
            rows,
        })
    }

    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, FeatureError> {
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != names.len()) {
            return Err(FeatureError::RaggedRow {
                row,
                expected: names.len(),
                actual: r.len(),
            });
        }
        Ok(Self { names, rows })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Split at `at`: rows before go left, the rest go right. Order is kept.
    pub fn split_at(&self, at: usize) -> (Self, Self) {
        let at = at.min(self.rows.len());
        let (head, tail) = self.rows.split_at(at);
        (
            Self {
                names: self.names.clone(),
                rows: head.to_vec(),
            },
            Self {
                names: self.names.clone(),
                rows: tail.to_vec(),
            },
        )
    }

    /// Column-major copy, one vector per feature.
    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.n_features())
            .map(|f| self.rows.iter().map(|r| r[f]).collect())
            .collect()
    }
}
