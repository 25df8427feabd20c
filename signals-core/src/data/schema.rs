//! Required columns and timestamp parsing for input price files.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Date", "Close", "High"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Header positions of the required columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: usize,
    pub close: usize,
    pub high: usize,
}

impl ColumnLayout {
    /// Resolve required columns from a header row (case-insensitive).
    ///
    /// On failure returns every missing column name, not just the first.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self, Vec<String>> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.as_ref().trim().eq_ignore_ascii_case(name))
        };

        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|c| find(c)).collect();
        match positions.as_slice() {
            [Some(date), Some(close), Some(high)] => Ok(Self {
                date: *date,
                close: *close,
                high: *high,
            }),
            _ => Err(REQUIRED_COLUMNS
                .iter()
                .zip(&positions)
                .filter(|(_, pos)| pos.is_none())
                .map(|(name, _)| name.to_string())
                .collect()),
        }
    }
}

/// Parse a timestamp cell. Date-only values land at midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
