//! CSV ingestion and column validation

pub mod ingest;
pub mod schema;

pub use ingest::{load_csv, DataError, PriceTable};
pub use schema::{parse_timestamp, ColumnLayout, REQUIRED_COLUMNS};
