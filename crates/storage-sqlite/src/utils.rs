//! Utility functions for SQLite storage operations.
//!
//! Chunking for `IN (...)` queries plus the text encodings used for dates and
//! decimals in the schema.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;
use wealthdesk_core::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper bound on ids bound into one `IN (...)` list. SQLite caps the number of
/// statement parameters (often at 999), and the other filters need a few more.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits `items` into slices no longer than `SQLITE_MAX_PARAMS_CHUNK`.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Dates are stored as `YYYY-MM-DD` text so that string order is date order.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str, column: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        StorageError::CorruptRow(format!("{} holds invalid date '{}': {}", column, value, e)).into()
    })
}

/// Decimals are stored as text to keep full precision.
pub fn parse_decimal(value: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| {
        StorageError::CorruptRow(format!("{} holds invalid decimal '{}': {}", column, value, e))
            .into()
    })
}
