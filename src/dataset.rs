//! Dataset parsing.

use csv::{ReaderBuilder, Trim};

use crate::error::AnalyticsError;
use crate::record::OrderRecord;
use crate::types::FieldValue;

/// Parse a CSV dataset into order records.
///
/// The first row names the fields. Every value is kept as a string and coerced by the record
/// accessors. Empty cells are omitted, so they read as missing fields.
///
/// # Arguments
///
/// * `data`: CSV bytes, including the header row
///
/// # Errors
///
/// Returns [AnalyticsError::Csv] if the data is not valid CSV, including when a row does not
/// have the same number of fields as the header.
pub fn parse_csv(data: &[u8]) -> Result<Vec<OrderRecord>, AnalyticsError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(data);
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name, FieldValue::from(value)))
            .collect();
        records.push(record);
    }
    Ok(records)
}
