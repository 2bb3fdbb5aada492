//! Order records, the input of the aggregation core.

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::AnalyticsError;
use crate::types::field_value::{self, FieldValue};

/// Names of the dataset columns read by the aggregations.
pub mod fields {
    pub const STATUS: &str = "Status";
    pub const AMOUNT: &str = "Amount";
    pub const QTY: &str = "Qty";
    pub const B2B: &str = "B2B";
    pub const FULFILLED_BY: &str = "fulfilled-by";
    pub const SHIP_STATE: &str = "ship-state";
    pub const CATEGORY: &str = "Category";
    pub const SIZE: &str = "Size";
    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const MONTH_NAME: &str = "MonthName";
}

/// Sentinel used for grouping keys that are missing from a record.
pub const UNKNOWN: &str = "Unknown";
/// Year used when a record has no `Year` field.
pub const DEFAULT_YEAR: &str = "2022";
/// Month used when a record has no `Month` field.
pub const DEFAULT_MONTH: &str = "1";

/// Party that fulfilled an order.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Fulfilment {
    Amazon,
    Merchant,
    /// Any other or missing value. Not counted in the fulfilment split.
    Other,
}

/// A single sales order: a mapping of column name to an untyped value.
///
/// Accessors never fail. Malformed values are coerced as described in
/// [field_value](crate::types::field_value).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OrderRecord {
    fields: serde_json::Map<String, FieldValue>,
}

impl OrderRecord {
    /// Return an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the record with a field set.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Return the raw value of a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Number of fields present in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Order status, when it is a string.
    pub fn status(&self) -> Option<&str> {
        self.get(fields::STATUS).and_then(FieldValue::as_str)
    }

    pub fn amount(&self) -> Decimal {
        field_value::to_amount(self.get(fields::AMOUNT))
    }

    pub fn quantity(&self) -> i64 {
        field_value::to_quantity(self.get(fields::QTY))
    }

    /// Whether this is a business (as opposed to consumer) order.
    pub fn is_b2b(&self) -> bool {
        field_value::to_flag(self.get(fields::B2B))
    }

    pub fn fulfilment(&self) -> Fulfilment {
        match self.get(fields::FULFILLED_BY).and_then(FieldValue::as_str) {
            Some("Amazon") => Fulfilment::Amazon,
            Some("Merchant") => Fulfilment::Merchant,
            _ => Fulfilment::Other,
        }
    }

    pub fn ship_state(&self) -> Cow<'_, str> {
        self.text_or_unknown(fields::SHIP_STATE)
    }

    pub fn category(&self) -> Cow<'_, str> {
        self.text_or_unknown(fields::CATEGORY)
    }

    pub fn size(&self) -> Cow<'_, str> {
        self.text_or_unknown(fields::SIZE)
    }

    /// Display label of the order's month.
    pub fn month_name(&self) -> Cow<'_, str> {
        self.text_or_unknown(fields::MONTH_NAME)
    }

    /// Grouping key for the order's month, formatted as `YYYY-MM`.
    ///
    /// The month is left-padded with zeros to two characters, so lexicographic order of keys
    /// matches chronological order.
    pub fn year_month(&self) -> String {
        let year = field_value::to_calendar_part(self.get(fields::YEAR))
            .unwrap_or(Cow::Borrowed(DEFAULT_YEAR));
        let month = field_value::to_calendar_part(self.get(fields::MONTH))
            .unwrap_or(Cow::Borrowed(DEFAULT_MONTH));
        format!("{}-{:0>2}", year, month)
    }

    fn text_or_unknown(&self, name: &str) -> Cow<'_, str> {
        field_value::to_text(self.get(name)).unwrap_or(Cow::Borrowed(UNKNOWN))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for OrderRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Interpret a JSON value as a sequence of order records.
///
/// The value must be an array of objects. Anything else fails fast with
/// [AnalyticsError::InvalidRecords] rather than guessing at the intended shape.
pub fn records_from_value(value: FieldValue) -> Result<Vec<OrderRecord>, AnalyticsError> {
    let items = match value {
        FieldValue::Array(items) => items,
        other => {
            return Err(AnalyticsError::InvalidRecords {
                reason: format!("expected an array of records, found {}", kind(&other)),
            })
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            FieldValue::Object(fields) => Ok(OrderRecord { fields }),
            other => Err(AnalyticsError::InvalidRecords {
                reason: format!("record {} is {}, expected an object", index, kind(&other)),
            }),
        })
        .collect()
}

fn kind(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Null => "null",
        FieldValue::Bool(_) => "a boolean",
        FieldValue::Number(_) => "a number",
        FieldValue::String(_) => "a string",
        FieldValue::Array(_) => "an array",
        FieldValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_accessors() {
        let record = OrderRecord::new()
            .with(fields::STATUS, "Shipped")
            .with(fields::AMOUNT, "647.62")
            .with(fields::QTY, "2")
            .with(fields::B2B, "True")
            .with(fields::FULFILLED_BY, "Amazon")
            .with(fields::SHIP_STATE, "MAHARASHTRA")
            .with(fields::CATEGORY, "Set")
            .with(fields::SIZE, "S")
            .with(fields::YEAR, "2022")
            .with(fields::MONTH, "4")
            .with(fields::MONTH_NAME, "April");
        assert_eq!(Some("Shipped"), record.status());
        assert_eq!(Decimal::new(64762, 2), record.amount());
        assert_eq!(2, record.quantity());
        assert!(record.is_b2b());
        assert_eq!(Fulfilment::Amazon, record.fulfilment());
        assert_eq!("MAHARASHTRA", record.ship_state());
        assert_eq!("Set", record.category());
        assert_eq!("S", record.size());
        assert_eq!("2022-04", record.year_month());
        assert_eq!("April", record.month_name());
    }

    #[test]
    fn test_defaults() {
        let record = OrderRecord::new();
        assert_eq!(None, record.status());
        assert_eq!(Decimal::ZERO, record.amount());
        assert_eq!(0, record.quantity());
        assert!(!record.is_b2b());
        assert_eq!(Fulfilment::Other, record.fulfilment());
        assert_eq!(UNKNOWN, record.ship_state());
        assert_eq!(UNKNOWN, record.category());
        assert_eq!(UNKNOWN, record.size());
        assert_eq!("2022-01", record.year_month());
        assert_eq!(UNKNOWN, record.month_name());
    }

    #[test]
    fn test_year_month_numeric_fields() {
        let record = OrderRecord::new()
            .with(fields::YEAR, 2021)
            .with(fields::MONTH, 12.0);
        assert_eq!("2021-12", record.year_month());
    }

    #[test]
    fn test_year_month_float_text() {
        let record = OrderRecord::new()
            .with(fields::YEAR, "2022.0")
            .with(fields::MONTH, "4.0");
        assert_eq!("2022-04", record.year_month());
    }

    #[test]
    fn test_fulfilment_is_case_sensitive() {
        let record = OrderRecord::new().with(fields::FULFILLED_BY, "amazon");
        assert_eq!(Fulfilment::Other, record.fulfilment());
    }

    #[test]
    fn test_records_from_value() {
        let value = json!([{"Amount": 100, "Status": "Shipped"}, {}]);
        let records = records_from_value(value).unwrap();
        assert_eq!(2, records.len());
        assert_eq!(Decimal::from(100), records[0].amount());
        assert!(records[1].is_empty());
    }

    #[test]
    #[should_panic(expected = "expected an array of records, found null")]
    fn test_records_from_null() {
        records_from_value(FieldValue::Null).unwrap();
    }

    #[test]
    #[should_panic(expected = "expected an array of records, found an object")]
    fn test_records_from_object() {
        records_from_value(json!({"Amount": 1})).unwrap();
    }

    #[test]
    #[should_panic(expected = "record 1 is a string, expected an object")]
    fn test_records_from_array_of_strings() {
        records_from_value(json!([{}, "Amount"])).unwrap();
    }

    #[test]
    fn test_deserialize_record() {
        let record: OrderRecord =
            serde_json::from_str(r#"{"Amount": "1.50", "B2B": true}"#).unwrap();
        assert_eq!(Decimal::new(150, 2), record.amount());
        assert!(record.is_b2b());
    }
}
