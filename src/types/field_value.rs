//! Untyped field value of an order record and lenient coercions into typed values.
//!
//! Order records come either from a CSV file, in which case every field is a string, or from a
//! JSON document, in which case a field may be any JSON scalar. The coercions in this module
//! never fail: malformed or missing values fall back to a safe default so that one bad row
//! cannot abort an aggregation.

use std::borrow::Cow;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// A field value of any type.
/// This is an alias of the Value type from serde_json, an enum over null, booleans, numbers,
/// strings, arrays and objects.
pub type FieldValue = serde_json::Value;

/// Interpret a field as a monetary amount.
///
/// Accepts JSON numbers and strings holding a decimal or scientific representation. Anything
/// else, including non-finite floats, is 0.
pub fn to_amount(value: Option<&FieldValue>) -> Decimal {
    match value {
        Some(FieldValue::Number(number)) => {
            if let Some(int) = number.as_i64() {
                Decimal::from(int)
            } else if let Some(uint) = number.as_u64() {
                Decimal::from(uint)
            } else {
                number
                    .as_f64()
                    .and_then(Decimal::from_f64)
                    .unwrap_or_default()
            }
        }
        Some(FieldValue::String(text)) => parse_decimal(text.trim()).unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(Decimal::from_f64))
}

/// Interpret a field as a unit count.
///
/// Fractional values are truncated towards zero; anything unparsable is 0.
pub fn to_quantity(value: Option<&FieldValue>) -> i64 {
    match value {
        Some(FieldValue::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate))
            .unwrap_or_default(),
        Some(FieldValue::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate))
                .unwrap_or_default()
        }
        _ => 0,
    }
}

fn truncate(value: f64) -> Option<i64> {
    // Saturating float to int cast; reject NaN and infinities explicitly.
    value.is_finite().then(|| value.trunc() as i64)
}

/// Interpret a field as a boolean flag.
///
/// Only a JSON `true` or the string `True` (in any ASCII case) are true.
pub fn to_flag(value: Option<&FieldValue>) -> bool {
    match value {
        Some(FieldValue::Bool(flag)) => *flag,
        Some(FieldValue::String(text)) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Interpret a field as text.
///
/// Returns `None` for missing, null or blank values. Integral numbers are rendered without a
/// fractional part so that a year of `2022.0` becomes `"2022"`.
pub fn to_text(value: Option<&FieldValue>) -> Option<Cow<'_, str>> {
    match value? {
        FieldValue::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then_some(Cow::Borrowed(text))
        }
        FieldValue::Number(number) => {
            let text = match number.as_f64() {
                Some(float) if !number.is_i64() && !number.is_u64() && float.fract() == 0.0 => {
                    format!("{}", float as i64)
                }
                _ => number.to_string(),
            };
            Some(Cow::Owned(text))
        }
        FieldValue::Bool(true) => Some(Cow::Borrowed("True")),
        FieldValue::Bool(false) => Some(Cow::Borrowed("False")),
        _ => None,
    }
}

/// Interpret a field as a year or month number.
///
/// Like [to_text], but text holding an integral float such as `"4.0"` or `"2022.0"` is rendered
/// as an integer, whether it came from a JSON number or a CSV cell.
pub fn to_calendar_part(value: Option<&FieldValue>) -> Option<Cow<'_, str>> {
    let text = to_text(value)?;
    if text.parse::<i64>().is_ok() {
        return Some(text);
    }
    match text.parse::<f64>() {
        Ok(float) if float.is_finite() && float.fract() == 0.0 => {
            Some(Cow::Owned(format!("{}", float as i64)))
        }
        _ => Some(text),
    }
}
