//! Record filter.
//!
//! Cancelled orders are excluded from every aggregation. The filter borrows from the input and
//! preserves the relative order of the records it keeps.

use crate::record::{fields, OrderRecord};
use crate::types::FieldValue;

/// Status value of a cancelled order. Compared exactly, including case.
pub const CANCELLED: &str = "Cancelled";

/// Whether a record takes part in aggregation.
///
/// Every status other than [CANCELLED], including a missing or empty one, is active.
pub fn is_active(record: &OrderRecord) -> bool {
    !matches!(record.get(fields::STATUS), Some(FieldValue::String(status)) if status == CANCELLED)
}

/// Returns the active records, in their original order.
///
/// Filtering is idempotent: applying it to its own output returns the same records.
///
/// # Arguments
///
/// * `records`: Records to filter
pub fn filter_active<'a, I>(records: I) -> Vec<&'a OrderRecord>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    records.into_iter().filter(|record| is_active(record)).collect()
}
