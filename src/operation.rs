use crate::record::OrderRecord;

/// Trait for aggregations over active order records.
///
/// This forms the contract between the response assembler and aggregations. Aggregations are
/// independent of each other: each one receives the same filtered records and none depends on
/// another's output.
pub trait Aggregation {
    /// Finished result of the aggregation.
    type Output;

    /// Execute the aggregation.
    ///
    /// Field-level problems in the records are coerced rather than reported, so this cannot
    /// fail.
    ///
    /// # Arguments
    ///
    /// * `records`: Active (non-cancelled) records, in input order
    fn execute(records: &[&OrderRecord]) -> Self::Output;
}
