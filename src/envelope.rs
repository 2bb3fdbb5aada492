//! Response assembler.
//!
//! Composes the record filter and the aggregations into a single [ResultEnvelope].

use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::error::AnalyticsError;
use crate::filters::filter_active;
use crate::models::{
    AnalyticsData, CategoryEntry, Metadata, RegionEntry, ResultEnvelope, Status, TopPerformers,
};
use crate::operation::Aggregation;
use crate::operations;
use crate::record::{records_from_value, OrderRecord};
use crate::rounding::{percentage, round_money};
use crate::types::FieldValue;

/// Number of regions in the regional analytics unless configured otherwise.
pub const DEFAULT_TOP_REGIONS: usize = 10;

/// Number of regions and categories in the top performers.
pub const TOP_PERFORMERS: usize = 5;

/// Options that shape the assembled envelope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssemblyOptions {
    /// Maximum number of entries in the regional analytics.
    pub top_regions: usize,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            top_regions: DEFAULT_TOP_REGIONS,
        }
    }
}

/// Assemble the result envelope of a dataset.
///
/// Cancelled records are filtered out once and the remaining records are handed to each
/// aggregation in turn. Aggregated values are not recomputed here.
///
/// # Arguments
///
/// * `records`: All records of the dataset, including cancelled ones
/// * `clock`: Source of the envelope timestamp
/// * `options`: Assembly options
///
/// # Errors
///
/// Fails only if the timestamp cannot be formatted.
pub fn assemble(
    records: &[OrderRecord],
    clock: &dyn Clock,
    options: &AssemblyOptions,
) -> Result<ResultEnvelope, AnalyticsError> {
    let active = filter_active(records);

    let mut regional_analytics = operations::Regional::execute(&active);
    let category_performance = operations::Category::execute(&active);
    let top_performers = top_performers(&regional_analytics, &category_performance);
    regional_analytics.truncate(options.top_regions);

    let data = AnalyticsData {
        kpis: operations::Kpi::execute(&active),
        regional_analytics,
        category_performance,
        monthly_trends: operations::Monthly::execute(&active),
        size_performance: operations::Size::execute(&active),
        top_performers,
    };
    let metadata = metadata(records.len(), active.len())?;

    Ok(ResultEnvelope {
        status: Status::Success,
        timestamp: clock.timestamp()?,
        data,
        metadata,
    })
}

/// Check the shape of a JSON value and assemble the result envelope of the records it holds.
///
/// # Errors
///
/// Returns [AnalyticsError::InvalidRecords] if `value` is not an array of objects.
pub fn analyse(
    value: FieldValue,
    clock: &dyn Clock,
    options: &AssemblyOptions,
) -> Result<ResultEnvelope, AnalyticsError> {
    let records = records_from_value(value)?;
    assemble(&records, clock, options)
}

/// Pick the leading entries of the full regional and category rankings.
fn top_performers(regions: &[RegionEntry], categories: &[CategoryEntry]) -> TopPerformers {
    TopPerformers {
        top_state: regions.first().cloned(),
        top_5_states: regions.iter().take(TOP_PERFORMERS).cloned().collect(),
        top_category: categories.first().cloned(),
        top_5_categories: categories.iter().take(TOP_PERFORMERS).cloned().collect(),
    }
}

fn metadata(total: usize, active: usize) -> Result<Metadata, AnalyticsError> {
    let total_records = u64::try_from(total)?;
    let active_records = u64::try_from(active)?;
    let cancelled_records = total_records - active_records;
    Ok(Metadata {
        total_records,
        active_records,
        cancelled_records,
        cancellation_rate: round_money(percentage(
            Decimal::from(cancelled_records),
            Decimal::from(total_records),
        )),
    })
}
