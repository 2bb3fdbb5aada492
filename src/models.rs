//! Data types and associated functions and methods

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use url::Url;
use validator::Validate;

/// Compression algorithm of a dataset object
#[derive(Clone, Copy, Debug, Deserialize, Display, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "id")]
#[strum(serialize_all = "lowercase")]
pub enum Compression {
    /// Gzip
    Gzip,
    /// Zlib
    Zlib,
}

/// Request data for analysing a dataset object
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct RequestData {
    /// URL of the S3-compatible object store
    pub source: Url,
    /// S3 bucket containing the object
    #[validate(length(min = 1, message = "bucket must not be empty"))]
    pub bucket: String,
    /// S3 object containing the CSV dataset
    #[validate(length(min = 1, message = "object must not be empty"))]
    pub object: String,
    /// Compression filter name
    pub compression: Option<Compression>,
    /// Number of regions to include in the regional analytics
    #[validate(range(min = 1, message = "top_regions must be greater than 0"))]
    pub top_regions: Option<usize>,
}

/// Query parameters of the records endpoint
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Validate)]
pub struct RecordsQuery {
    /// Number of regions to include in the regional analytics
    #[validate(range(min = 1, message = "top_regions must be greater than 0"))]
    pub top_regions: Option<usize>,
}

/// Key performance indicators over all active orders
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_orders: u64,
    pub average_order_value: f64,
    pub total_quantity_sold: i64,
    pub b2b_revenue: f64,
    pub b2c_revenue: f64,
    /// Share of revenue from business orders, in percent
    pub b2b_percentage: f64,
    pub amazon_fulfilled_orders: u64,
    pub merchant_fulfilled_orders: u64,
}

/// Revenue of one shipping state
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RegionEntry {
    pub state: String,
    pub revenue: f64,
    pub order_count: u64,
}

/// Performance of one product category
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub category: String,
    pub revenue: f64,
    pub quantity_sold: i64,
    pub order_count: u64,
    pub avg_order_value: f64,
}

/// Revenue of one calendar month
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MonthlyEntry {
    /// `YYYY-MM`
    pub year_month: String,
    /// Display label, taken from the first order seen in the month
    pub month_name: String,
    pub revenue: f64,
    pub order_count: u64,
    pub avg_order_value: f64,
}

/// Performance of one product size
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SizeEntry {
    pub size: String,
    pub revenue: f64,
    pub quantity_sold: i64,
    pub order_count: u64,
}

/// Leading regions and categories by revenue
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TopPerformers {
    /// Highest revenue region; null when there are no active orders
    pub top_state: Option<RegionEntry>,
    pub top_5_states: Vec<RegionEntry>,
    /// Highest revenue category; null when there are no active orders
    pub top_category: Option<CategoryEntry>,
    pub top_5_categories: Vec<CategoryEntry>,
}

/// Aggregated analytics
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AnalyticsData {
    pub kpis: Kpis,
    /// Top regions by revenue, descending
    pub regional_analytics: Vec<RegionEntry>,
    /// All categories by revenue, descending
    pub category_performance: Vec<CategoryEntry>,
    /// All months, ascending
    pub monthly_trends: Vec<MonthlyEntry>,
    /// All sizes by revenue, descending
    pub size_performance: Vec<SizeEntry>,
    /// Ranked over all regions and categories, regardless of the regional limit
    pub top_performers: TopPerformers,
}

/// Record counts of the input
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Metadata {
    pub total_records: u64,
    pub active_records: u64,
    pub cancelled_records: u64,
    /// Share of cancelled records, in percent
    pub cancellation_rate: f64,
}

/// Outcome of an invocation
#[derive(Clone, Copy, Debug, Deserialize, Display, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

/// Result envelope containing the analytics of one dataset.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub status: Status,
    /// RFC 3339 time of the invocation
    pub timestamp: String,
    pub data: AnalyticsData,
    pub metadata: Metadata,
}
