use crate::error::AnalyticsError;
use crate::models::Metadata;

use axum::{body::Body, http::Request, response::Response};
use lazy_static::lazy_static;
use prometheus::{self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use tracing::Span;

lazy_static! {
    // Registry for holding metric state
    pub static ref REGISTRY: Registry = Registry::new();
    // Simple request counter
    pub static ref INCOMING_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("incoming_requests", "The number of HTTP requests received"),
        &["http_method"]
    ).unwrap();
    // Request counter by status code
    pub static ref RESPONSE_CODE_COLLECTOR: IntCounterVec = IntCounterVec::new(
        Opts::new("outgoing_response", "The number of responses sent."),
        &["status_code"]
    ).unwrap();
    // Request histogram by response time
    pub static ref RESPONSE_TIME_COLLECTOR: HistogramVec = HistogramVec::new(
        HistogramOpts{
            common_opts: Opts::new("response_time", "The time taken to respond to each request"),
            buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
        },
        &[],
    ).unwrap();
    // Order records aggregated, by whether they were active or cancelled
    pub static ref RECORDS_PROCESSED: IntCounterVec = IntCounterVec::new(
        Opts::new("records_processed", "The number of order records processed"),
        &["outcome"]
    ).unwrap();
    // Pipeline runs by trigger (request or schedule) and outcome
    pub static ref PIPELINE_RUNS: IntCounterVec = IntCounterVec::new(
        Opts::new("pipeline_runs", "The number of dataset pipeline runs"),
        &["trigger", "outcome"]
    ).unwrap();
}

/// Register all metrics with the registry.
pub fn register_metrics() -> Result<(), AnalyticsError> {
    REGISTRY.register(Box::new(INCOMING_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(RESPONSE_CODE_COLLECTOR.clone()))?;
    REGISTRY.register(Box::new(RESPONSE_TIME_COLLECTOR.clone()))?;
    REGISTRY.register(Box::new(RECORDS_PROCESSED.clone()))?;
    REGISTRY.register(Box::new(PIPELINE_RUNS.clone()))?;
    Ok(())
}

/// Render the registered metrics in the Prometheus text format.
pub async fn metrics_handler() -> Result<String, AnalyticsError> {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()).into())
}

/// Increments the prometheus counter on all incoming requests, labelled by http method
pub fn request_counter(request: &Request<Body>, _span: &Span) {
    INCOMING_REQUESTS
        .with_label_values(&[&request.method().to_string().to_ascii_uppercase()])
        .inc();
}

/// Increment the prometheus counter on all outgoing responses, labelled by status code
pub fn record_response_metrics<B>(
    response: &Response<B>,
    latency: std::time::Duration,
    _span: &Span,
) {
    RESPONSE_CODE_COLLECTOR
        .with_label_values(&[response.status().as_str()])
        .inc();

    RESPONSE_TIME_COLLECTOR
        .with_label_values(&[])
        .observe(latency.as_secs_f64());
}

/// Count the records of an assembled envelope.
pub fn record_envelope_metrics(metadata: &Metadata) {
    RECORDS_PROCESSED
        .with_label_values(&["active"])
        .inc_by(metadata.active_records);
    RECORDS_PROCESSED
        .with_label_values(&["cancelled"])
        .inc_by(metadata.cancelled_records);
}
