//! Dataset pipeline: fetch, decompress, parse and assemble.
//!
//! Both the HTTP handlers and the scheduler go through [run]. Downloading is asynchronous; the
//! CPU-bound part (decompression, parsing and aggregation) runs either on the Rayon thread pool
//! or inline under a task permit from the resource manager.

use crate::app_state::AppState;
use crate::cli::CommandLineArgs;
use crate::clock::Clock;
use crate::compression;
use crate::dataset;
use crate::envelope::{self, AssemblyOptions};
use crate::error::AnalyticsError;
use crate::metrics;
use crate::models::{Compression, RequestData, ResultEnvelope};
use crate::s3_client::S3Credentials;
use crate::types::FieldValue;

use axum::body::Bytes;
use axum::headers::authorization::{Authorization, Basic};
use strum_macros::Display;
use tracing::Instrument;

/// What started a pipeline run.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum Trigger {
    Request,
    Schedule,
}

/// Determine the S3 credentials of a run.
///
/// Credentials from an HTTP basic authorization header take precedence over the keys configured
/// on the command line. Without either, the object store is accessed anonymously.
pub fn credentials(auth: Option<&Authorization<Basic>>, args: &CommandLineArgs) -> S3Credentials {
    match (auth, &args.access_key, &args.secret_key) {
        (Some(auth), _, _) => S3Credentials::access_key(auth.username(), auth.password()),
        (None, Some(access_key), Some(secret_key)) => {
            S3Credentials::access_key(access_key, secret_key)
        }
        _ => S3Credentials::None,
    }
}

/// Assembly options of a request, falling back to the configured defaults.
fn options(args: &CommandLineArgs, top_regions: Option<usize>) -> AssemblyOptions {
    AssemblyOptions {
        top_regions: top_regions.unwrap_or(args.top_regions),
    }
}

/// Fetch a dataset object and return its result envelope.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `request_data`: The dataset to analyse
/// * `credentials`: S3 credentials
/// * `trigger`: What started the run, for metrics
#[tracing::instrument(level = "DEBUG", skip(state, credentials))]
pub async fn run(
    state: &AppState,
    request_data: &RequestData,
    credentials: S3Credentials,
    trigger: Trigger,
) -> Result<ResultEnvelope, AnalyticsError> {
    let result = fetch_and_assemble(state, request_data, credentials).await;
    count_run(trigger, &result);
    result
}

/// Analyse records supplied directly as JSON.
pub async fn run_records(
    state: &AppState,
    value: FieldValue,
    top_regions: Option<usize>,
) -> Result<ResultEnvelope, AnalyticsError> {
    let options = options(&state.args, top_regions);
    let clock = state.clock.clone();
    let result = execute(state, move || {
        envelope::analyse(value, clock.as_ref(), &options).map(record_summary)
    })
    .await;
    count_run(Trigger::Request, &result);
    result
}

async fn fetch_and_assemble(
    state: &AppState,
    request_data: &RequestData,
    credentials: S3Credentials,
) -> Result<ResultEnvelope, AnalyticsError> {
    let client = state
        .s3_client_map
        .get(&request_data.source, credentials)
        .instrument(tracing::Span::current())
        .await;

    // Held until the envelope has been assembled.
    let mut _mem_permits = None;
    let data = {
        let _conn_permits = state.resource_manager.s3_connection().await?;
        client
            .download_object(
                &request_data.bucket,
                &request_data.object,
                &state.resource_manager,
                &mut _mem_permits,
            )
            .await?
    };
    tracing::debug!("Downloaded {} bytes", data.len());

    let compression = request_data.compression;
    let options = options(&state.args, request_data.top_regions);
    let clock = state.clock.clone();
    execute(state, move || {
        process(data, compression, clock.as_ref(), &options).map(record_summary)
    })
    .await
}

/// Run a CPU-bound closure, either on the Rayon thread pool or inline under a task permit.
async fn execute<F>(state: &AppState, f: F) -> Result<ResultEnvelope, AnalyticsError>
where
    F: FnOnce() -> Result<ResultEnvelope, AnalyticsError> + Send + 'static,
{
    if state.args.use_rayon {
        tokio_rayon::spawn(f).await
    } else {
        let _task_permit = state.resource_manager.task().await?;
        f()
    }
}

/// Decompress and parse a dataset, and assemble its result envelope.
///
/// # Arguments
///
/// * `data`: Dataset object content
/// * `compression`: Compression of the object, if any
/// * `clock`: Source of the envelope timestamp
/// * `options`: Assembly options
pub fn process(
    data: Bytes,
    compression: Option<Compression>,
    clock: &dyn Clock,
    options: &AssemblyOptions,
) -> Result<ResultEnvelope, AnalyticsError> {
    let data = match compression {
        Some(compression) => compression::decompress(compression, &data)?,
        None => data,
    };
    let records = dataset::parse_csv(&data)?;
    envelope::assemble(&records, clock, options)
}

/// Upload a result envelope to the object store as pretty-printed JSON.
///
/// The object is written to `key` in the bucket of `request_data`.
pub async fn publish(
    state: &AppState,
    request_data: &RequestData,
    credentials: S3Credentials,
    envelope: &ResultEnvelope,
    key: &str,
) -> Result<(), AnalyticsError> {
    let body = serde_json::to_vec_pretty(envelope)?;
    let client = state
        .s3_client_map
        .get(&request_data.source, credentials)
        .await;
    let _conn_permits = state.resource_manager.s3_connection().await?;
    client
        .upload_object(
            &request_data.bucket,
            key,
            body.into(),
            mime::APPLICATION_JSON.as_ref(),
        )
        .await?;
    tracing::info!("Published result to {}/{}", request_data.bucket, key);
    Ok(())
}

fn record_summary(envelope: ResultEnvelope) -> ResultEnvelope {
    let metadata = &envelope.metadata;
    metrics::record_envelope_metrics(metadata);
    let top = &envelope.data.top_performers;
    tracing::info!(
        total = metadata.total_records,
        active = metadata.active_records,
        cancelled = metadata.cancelled_records,
        top_state = top.top_state.as_ref().map(|r| r.state.as_str()),
        top_state_revenue = top.top_state.as_ref().map(|r| r.revenue),
        top_category = top.top_category.as_ref().map(|c| c.category.as_str()),
        top_category_revenue = top.top_category.as_ref().map(|c| c.revenue),
        "Aggregated {} orders, revenue {}",
        envelope.data.kpis.total_orders,
        envelope.data.kpis.total_revenue,
    );
    envelope
}

fn count_run<T>(trigger: Trigger, result: &Result<T, AnalyticsError>) {
    let outcome = if result.is_ok() { "success" } else { "error" };
    metrics::PIPELINE_RUNS
        .with_label_values(&[&trigger.to_string(), outcome])
        .inc();
}
