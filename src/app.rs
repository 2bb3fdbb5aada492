//! Sales analytics server API

use crate::app_state::{AppState, SharedAppState};
use crate::error::AnalyticsError;
use crate::metrics::{metrics_handler, record_response_metrics, request_counter};
use crate::models::{RecordsQuery, RequestData, ResultEnvelope};
use crate::pipeline::{self, Trigger};
use crate::types::FieldValue;
use crate::validated_json::ValidatedJson;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    headers::authorization::{Authorization, Basic},
    response::Response,
    routing::{get, post},
    Json, Router, TypedHeader,
};
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use validator::Validate;

/// Optional HTTP basic credentials, forwarded to the object store.
type BasicAuth = Option<TypedHeader<Authorization<Basic>>>;

/// Returns a [axum::Router] for the sales analytics API
///
/// The router is populated with all routes as well as the following middleware:
///
/// * a [tower_http::trace::TraceLayer] for tracing requests and responses and recording
///   Prometheus metrics
/// * a [tower_http::cors::CorsLayer] allowing requests from any origin
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn router(state: SharedAppState) -> Router {
    fn v1() -> Router<SharedAppState> {
        Router::new()
            .route("/analytics", get(analyse_default).post(analyse))
            .route("/analytics/records", post(analyse_records))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(request_counter)
                    .on_response(record_response_metrics),
            )
    }

    Router::new()
        .nest("/v1", v1())
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Sales analytics service type alias
///
/// This type is the [axum::Router] wrapped by a [tower_http::normalize_path::NormalizePath]
/// layer, so that paths with a trailing slash are routed like those without.
pub type Service = NormalizePath<Router>;

/// Returns a [crate::app::Service] for the sales analytics API
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn service(state: SharedAppState) -> Service {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Convert the outcome of a handler into a response. Error bodies are stamped with the state's
/// clock.
fn respond(
    state: &AppState,
    result: Result<ResultEnvelope, AnalyticsError>,
) -> Result<Json<ResultEnvelope>, Response> {
    result
        .map(Json)
        .map_err(|error| error.into_response_at(state.clock.as_ref()))
}

/// Handler for `GET /v1/analytics`: analyse the default dataset.
async fn analyse_default(
    State(state): State<SharedAppState>,
    auth: BasicAuth,
) -> Result<Json<ResultEnvelope>, Response> {
    let result = run_default(&state, auth).await;
    respond(&state, result)
}

async fn run_default(
    state: &AppState,
    auth: BasicAuth,
) -> Result<ResultEnvelope, AnalyticsError> {
    let request_data = state
        .default_request
        .as_ref()
        .ok_or(AnalyticsError::NoDefaultDataset)?;
    let credentials = pipeline::credentials(auth.as_ref().map(|header| &header.0), &state.args);
    pipeline::run(state, request_data, credentials, Trigger::Request).await
}

/// Handler for `POST /v1/analytics`: analyse the dataset named in the request body.
async fn analyse(
    State(state): State<SharedAppState>,
    auth: BasicAuth,
    request_data: Result<ValidatedJson<RequestData>, AnalyticsError>,
) -> Result<Json<ResultEnvelope>, Response> {
    let result = run_request(&state, auth, request_data).await;
    respond(&state, result)
}

async fn run_request(
    state: &AppState,
    auth: BasicAuth,
    request_data: Result<ValidatedJson<RequestData>, AnalyticsError>,
) -> Result<ResultEnvelope, AnalyticsError> {
    let ValidatedJson(request_data) = request_data?;
    let credentials = pipeline::credentials(auth.as_ref().map(|header| &header.0), &state.args);
    pipeline::run(state, &request_data, credentials, Trigger::Request).await
}

/// Handler for `POST /v1/analytics/records`: analyse the records in the request body.
///
/// The `top_regions` query parameter overrides the configured number of regions.
async fn analyse_records(
    State(state): State<SharedAppState>,
    query: Result<Query<RecordsQuery>, QueryRejection>,
    payload: Result<Json<FieldValue>, JsonRejection>,
) -> Result<Json<ResultEnvelope>, Response> {
    let result = run_records(&state, query, payload).await;
    respond(&state, result)
}

async fn run_records(
    state: &AppState,
    query: Result<Query<RecordsQuery>, QueryRejection>,
    payload: Result<Json<FieldValue>, JsonRejection>,
) -> Result<ResultEnvelope, AnalyticsError> {
    let Query(query) = query?;
    query.validate()?;
    let Json(value) = payload?;
    pipeline::run_records(state, value, query.top_regions).await
}
