//! This crate provides a sales analytics server. It downloads a CSV dataset of sales orders from
//! an S3-compatible object store, reduces it to key performance indicators and regional,
//! category, size and monthly breakdowns, and serves the result as a JSON payload.
//!
//! The aggregation core ([filters], [operations] and [envelope]) is synchronous and pure: it
//! receives an in-memory slice of [record::OrderRecord] objects and returns a
//! [models::ResultEnvelope]. Everything else in the crate is plumbing around it.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [AWS SDK for S3](aws-sdk-s3) is used to interact with S3-compatible object stores.
//! * [csv] parses the order dataset.
//! * [rust_decimal] provides exact decimal arithmetic for monetary values.

pub mod app;
pub mod app_state;
pub mod cli;
pub mod clock;
pub mod compression;
pub mod dataset;
pub mod envelope;
pub mod error;
pub mod filters;
pub mod groups;
pub mod metrics;
pub mod models;
pub mod operation;
pub mod operations;
pub mod pipeline;
pub mod record;
pub mod resource_manager;
pub mod rounding;
pub mod s3_client;
pub mod scheduler;
pub mod server;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
pub mod validated_json;
