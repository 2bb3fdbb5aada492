//! Error handling.

use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::put_object::PutObjectError;
use aws_smithy_types::byte_stream::error::Error as ByteStreamError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tokio::sync::AcquireError;
use tracing::{event, Level};
use zune_inflate::errors::InflateDecodeErrors;

use crate::clock::{Clock, SystemClock};

/// Sales analytics error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Error parsing the dataset as CSV
    #[error("failed to parse dataset as CSV")]
    Csv(#[from] csv::Error),

    /// Error decompressing data
    #[error("failed to decompress data")]
    DecompressionFlate2(#[from] std::io::Error),

    /// Error decompressing data
    #[error("failed to decompress data")]
    DecompressionZune(#[from] InflateDecodeErrors),

    /// Insufficient memory to process request
    #[error("Insufficient memory to process request ({requested} > {total})")]
    InsufficientMemory { requested: usize, total: usize },

    /// Input cannot be interpreted as a sequence of order records
    #[error("input cannot be interpreted as order records: {reason}")]
    InvalidRecords { reason: String },

    /// Error encoding metrics
    #[error("failed to encode metrics")]
    Metrics(#[from] prometheus::Error),

    /// No default dataset has been configured
    #[error("no default dataset configured")]
    NoDefaultDataset,

    /// Error deserialising request data into RequestData
    #[error("request data is not valid")]
    RequestDataJsonRejection(#[from] JsonRejection),

    /// Error deserialising query parameters
    #[error("request query is not valid")]
    RequestQueryRejection(#[from] QueryRejection),

    /// Error validating RequestData (single error)
    #[error("request data is not valid")]
    RequestDataValidationSingle(#[from] validator::ValidationError),

    /// Error validating RequestData (multiple errors)
    #[error("request data is not valid")]
    RequestDataValidation(#[from] validator::ValidationErrors),

    /// Error reading object data from S3
    #[error("error receiving object from S3 storage")]
    S3ByteStream(#[from] ByteStreamError),

    /// Missing Content-Length header in S3 response.
    #[error("S3 response missing Content-Length header")]
    S3ContentLengthMissing,

    /// Error while retrieving an object from S3
    #[error("error retrieving object from S3 storage")]
    S3GetObject(#[from] SdkError<GetObjectError>),

    /// Error while uploading an object to S3
    #[error("error uploading object to S3 storage")]
    S3PutObject(#[from] SdkError<PutObjectError>),

    /// Error acquiring a semaphore
    #[error("error acquiring resources")]
    SemaphoreAcquireError(#[from] AcquireError),

    /// Error serialising a result envelope
    #[error("failed to serialise result")]
    Serialisation(#[from] serde_json::Error),

    /// Error formatting a timestamp
    #[error("failed to format timestamp")]
    Timestamp(#[from] time::error::Format),

    /// Error converting between integer types
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),
}

impl IntoResponse for AnalyticsError {
    /// Convert from an `AnalyticsError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

impl AnalyticsError {
    /// Convert into an [axum::response::Response] whose timestamp is read from `clock`.
    pub fn into_response_at(self, clock: &dyn Clock) -> Response {
        ErrorResponse::from(self).stamped(clock).into_response()
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    code: StatusCode,

    /// Always "error"
    status: String,

    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,

    /// Time at which the error response was generated
    timestamp: String,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `code`: HTTP status of the response
    /// * `error`: The error that occurred. Its chain of sources is collected into `caused_by`.
    fn new<E>(code: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut causes = Vec::new();
        let mut current = error.source();
        while let Some(source) = current {
            causes.push(source.to_string());
            current = source.source();
        }
        // Remove duplicate entries.
        causes.dedup();
        ErrorResponse {
            code,
            status: "error".to_string(),
            message,
            caused_by: (!causes.is_empty()).then_some(causes),
            timestamp: SystemClock.timestamp().unwrap_or_default(),
        }
    }

    /// Replace the timestamp with the current time of `clock`.
    fn stamped(mut self, clock: &dyn Clock) -> Self {
        if let Ok(timestamp) = clock.timestamp() {
            self.timestamp = timestamp;
        }
        self
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 401 unauthorised ErrorResponse
    fn unauthorised<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::UNAUTHORIZED, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    /// Return an ErrorResponse for a failed S3 request, based on the error code returned by the
    /// object store.
    fn from_s3_code<E>(code: Option<&str>, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        match code {
            // Bad request
            Some("NoSuchBucket") | Some("NoSuchKey") => Self::bad_request(error),

            // Unauthorised
            Some("InvalidAccessKeyId")
            | Some("SignatureDoesNotMatch")
            | Some("AccessDenied") => Self::unauthorised(error),

            // Internal server error
            _ => Self::internal_server_error(error),
        }
    }
}

impl From<AnalyticsError> for ErrorResponse {
    /// Convert from an `AnalyticsError` into an `ErrorResponse`.
    fn from(error: AnalyticsError) -> Self {
        let response = match &error {
            // Bad request
            AnalyticsError::DecompressionFlate2(_)
            | AnalyticsError::DecompressionZune(_)
            | AnalyticsError::InsufficientMemory { .. }
            | AnalyticsError::NoDefaultDataset
            | AnalyticsError::RequestDataJsonRejection(_)
            | AnalyticsError::RequestQueryRejection(_)
            | AnalyticsError::RequestDataValidationSingle(_)
            | AnalyticsError::RequestDataValidation(_)
            | AnalyticsError::S3ContentLengthMissing => Self::bad_request(&error),

            // Internal server error
            AnalyticsError::Csv(_)
            | AnalyticsError::InvalidRecords { .. }
            | AnalyticsError::Metrics(_)
            | AnalyticsError::S3ByteStream(_)
            | AnalyticsError::SemaphoreAcquireError(_)
            | AnalyticsError::Serialisation(_)
            | AnalyticsError::Timestamp(_)
            | AnalyticsError::TryFromInt(_) => Self::internal_server_error(&error),

            AnalyticsError::S3GetObject(sdk_error) => {
                // Tailor the response based on the specific SdkError variant.
                match sdk_error {
                    // This is a more specific ServiceError variant, with GetObjectError as the
                    // inner error.
                    SdkError::ServiceError(get_obj_error) => match get_obj_error.err() {
                        GetObjectError::InvalidObjectState(_) | GetObjectError::NoSuchKey(_) => {
                            Self::bad_request(&error)
                        }
                        // Quite a lot of error cases end up as unhandled. Attempt to determine
                        // the error from the code.
                        other => Self::from_s3_code(other.code(), &error),
                    },

                    // Generic SdkError variants, and the enum is marked as non-exhaustive.
                    _ => Self::internal_server_error(&error),
                }
            }

            AnalyticsError::S3PutObject(sdk_error) => match sdk_error {
                SdkError::ServiceError(put_obj_error) => {
                    Self::from_s3_code(put_obj_error.err().code(), &error)
                }
                _ => Self::internal_server_error(&error),
            },
        };

        // Log server errors.
        if response.code.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.code,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
