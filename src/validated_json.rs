//! Axum extractor that deserialises and validates JSON

use crate::error::AnalyticsError;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Json},
    http::Request,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// An axum extractor based on the Json extractor that also performs validation using the validator
/// crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    B: Send + 'static,
{
    type Rejection = AnalyticsError;

    /// Extract a `ValidatedJson` from a `Request`.
    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::body_string;
    use axum::{
        body::Body,
        http::{self, Request, StatusCode},
        response::Response,
        routing::post,
        Router,
    };
    use regex::Regex;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct TestPayload {
        #[validate(length(min = 1, max = 3))]
        pub region: String,
        #[validate(range(min = 1))]
        pub limit: Option<u32>,
    }

    async fn test_handler(ValidatedJson(payload): ValidatedJson<TestPayload>) -> String {
        format!("region: {} limit: {:?}", payload.region, payload.limit)
    }

    async fn request(body: Body) -> Response {
        Router::new()
            .route("/", post(test_handler))
            .oneshot(
                Request::builder()
                    .method(http::Method::POST)
                    .uri("/")
                    .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn ok() {
        let response = request(Body::from(r#"{"region": "GOA", "limit": 3}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!("region: GOA limit: Some(3)", body_string(response).await);
    }

    #[tokio::test]
    async fn invalid_json() {
        let response = request(Body::from("{\"")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r"Failed to parse the request body as JSON").unwrap();
        assert!(re.is_match(&body), "body: {body}")
    }

    #[tokio::test]
    async fn invalid_region_type() {
        let response = request(Body::from(r#"{"region": 123}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r".*region: invalid type: integer `123`.*").unwrap();
        assert!(re.is_match(&body), "body: {body}")
    }

    #[tokio::test]
    async fn invalid_region_too_long() {
        let response = request(Body::from(r#"{"region": "KERALA"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r".*request data is not valid.*").unwrap();
        assert!(re.is_match(&body), "body: {body}");
        let re = Regex::new(r".*region: Validation error: length.*").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn invalid_limit() {
        let response = request(Body::from(r#"{"region": "GOA", "limit": 0}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r".*limit: Validation error: range.*").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }
}
