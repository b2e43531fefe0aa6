//! Request extractors for the JSON APIs.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejections come back as JSON 400 bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::IntoResponse,
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        count: i64,
    }

    async fn extract(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = match ApiJson::<Payload>::from_request(request, &()).await {
            Ok(_) => StatusCode::OK.into_response(),
            Err(err) => err.into_response(),
        };
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn wrong_field_type_is_a_json_400() {
        let request = Request::post("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"count":"five"}"#))
            .unwrap();
        let (status, body) = extract(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("count"));
    }

    #[tokio::test]
    async fn missing_content_type_is_a_json_400() {
        let request = Request::post("/").body(Body::from(r#"{"count":1}"#)).unwrap();
        let (status, body) = extract(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn valid_body_is_accepted() {
        let request = Request::post("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"count":1}"#))
            .unwrap();
        assert_eq!(extract(request).await.0, StatusCode::OK);
    }
}
