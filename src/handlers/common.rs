use crate::{errors::ServiceError, ApiResponse};
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Success with no payload, only a message
pub fn message_response(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::<()>::message(message.into())),
    )
        .into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("Validation failed: {}", e)))
}

/// JSON body that is deserialized and validated before reaching the handler.
///
/// Malformed bodies become `ValidationError` (400) rather than axum's
/// default 422, which is reserved for insufficient stock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        validate_input(&value)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(range(min = 1))]
        quantity: i32,
    }

    async fn handler(ValidatedJson(payload): ValidatedJson<Payload>) -> Response {
        created_response(payload.quantity)
    }

    async fn post_json(body: &'static str) -> StatusCode {
        Router::new()
            .route("/", post(handler))
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn valid_body_passes_through() {
        assert_eq!(post_json(r#"{"quantity": 2}"#).await, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn malformed_and_invalid_bodies_are_bad_requests() {
        assert_eq!(post_json(r#"{"quantity": "two"}"#).await, StatusCode::BAD_REQUEST);
        assert_eq!(post_json(r#"{}"#).await, StatusCode::BAD_REQUEST);
        assert_eq!(post_json(r#"{"quantity": 0}"#).await, StatusCode::BAD_REQUEST);
    }
}
