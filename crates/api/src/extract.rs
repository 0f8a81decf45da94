//! Request extractors that reject with the JSON error envelope.
//!
//! axum's built-in `Json`, `Query` and `Path` reject with plain text. These
//! wrappers route every decoding failure through [`AppError`] so clients
//! always get `{ "message": ..., "error": ... }`.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

/// JSON body extractor and response wrapper.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path parameter extractor.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Parse a numeric id taken from the path.
///
/// Ids are positive; anything else is rejected with `message`.
///
/// # Errors
///
/// `AppError::Validation` when `raw` is not a positive integer.
pub fn parse_id<I: From<i32>>(raw: &str, message: &str) -> Result<I, AppError> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(I::from(id)),
        _ => Err(AppError::Validation(message.to_owned())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::routing::post;
    use axum::Router;
    use marketplace_core::ProductId;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Item {
        name: String,
    }

    async fn echo(Json(body): Json<Item>) -> Json<Item> {
        Json(body)
    }

    async fn send(body: &'static str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route("/", post(echo));
        let response = app
            .oneshot(
                Request::post("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_valid_body_round_trips() {
        let (status, body) = send(r#"{"name":"Phone"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Phone");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        let (status, body) = send("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request");
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_parse_id() {
        let id: ProductId = parse_id("42", "Invalid product ID").unwrap();
        assert_eq!(id.as_i32(), 42);

        for raw in ["abc", "0", "-3", ""] {
            let err = parse_id::<ProductId>(raw, "Invalid product ID").unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid product ID"));
        }
    }
}
