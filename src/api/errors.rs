use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Converts AppError into HTTP responses.
///
/// Server-side failures are logged here and collapse to a generic body.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(errors) => {
                let body = serde_json::json!({
                    "error": self.to_string(),
                    "errors": errors,
                });
                return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::NotAuthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DuplicateUser
            | AppError::InvalidCredentials
            | AppError::AlreadyLiked
            | AppError::NotLiked => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Upstream(_) | AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!("Request failed: {self}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejections share the `AppError` body shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
