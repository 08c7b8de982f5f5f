pub mod codes;
pub mod handlers;
pub mod responses;
pub mod validation;

pub use codes::ErrorCode;
pub use validation::first_violation;

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Error as UuidError;
use validator::ValidationErrors;

/// Failure envelope returned by every endpoint.
///
/// ```json
/// { "success": false, "error": "Product not found" }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable error message
    pub error: String,
    /// Optional extra context, e.g. the underlying failure of an unexpected error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Multipart extraction error: {0}")]
    MultipartRejection(#[from] MultipartRejection),

    #[error("Multipart read error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("UUID error: {0}")]
    UuidError(#[from] UuidError),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected failure; the message is reported as `details`.
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status, envelope and log code for this error, logging it on the way.
    fn parts(self) -> (StatusCode, ErrorResponse, ErrorCode) {
        match self {
            AppError::SerdeJson(e) => internal(ErrorCode::SerdeJsonError, &e),
            AppError::Database(e) => map_db_error(e),
            AppError::Io(e) => internal(ErrorCode::IoError, &e),
            AppError::JsonExtractorRejection(e) => {
                let code = ErrorCode::JsonExtraction;
                tracing::warn!(error_code = code.code(), "JSON extraction error: {:?}", e);
                let status = match e.status() {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, ErrorResponse::new(e.body_text()), code)
            }
            AppError::MultipartRejection(e) => {
                let code = ErrorCode::MultipartExtraction;
                tracing::warn!(error_code = code.code(), "Multipart rejection: {:?}", e);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(e.body_text()), code)
            }
            AppError::Multipart(e) => {
                let code = ErrorCode::MultipartExtraction;
                tracing::warn!(error_code = code.code(), "Multipart read error: {:?}", e);
                let status = match e.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, ErrorResponse::new(e.body_text()), code)
            }
            AppError::ValidationError(e) => {
                let code = ErrorCode::ValidationError;
                tracing::info!(error_code = code.code(), "Validation error: {:?}", e);
                let message = first_violation(&e, &[])
                    .unwrap_or_else(|| code.default_message().to_string());
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message), code)
            }
            AppError::UuidError(e) => {
                let code = ErrorCode::InvalidUuid;
                tracing::info!(error_code = code.code(), "UUID error: {:?}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(code.default_message()),
                    code,
                )
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(msg),
                    ErrorCode::ValidationError,
                )
            }
            AppError::Unauthorized(msg) => {
                tracing::info!("Unauthorized: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new(msg),
                    ErrorCode::Unauthorized,
                )
            }
            AppError::Forbidden(msg) => {
                tracing::info!("Forbidden: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse::new(msg),
                    ErrorCode::Forbidden,
                )
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(msg),
                    ErrorCode::NotFound,
                )
            }
            AppError::Conflict(msg) => {
                tracing::info!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new(msg),
                    ErrorCode::Conflict,
                )
            }
            AppError::InternalServerError(msg) => {
                let code = ErrorCode::InternalError;
                tracing::error!(error_code = code.code(), "Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(code.default_message()).with_details(msg),
                    code,
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new(msg),
                    ErrorCode::ServiceUnavailable,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body, _code) = self.parts();
        (status, Json(body)).into_response()
    }
}

fn internal(code: ErrorCode, error: &dyn std::fmt::Debug) -> (StatusCode, ErrorResponse, ErrorCode) {
    tracing::error!(error_code = code.code(), "{}: {:?}", code, error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new(code.default_message()),
        code,
    )
}

fn map_db_error(error: DbErr) -> (StatusCode, ErrorResponse, ErrorCode) {
    match error {
        DbErr::RecordNotFound(what) => {
            let code = ErrorCode::DatabaseNotFound;
            tracing::info!(error_code = code.code(), "Database record not found: {}", what);
            (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(ErrorCode::NotFound.default_message()),
                code,
            )
        }
        DbErr::ConnectionAcquire(e) => {
            let code = ErrorCode::DatabaseUnavailable;
            tracing::warn!(error_code = code.code(), "Database connection unavailable: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new(code.default_message()),
                code,
            )
        }
        other => internal(ErrorCode::DatabaseError, &other),
    }
}

/// Builds a failure envelope response directly.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let response = AppError::NotFound("Product not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Product not found");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_message_in_error_field() {
        let response = AppError::InternalServerError("disk full".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "An internal server error occurred");
        assert_eq!(body["details"], "disk full");
    }

    #[tokio::test]
    async fn test_db_errors_map_to_statuses() {
        let not_found = AppError::from(DbErr::RecordNotFound("product".into())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let other = AppError::from(DbErr::Custom("boom".into())).into_response();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(other).await;
        assert_eq!(body["error"], "An internal server error occurred");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let response = AppError::Unauthorized("invalid or missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid or missing token");
    }

    #[tokio::test]
    async fn test_error_response_helper() {
        let response = error_response(StatusCode::CONFLICT, "already exists");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "already exists");
    }
}
