//! Numeric error codes attached to error logs.
//!
//! Codes never reach the response body; they exist so log aggregation can group
//! failures without parsing messages.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! assert_eq!(ErrorCode::ValidationError.as_str(), "VALIDATION_ERROR");
//! assert_eq!(ErrorCode::ValidationError.code(), 1001);
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    ValidationError,
    InvalidUuid,
    JsonExtraction,
    NotFound,
    InternalError,
    Unauthorized,
    Forbidden,
    Conflict,
    ServiceUnavailable,
    MultipartExtraction,

    // Database errors (2000-2999)
    DatabaseNotFound,
    DatabaseError,
    DatabaseUnavailable,

    // I/O errors (4000s)
    IoError,

    // Serialization errors (5000s)
    SerdeJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidUuid => "INVALID_UUID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::MultipartExtraction => "MULTIPART_EXTRACTION",
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::DatabaseUnavailable => "DATABASE_UNAVAILABLE",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    /// Integer code for structured logs:
    /// 1000s client, 2000s database, 4000s I/O, 5000s serialization.
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidUuid => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::Conflict => 1008,
            Self::ServiceUnavailable => 1011,
            Self::MultipartExtraction => 1012,

            Self::DatabaseNotFound => 2001,
            Self::DatabaseError => 2003,
            Self::DatabaseUnavailable => 2013,

            Self::IoError => 4001,

            Self::SerdeJsonError => 5001,
        }
    }

    /// Message used when the error itself carries nothing safe to show.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidUuid => "Invalid UUID format",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::InternalError => "An internal server error occurred",
            Self::Unauthorized => "invalid or missing token",
            Self::Forbidden => "Access forbidden",
            Self::Conflict => "Resource already exists",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::MultipartExtraction => "Failed to read multipart form data",
            Self::DatabaseNotFound => "Database record not found",
            Self::DatabaseError => "An internal server error occurred",
            Self::DatabaseUnavailable => "Database is temporarily unavailable",
            Self::IoError => "An internal server error occurred",
            Self::SerdeJsonError => "An internal server error occurred",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_representations() {
        assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
        assert_eq!(ErrorCode::DatabaseError.code(), 2003);
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_error_code_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::MultipartExtraction).unwrap();
        assert_eq!(json, "\"MULTIPART_EXTRACTION\"");
        let code: ErrorCode = serde_json::from_str("\"INVALID_UUID\"").unwrap();
        assert_eq!(code, ErrorCode::InvalidUuid);
    }

    #[test]
    fn test_internal_codes_share_generic_message() {
        for code in [
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::IoError,
            ErrorCode::SerdeJsonError,
        ] {
            assert_eq!(code.default_message(), "An internal server error occurred");
        }
    }
}
