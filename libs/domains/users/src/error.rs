use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, auth::INVALID_TOKEN};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{}", INVALID_TOKEN)]
    InvalidToken,

    #[error("User with username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::MissingCredentials | UserError::Validation(_) => {
                AppError::BadRequest(err.to_string())
            }
            UserError::InvalidCredentials | UserError::InvalidToken => {
                AppError::Unauthorized(err.to_string())
            }
            UserError::DuplicateUsername(_) => AppError::Conflict(err.to_string()),
            UserError::Database(e) => AppError::Database(e),
            UserError::PasswordHash(msg) | UserError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
