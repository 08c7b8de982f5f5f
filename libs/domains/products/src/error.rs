use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::images::MAX_IMAGES;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found")]
    NotFound,

    #[error("Image not found")]
    ImageNotFound,

    /// Field or image validation failure, already worded for the client
    #[error("{0}")]
    Validation(String),

    #[error("Maximum {max} images allowed. Currently have {current} images.", max = MAX_IMAGES)]
    TooManyImages { current: usize },

    #[error("Cannot delete the last image. At least one image is required.")]
    LastImage,

    #[error("You do not have permission to modify this product")]
    Forbidden,

    #[error("Image storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound | ProductError::ImageNotFound => {
                AppError::NotFound(err.to_string())
            }
            ProductError::Validation(_)
            | ProductError::TooManyImages { .. }
            | ProductError::LastImage => AppError::BadRequest(err.to_string()),
            ProductError::Forbidden => AppError::Forbidden(err.to_string()),
            ProductError::Database(e) => AppError::Database(e),
            ProductError::Storage(msg) | ProductError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
