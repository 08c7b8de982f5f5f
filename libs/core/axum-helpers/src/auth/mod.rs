//! Opaque token authentication (`Authorization: Token <key>`).
//!
//! The middleware resolves the token through a [`TokenAuthenticator`] supplied
//! by the accounts domain and stores the resulting [`AuthUser`] in request
//! extensions. Public routes work without a header; handlers that need a
//! caller take [`AuthUser`] as an extractor and reject anonymous requests.
//!
//! ```ignore
//! let authenticator: SharedAuthenticator = Arc::new(user_service);
//! let app = Router::new()
//!     .merge(products_router)
//!     .layer(middleware::from_fn_with_state(authenticator, token_auth_middleware));
//! ```

mod middleware;

pub use middleware::{extract_token, token_auth_middleware};

use crate::errors::AppError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Authorization scheme keyword expected before the token.
pub const TOKEN_SCHEME: &str = "Token";

/// Message used for every authentication failure.
pub const INVALID_TOKEN: &str = "invalid or missing token";

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
}

/// Resolves opaque tokens to users.
#[async_trait]
pub trait TokenAuthenticator: Send + Sync {
    /// Fails with [`AppError::Unauthorized`] when the token is unknown or the
    /// user is no longer active.
    async fn authenticate(&self, token: &str) -> Result<AuthUser, AppError>;
}

pub type SharedAuthenticator = Arc<dyn TokenAuthenticator>;

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))
    }
}
