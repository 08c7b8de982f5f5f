use axum_helpers::AuthUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Account allowed to log in and manage products
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    /// Unique login name
    pub username: String,
    pub email: Option<String>,
    /// Argon2 password hash (never exposed in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Inactive accounts can neither log in nor authenticate with a token
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: Option<String>, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            username,
            email,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Opaque API token; a user owns at most one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// 40 lowercase hex characters
    pub key: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating an account (operator CLI)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(email)]
    pub email: Option<String>,
}

/// DTO for user login
///
/// Both fields are optional at the wire level so a missing field produces the
/// same message as an empty one.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Value for the `Authorization: Token <token>` header
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub email: Option<String>,
}
