use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use async_trait::async_trait;
use axum_helpers::{AppError, AuthUser, TokenAuthenticator};
use std::sync::{Arc, LazyLock};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, LoginRequest, LoginResponse, User};
use crate::repository::UserRepository;

/// Token length in bytes; hex encoding doubles it to 40 characters
const TOKEN_BYTES: usize = 20;

/// Account operations: creation, login and token resolution
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create an account with an argon2-hashed password
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let password_hash = hash_password(&input.password)?;
        let user = User::new(input.username, input.email, password_hash);

        self.repository.create(user).await
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> UserResult<Option<User>> {
        self.repository.get_by_id(id).await
    }

    /// Exchange credentials for the user's API token, creating it on first login
    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> UserResult<LoginResponse> {
        let (username, password) = match (request.username, request.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => return Err(UserError::MissingCredentials),
        };

        let user = self.verify_credentials(&username, &password).await?;
        let token = self
            .repository
            .get_or_create_token(user.id, generate_token_key())
            .await?;

        Ok(LoginResponse {
            token: token.key,
            user_id: user.id,
            username: user.username,
            email: user.email,
        })
    }

    /// Resolve a token to its active owner
    #[instrument(skip_all)]
    pub async fn authenticate_token(&self, key: &str) -> UserResult<User> {
        match self.repository.find_user_by_token(key).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(UserError::InvalidToken),
        }
    }

    /// Runs one argon2 verification whether or not the username exists
    async fn verify_credentials(&self, username: &str, password: &str) -> UserResult<User> {
        let Some(user) = self.repository.get_by_username(username).await? else {
            let _ = verify_password(password, missing_user_hash()?);
            return Err(UserError::InvalidCredentials);
        };

        let password_ok = verify_password(password, &user.password_hash)?;
        if !password_ok || !user.is_active {
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[async_trait]
impl<R: UserRepository + 'static> TokenAuthenticator for UserService<R> {
    async fn authenticate(&self, token: &str) -> Result<AuthUser, AppError> {
        let user = self.authenticate_token(token).await?;
        Ok(user.into())
    }
}

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash compared against on unknown usernames
fn missing_user_hash() -> UserResult<&'static str> {
    static HASH: LazyLock<Option<String>> =
        LazyLock::new(|| hash_password("missing-user-placeholder").ok());
    HASH.as_deref()
        .ok_or_else(|| UserError::PasswordHash("placeholder hash unavailable".to_string()))
}

fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    const_hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryUserRepository, MockUserRepository};

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }

    async fn service_with_alice() -> (UserService<InMemoryUserRepository>, User) {
        let service = UserService::new(InMemoryUserRepository::new());
        let alice = service
            .create_user(CreateUser {
                username: "alice".to_string(),
                password: "s3cret-pass".to_string(),
                email: Some("alice@example.com".to_string()),
            })
            .await
            .unwrap();
        (service, alice)
    }

    #[test]
    fn test_token_key_is_40_hex_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_token_key());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_returns_same_token_twice() {
        let (service, alice) = service_with_alice().await;

        let first = service.login(login_request("alice", "s3cret-pass")).await.unwrap();
        let second = service.login(login_request("alice", "s3cret-pass")).await.unwrap();

        assert_eq!(first.user_id, alice.id);
        assert_eq!(first.email.as_deref(), Some("alice@example.com"));
        assert_eq!(first.token, second.token);
    }

    #[tokio::test]
    async fn test_login_rejects_missing_and_wrong_credentials() {
        let (service, _) = service_with_alice().await;

        let missing = service.login(LoginRequest::default()).await;
        assert!(matches!(missing, Err(UserError::MissingCredentials)));

        let empty = service.login(login_request("alice", "")).await;
        assert!(matches!(empty, Err(UserError::MissingCredentials)));

        let wrong = service.login(login_request("alice", "nope")).await;
        assert!(matches!(wrong, Err(UserError::InvalidCredentials)));

        let unknown = service.login(login_request("bob", "s3cret-pass")).await;
        assert!(matches!(unknown, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_resolves_token_owner() {
        let (service, alice) = service_with_alice().await;
        let login = service.login(login_request("alice", "s3cret-pass")).await.unwrap();

        let caller = service.authenticate(&login.token).await.unwrap();
        assert_eq!(caller.id, alice.id);
        assert_eq!(caller.username, "alice");

        assert!(service.authenticate("0".repeat(40).as_str()).await.is_err());
    }

    #[tokio::test]
    async fn test_inactive_user_is_rejected() {
        let mut mock_repo = MockUserRepository::new();
        let mut user = User::new(
            "carol".to_string(),
            None,
            hash_password("s3cret-pass").unwrap(),
        );
        user.is_active = false;
        let by_token = user.clone();

        mock_repo
            .expect_find_user_by_token()
            .times(1)
            .returning(move |_| Ok(Some(by_token.clone())));
        mock_repo
            .expect_get_by_username()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        mock_repo.expect_get_or_create_token().never();

        let service = UserService::new(mock_repo);

        let result = service.authenticate_token("deadbeef").await;
        assert!(matches!(result, Err(UserError::InvalidToken)));

        let result = service.login(login_request("carol", "s3cret-pass")).await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[test]
    fn test_missing_user_hash_is_a_real_argon2_hash() {
        let hash = missing_user_hash().unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_eq!(missing_user_hash().unwrap(), hash);
        assert!(!verify_password("s3cret-pass", hash).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_username_is_rejected_without_token() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_get_by_username()
            .times(1)
            .returning(|_| Ok(None));
        mock_repo.expect_get_or_create_token().never();

        let service = UserService::new(mock_repo);
        let result = service.login(login_request("mallory", "s3cret-pass")).await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }
}
