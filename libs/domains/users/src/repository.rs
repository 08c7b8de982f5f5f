use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{AuthToken, User};

/// Repository trait for accounts and their API tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`UserError::DuplicateUsername`] when the username is taken
    async fn create(&self, user: User) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Exact, case-sensitive match
    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>>;

    /// Returns the user's existing token, or stores `new_key` as their token
    async fn get_or_create_token(&self, user_id: Uuid, new_key: String) -> UserResult<AuthToken>;

    /// Owner of the token, if the token exists
    async fn find_user_by_token(&self, key: &str) -> UserResult<Option<User>>;
}

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, User>,
    tokens: HashMap<String, AuthToken>,
}

/// In-memory implementation for development and tests
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut store = self.store.write().await;

        if store.users.values().any(|u| u.username == user.username) {
            return Err(UserError::DuplicateUsername(user.username));
        }

        store.users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_or_create_token(&self, user_id: Uuid, new_key: String) -> UserResult<AuthToken> {
        let mut store = self.store.write().await;

        if let Some(existing) = store.tokens.values().find(|t| t.user_id == user_id) {
            return Ok(existing.clone());
        }

        let token = AuthToken {
            key: new_key,
            user_id,
            created_at: Utc::now(),
        };
        store.tokens.insert(token.key.clone(), token.clone());

        tracing::info!(user_id = %user_id, "Issued API token");
        Ok(token)
    }

    async fn find_user_by_token(&self, key: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .tokens
            .get(key)
            .and_then(|token| store.users.get(&token.user_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> User {
        User::new(username.to_string(), None, "hashed_password".to_string())
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = InMemoryUserRepository::new();

        let created = repo.create(user("alice")).await.unwrap();
        assert_eq!(created.username, "alice");

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.unwrap().id, created.id);

        let by_name = repo.get_by_username("alice").await.unwrap();
        assert!(by_name.is_some());
        assert!(repo.get_by_username("ALICE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_error() {
        let repo = InMemoryUserRepository::new();
        repo.create(user("alice")).await.unwrap();

        let result = repo.create(user("alice")).await;
        assert!(matches!(result, Err(UserError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_token_is_created_once_per_user() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.create(user("alice")).await.unwrap();

        let first = repo
            .get_or_create_token(alice.id, "a".repeat(40))
            .await
            .unwrap();
        let second = repo
            .get_or_create_token(alice.id, "b".repeat(40))
            .await
            .unwrap();

        assert_eq!(first.key, second.key);
        assert_eq!(first.key, "a".repeat(40));
    }

    #[tokio::test]
    async fn test_find_user_by_token() {
        let repo = InMemoryUserRepository::new();
        let alice = repo.create(user("alice")).await.unwrap();
        let token = repo
            .get_or_create_token(alice.id, "c".repeat(40))
            .await
            .unwrap();

        let found = repo.find_user_by_token(&token.key).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
        assert!(repo.find_user_by_token("unknown").await.unwrap().is_none());
    }
}
