use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr,
};
use uuid::Uuid;

use crate::entity::{auth_token, user};
use crate::error::{UserError, UserResult};
use crate::models::{AuthToken, User};
use crate::repository::UserRepository;

pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_token_for(&self, user_id: Uuid) -> UserResult<Option<AuthToken>> {
        let model = auth_token::Entity::find()
            .filter(auth_token::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, input: User) -> UserResult<User> {
        let username = input.username.clone();
        let active_model: user::ActiveModel = input.into();

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserError::DuplicateUsername(username)
            } else {
                UserError::Database(e)
            }
        })?;

        tracing::info!(user_id = %model.id, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn get_or_create_token(&self, user_id: Uuid, new_key: String) -> UserResult<AuthToken> {
        if let Some(existing) = self.find_token_for(user_id).await? {
            return Ok(existing);
        }

        let active_model = auth_token::ActiveModel {
            key: Set(new_key),
            user_id: Set(user_id),
            created_at: Set(Utc::now().into()),
        };

        match active_model.insert(&self.db).await {
            Ok(model) => {
                tracing::info!(user_id = %user_id, "Issued API token");
                Ok(model.into())
            }
            // A concurrent login for the same user won the insert
            Err(e) if is_unique_violation(&e) => self
                .find_token_for(user_id)
                .await?
                .ok_or_else(|| UserError::Internal("token vanished after conflict".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_token(&self, key: &str) -> UserResult<Option<User>> {
        let found = auth_token::Entity::find_by_id(key.to_string())
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;
        Ok(found.and_then(|(_, owner)| owner).map(Into::into))
    }
}
