use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
    },
    types::{UserId, abbrev_uuid},
};
use sqlx::PgPool;
use tracing::instrument;

/// User storage: the generic CRUD operations plus lookup by email.
#[async_trait::async_trait]
pub trait UserRepository:
    Repository<
        CreateRequest = UserCreateDBRequest,
        UpdateRequest = UserUpdateDBRequest,
        Response = UserDBResponse,
        Id = UserId,
        Filter = UserFilter,
    >
{
    /// Find a user by normalized email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>>;
}

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at, updated_at";

/// PostgreSQL-backed users table
#[derive(Debug, Clone)]
pub struct Users {
    db: PgPool,
}

impl Users {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Users {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!("INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(&request.email)
            .bind(&request.name)
            .bind(&request.password_hash)
            .fetch_one(&self.db)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE ($1::text IS NULL OR email = $1) ORDER BY created_at");
        let users = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(filter.email.as_deref())
            .fetch_all(&self.db)
            .await?;
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            "UPDATE users SET name = COALESCE($2, name), password_hash = COALESCE($3, password_hash), updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(id)
            .bind(request.name.as_deref())
            .bind(request.password_hash.as_deref())
            .fetch_optional(&self.db)
            .await?
            .ok_or(DbError::NotFound)
    }
}

#[async_trait::async_trait]
impl UserRepository for Users {
    #[instrument(skip(self, email), err)]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, UserDBResponse>(&query)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}
