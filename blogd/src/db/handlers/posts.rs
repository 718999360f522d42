use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::posts::{PostCreateDBRequest, PostDBResponse, PostFilter, PostUpdateDBRequest},
    },
    types::{PostId, abbrev_uuid},
};
use sqlx::PgPool;
use tracing::instrument;

/// Post storage. Every response is joined with its author.
pub trait PostRepository:
    Repository<
        CreateRequest = PostCreateDBRequest,
        UpdateRequest = PostUpdateDBRequest,
        Response = PostDBResponse,
        Id = PostId,
        Filter = PostFilter,
    >
{
}

impl<T> PostRepository for T where
    T: Repository<
            CreateRequest = PostCreateDBRequest,
            UpdateRequest = PostUpdateDBRequest,
            Response = PostDBResponse,
            Id = PostId,
            Filter = PostFilter,
        >
{
}

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.category, p.user_id, \
     u.email AS author_email, u.name AS author_name, p.created_at, p.updated_at";

/// PostgreSQL-backed posts table
#[derive(Debug, Clone)]
pub struct Posts {
    db: PgPool,
}

impl Posts {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Posts {
    type CreateRequest = PostCreateDBRequest;
    type UpdateRequest = PostUpdateDBRequest;
    type Response = PostDBResponse;
    type Id = PostId;
    type Filter = PostFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            "WITH p AS (INSERT INTO posts (user_id, title, content, category) VALUES ($1, $2, $3, $4) RETURNING *) \
             SELECT {POST_COLUMNS} FROM p JOIN users u ON u.id = p.user_id"
        );
        let post = sqlx::query_as::<_, PostDBResponse>(&query)
            .bind(request.user_id)
            .bind(&request.title)
            .bind(&request.content)
            .bind(request.category)
            .fetch_one(&self.db)
            .await?;
        Ok(post)
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.user_id WHERE p.id = $1");
        let post = sqlx::query_as::<_, PostDBResponse>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(post)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.user_id \
             WHERE ($1::uuid IS NULL OR p.user_id = $1) ORDER BY p.updated_at DESC"
        );
        let posts = sqlx::query_as::<_, PostDBResponse>(&query)
            .bind(filter.user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(posts)
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            "WITH p AS (UPDATE posts SET title = COALESCE($2, title), content = COALESCE($3, content), \
             category = COALESCE($4, category), updated_at = NOW() WHERE id = $1 RETURNING *) \
             SELECT {POST_COLUMNS} FROM p JOIN users u ON u.id = p.user_id"
        );
        sqlx::query_as::<_, PostDBResponse>(&query)
            .bind(id)
            .bind(request.title.as_deref())
            .bind(request.content.as_deref())
            .bind(request.category)
            .fetch_optional(&self.db)
            .await?
            .ok_or(DbError::NotFound)
    }
}
