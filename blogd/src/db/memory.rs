//! In-process store backed by [`DashMap`] tables.
//!
//! Mirrors the PostgreSQL schema's constraints: emails are unique (enforced atomically through an
//! email index, reported as a `UniqueViolation` on `users`), posts must reference an existing user,
//! and deleting a user removes their posts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::{Repository, UserRepository},
        models::{
            posts::{PostCategory, PostCreateDBRequest, PostDBResponse, PostFilter, PostUpdateDBRequest},
            users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
        },
        store::Store,
    },
    types::{PostId, UserId, abbrev_uuid},
};

#[derive(Debug, Clone)]
struct PostRecord {
    id: PostId,
    title: String,
    content: String,
    category: PostCategory,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: DashMap<UserId, UserDBResponse>,
    emails: DashMap<String, UserId>,
    posts: DashMap<PostId, PostRecord>,
}

impl Tables {
    fn join(&self, post: PostRecord) -> Result<PostDBResponse> {
        let author = self
            .users
            .get(&post.user_id)
            .map(|u| (u.email.clone(), u.name.clone()))
            .ok_or_else(|| anyhow::anyhow!("post {} references missing user {}", post.id, post.user_id))?;

        Ok(PostDBResponse {
            id: post.id,
            title: post.title,
            content: post.content,
            category: post.category,
            user_id: post.user_id,
            author_email: author.0,
            author_name: author.1,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }
}

/// In-memory users table
#[derive(Debug, Clone)]
pub struct MemoryUsers {
    tables: Arc<Tables>,
}

/// In-memory posts table
#[derive(Debug, Clone)]
pub struct MemoryPosts {
    tables: Arc<Tables>,
}

/// Store whose users and posts share one set of tables
#[derive(Debug, Clone)]
pub struct MemoryStore {
    users: MemoryUsers,
    posts: MemoryPosts,
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables = Arc::new(Tables::default());
        Self {
            users: MemoryUsers { tables: tables.clone() },
            posts: MemoryPosts { tables },
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    type Users = MemoryUsers;
    type Posts = MemoryPosts;

    fn users(&self) -> &MemoryUsers {
        &self.users
    }

    fn posts(&self) -> &MemoryPosts {
        &self.posts
    }
}

#[async_trait::async_trait]
impl Repository for MemoryUsers {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        match self.tables.emails.entry(request.email.clone()) {
            Entry::Occupied(_) => Err(DbError::UniqueViolation {
                constraint: Some("users_email_key".to_string()),
                table: Some("users".to_string()),
                message: "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
            }),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = UserDBResponse {
                    id: Uuid::new_v4(),
                    email: request.email.clone(),
                    name: request.name.clone(),
                    password_hash: request.password_hash.clone(),
                    created_at: now,
                    updated_at: now,
                };
                self.tables.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.users.get(&id).map(|u| u.clone()))
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut users: Vec<UserDBResponse> = self
            .tables
            .users
            .iter()
            .filter(|u| filter.email.as_ref().is_none_or(|email| &u.email == email))
            .map(|u| u.clone())
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let Some((_, user)) = self.tables.users.remove(&id) else {
            return Ok(false);
        };
        self.tables.emails.remove(&user.email);
        self.tables.posts.retain(|_, post| post.user_id != id);
        Ok(true)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut user = self.tables.users.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(hash) = &request.password_hash {
            user.password_hash = hash.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryUsers {
    #[instrument(skip(self, email), err)]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let Some(id) = self.tables.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.tables.users.get(&id).map(|u| u.clone()))
    }
}

#[async_trait::async_trait]
impl Repository for MemoryPosts {
    type CreateRequest = PostCreateDBRequest;
    type UpdateRequest = PostUpdateDBRequest;
    type Response = PostDBResponse;
    type Id = PostId;
    type Filter = PostFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        if !self.tables.users.contains_key(&request.user_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("posts_user_id_fkey".to_string()),
                table: Some("posts".to_string()),
                message: format!("user {} does not exist", request.user_id),
            });
        }

        let now = Utc::now();
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            content: request.content.clone(),
            category: request.category,
            user_id: request.user_id,
            created_at: now,
            updated_at: now,
        };
        self.tables.posts.insert(post.id, post.clone());
        self.tables.join(post)
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let post = self.tables.posts.get(&id).map(|p| p.clone());
        post.map(|p| self.tables.join(p)).transpose()
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut posts: Vec<PostRecord> = self
            .tables
            .posts
            .iter()
            .filter(|p| filter.user_id.is_none_or(|user_id| p.user_id == user_id))
            .map(|p| p.clone())
            .collect();

        posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        posts.into_iter().map(|p| self.tables.join(p)).collect()
    }

    #[instrument(skip(self), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<bool> {
        Ok(self.tables.posts.remove(&id).is_some())
    }

    #[instrument(skip(self, request), fields(post_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let updated = {
            let mut post = self.tables.posts.get_mut(&id).ok_or(DbError::NotFound)?;
            if let Some(title) = &request.title {
                post.title = title.clone();
            }
            if let Some(content) = &request.content {
                post.content = content.clone();
            }
            if let Some(category) = request.category {
                post.category = category;
            }
            post.updated_at = Utc::now();
            post.clone()
        };
        self.tables.join(updated)
    }
}
