use crate::types::{PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Post category, stored as the `post_category` Postgres enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "post_category")]
pub enum PostCategory {
    Education,
    Sport,
    Politics,
}

impl PostCategory {
    pub const ALL_NAMES: [&'static str; 3] = ["Education", "Sport", "Politics"];
}

impl FromStr for PostCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Education" => Ok(PostCategory::Education),
            "Sport" => Ok(PostCategory::Sport),
            "Politics" => Ok(PostCategory::Politics),
            other => Err(format!("unknown post category: {other}")),
        }
    }
}

/// Database request for creating a new post
#[derive(Debug, Clone)]
pub struct PostCreateDBRequest {
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
}

/// Database request for updating a post. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct PostUpdateDBRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<PostCategory>,
}

/// Filter for listing posts. Listings are always most recently updated first.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Only posts authored by this user
    pub user_id: Option<UserId>,
}

impl PostFilter {
    pub fn by_author(user_id: UserId) -> Self {
        Self { user_id: Some(user_id) }
    }
}

/// Database response for a post, joined with its author
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostDBResponse {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub user_id: UserId,
    pub author_email: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
