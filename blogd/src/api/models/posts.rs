use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    api::models::users::Identity,
    db::models::posts::{PostCategory, PostDBResponse},
    types::PostId,
};

/// Create/update body. Raw JSON fields; missing, `null` and mistyped values are reported by
/// validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PostRequest {
    #[schema(value_type = String)]
    pub title: Option<Value>,
    #[schema(value_type = String)]
    pub content: Option<Value>,
    /// One of `Education`, `Sport`, `Politics`
    #[schema(value_type = String)]
    pub category: Option<Value>,
}

/// Validated post input
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub category: PostCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Author of the post
    pub user: Identity,
}

impl From<PostDBResponse> for PostResponse {
    fn from(post: PostDBResponse) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            category: post.category,
            created_at: post.created_at,
            updated_at: post.updated_at,
            user: Identity {
                id: post.user_id,
                email: post.author_email,
                name: post.author_name,
            },
        }
    }
}
