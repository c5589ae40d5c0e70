//! JSON shapes returned by the API.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::db::PageRequest;
use crate::models::{Post, User};

/// Public view of a user. Never carries the email or credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostResource {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_draft: bool,
    #[serde(serialize_with = "timestamp_opt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
}

impl PostResource {
    pub fn new(post: Post, author: &User) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            content: post.content,
            is_draft: post.is_draft,
            published_at: post.published_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
            user: author.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub data: Vec<PostResource>,
    pub total: i64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
}

impl PostPage {
    pub fn new(data: Vec<PostResource>, total: i64, page: PageRequest) -> Self {
        Self {
            data,
            total,
            per_page: page.per_page,
            current_page: page.page,
            last_page: page.last_page(total),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResource {
    pub user: UserSummary,
    pub token: String,
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(at))
}

fn timestamp_opt<S: Serializer>(
    at: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => serializer.serialize_str(&format_timestamp(at)),
        None => serializer.serialize_none(),
    }
}
