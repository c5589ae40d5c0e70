mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{NewPost, NewUser, Post, Scope, Session, User};
use crate::Result;

pub const PER_PAGE: u32 = 20;

pub async fn create_pool(database_url: &str, max_connections: u32) -> crate::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// One-based page number with a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Reads a `?page=` value; anything missing, non-numeric or below 1 is page 1.
    pub fn from_query(page: Option<&str>) -> Self {
        let page = page
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(1);
        Self::new(page, PER_PAGE)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn last_page(&self, total: i64) -> u32 {
        let per_page = i64::from(self.per_page);
        let pages = (total.max(0) + per_page - 1) / per_page;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// Persists the owner-mutable fields and refreshes `updated_at`.
    async fn save_post(&self, post: &Post) -> Result<Post>;

    /// Returns whether a post was removed.
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    /// Posts matching `scope` at `now`, oldest first.
    async fn list_posts(&self, scope: Scope, now: DateTime<Utc>, page: PageRequest)
        -> Result<Vec<Post>>;

    async fn count_posts(&self, scope: Scope, now: DateTime<Utc>) -> Result<i64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert_session(&self, session: Session) -> Result<Session>;

    /// The session's user, provided the session has not expired at `now`.
    async fn find_session_user(&self, token: &str, now: DateTime<Utc>) -> Result<Option<User>>;

    async fn delete_session(&self, token: &str) -> Result<()>;

    /// Removes every session that has expired at `now`, returning how many.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_query() {
        assert_eq!(PageRequest::from_query(None), PageRequest::new(1, PER_PAGE));
        assert_eq!(PageRequest::from_query(Some("3")).page, 3);
        assert_eq!(PageRequest::from_query(Some("0")).page, 1);
        assert_eq!(PageRequest::from_query(Some("-2")).page, 1);
        assert_eq!(PageRequest::from_query(Some("abc")).page, 1);
    }

    #[test]
    fn test_page_offsets() {
        let first = PageRequest::new(1, 20);
        let third = PageRequest::new(3, 20);

        assert_eq!(first.offset(), 0);
        assert_eq!(third.offset(), 40);
        assert_eq!(third.limit(), 20);
    }

    #[test]
    fn test_last_page() {
        let page = PageRequest::new(1, 20);

        assert_eq!(page.last_page(0), 1);
        assert_eq!(page.last_page(20), 1);
        assert_eq!(page.last_page(21), 2);
        assert_eq!(page.last_page(25), 2);
    }
}
