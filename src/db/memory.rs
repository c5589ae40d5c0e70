//! In-memory store used by tests and for running without Postgres.
//! Data is lost when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PageRequest, PostRepository, SessionRepository, UserRepository};
use crate::models::{NewPost, NewUser, Post, Scope, Session, User};
use crate::{validation, Error, Result};

#[derive(Default)]
pub struct MemoryStore {
    posts: RwLock<HashMap<Uuid, Post>>,
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        if !self.users.read().await.contains_key(&post.user_id) {
            return Err(Error::Internal(format!(
                "post owner {} does not exist",
                post.user_id
            )));
        }

        let post = post.into_post(Uuid::new_v4(), Utc::now());
        self.posts.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn save_post(&self, post: &Post) -> Result<Post> {
        let mut posts = self.posts.write().await;
        let stored = posts.get_mut(&post.id).ok_or(Error::NotFound)?;

        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.is_draft = post.is_draft;
        stored.published_at = post.published_at;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        Ok(self.posts.write().await.remove(&id).is_some())
    }

    async fn list_posts(
        &self,
        scope: Scope,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut matching: Vec<&Post> = posts
            .values()
            .filter(|post| scope.matches(post, now))
            .collect();
        matching.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);

        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_posts(&self, scope: Scope, now: DateTime<Utc>) -> Result<i64> {
        let posts = self.posts.read().await;
        let total = posts.values().filter(|post| scope.matches(post, now)).count();
        Ok(i64::try_from(total).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(validation::email_taken().into());
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert_session(&self, session: Session) -> Result<Session> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn find_session_user(&self, token: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        let user_id = match self.sessions.read().await.get(token) {
            Some(session) if session.is_valid_at(now) => session.user_id,
            _ => return Ok(None),
        };

        self.find_user(user_id).await
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_valid_at(now));
        Ok(u64::try_from(before - sessions.len()).unwrap_or(u64::MAX))
    }
}
