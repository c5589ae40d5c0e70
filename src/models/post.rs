use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationErrors;

use super::visibility;

pub const TITLE_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_draft: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a post sits relative to the public, computed at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    Draft,
    Scheduled,
    Active,
    /// Not a draft but without a publication date; invisible and outside every scope.
    Unscheduled,
}

impl Post {
    pub fn state(&self, now: DateTime<Utc>) -> PostState {
        match (self.is_draft, self.published_at) {
            (true, _) => PostState::Draft,
            (false, None) => PostState::Unscheduled,
            (false, Some(at)) if at > now => PostState::Scheduled,
            (false, Some(_)) => PostState::Active,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        visibility::is_active(self, now)
    }

    /// Applies owner-mutable fields. `id`, `user_id` and timestamps are left alone.
    pub fn apply(&mut self, changes: PostChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(content) = changes.content {
            self.content = content;
        }
        if let Some(is_draft) = changes.is_draft {
            self.is_draft = is_draft;
        }
        if let Some(published_at) = changes.published_at {
            self.published_at = published_at;
        }
    }
}

/// A validated post that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_draft: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewPost {
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        content: impl Into<String>,
        is_draft: bool,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = check_title(&mut errors, title.into());
        let content = check_content(&mut errors, content.into());

        errors.into_result(Self {
            user_id,
            title,
            content,
            is_draft,
            published_at,
        })
    }

    /// The record as it looks once stored with the given id and timestamp.
    pub fn into_post(self, id: Uuid, now: DateTime<Utc>) -> Post {
        Post {
            id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            is_draft: self.is_draft,
            published_at: self.published_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of the owner-mutable fields. `published_at: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_draft: Option<bool>,
    pub published_at: Option<Option<DateTime<Utc>>>,
}

impl PostChanges {
    pub fn with_title(
        mut self,
        errors: &mut ValidationErrors,
        title: impl Into<String>,
    ) -> Self {
        self.title = Some(check_title(errors, title.into()));
        self
    }

    pub fn with_content(
        mut self,
        errors: &mut ValidationErrors,
        content: impl Into<String>,
    ) -> Self {
        self.content = Some(check_content(errors, content.into()));
        self
    }
}

fn check_title(errors: &mut ValidationErrors, title: String) -> String {
    let title = title.trim().to_string();
    if title.is_empty() {
        errors.add("title", "The title field is required.");
    } else if title.chars().count() > TITLE_MAX_CHARS {
        errors.add(
            "title",
            format!(
                "The title field must not be greater than {} characters.",
                TITLE_MAX_CHARS
            ),
        );
    }
    title
}

fn check_content(errors: &mut ValidationErrors, content: String) -> String {
    let content = content.trim().to_string();
    if content.is_empty() {
        errors.add("content", "The content field is required.");
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(is_draft: bool, published_at: Option<DateTime<Utc>>) -> Post {
        NewPost::new(Uuid::new_v4(), "Title", "Body", is_draft, published_at)
            .unwrap()
            .into_post(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_state_classification() {
        let now = Utc::now();

        assert_eq!(post(true, None).state(now), PostState::Draft);
        assert_eq!(
            post(true, Some(now - Duration::days(1))).state(now),
            PostState::Draft
        );
        assert_eq!(
            post(false, Some(now + Duration::days(1))).state(now),
            PostState::Scheduled
        );
        assert_eq!(
            post(false, Some(now - Duration::days(1))).state(now),
            PostState::Active
        );
        assert_eq!(post(false, Some(now)).state(now), PostState::Active);
        assert_eq!(post(false, None).state(now), PostState::Unscheduled);
    }

    #[test]
    fn test_new_post_requires_title_and_content() {
        let errors = NewPost::new(Uuid::new_v4(), "  ", "", false, None).unwrap_err();

        assert_eq!(errors.messages("title"), ["The title field is required."]);
        assert_eq!(errors.messages("content"), ["The content field is required."]);
    }

    #[test]
    fn test_new_post_trims_and_limits_title() {
        let new_post = NewPost::new(Uuid::new_v4(), "  Hello  ", " World ", false, None).unwrap();
        assert_eq!(new_post.title, "Hello");
        assert_eq!(new_post.content, "World");

        let too_long = "x".repeat(TITLE_MAX_CHARS + 1);
        let errors = NewPost::new(Uuid::new_v4(), too_long, "Body", false, None).unwrap_err();
        assert!(errors.has("title"));
        assert!(!errors.has("content"));
    }

    #[test]
    fn test_apply_only_touches_given_fields() {
        let mut original = post(true, None);
        let owner = original.user_id;
        let published = Utc::now();

        original.apply(PostChanges {
            title: Some("Updated".to_string()),
            is_draft: Some(false),
            published_at: Some(Some(published)),
            ..PostChanges::default()
        });

        assert_eq!(original.title, "Updated");
        assert_eq!(original.content, "Body");
        assert!(!original.is_draft);
        assert_eq!(original.published_at, Some(published));
        assert_eq!(original.user_id, owner);

        original.apply(PostChanges {
            published_at: Some(None),
            ..PostChanges::default()
        });
        assert_eq!(original.published_at, None);
    }
}
