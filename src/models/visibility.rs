//! Post visibility scopes.
//!
//! Each scope has two forms that must agree: [`Scope::matches`] evaluates a single
//! post in memory, [`Scope::push_condition`] appends the equivalent SQL predicate.
//! Both take the evaluation time explicitly; nothing here is cached on the record.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use super::Post;

/// Publicly visible right now: not a draft and published at or before `now`.
pub fn is_active(post: &Post, now: DateTime<Utc>) -> bool {
    !post.is_draft && post.published_at.is_some_and(|at| at <= now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Active,
    /// Same rows as [`Scope::Active`].
    Published,
    Draft,
    Scheduled,
}

impl Scope {
    pub fn matches(self, post: &Post, now: DateTime<Utc>) -> bool {
        match self {
            Scope::Active | Scope::Published => is_active(post, now),
            Scope::Draft => post.is_draft,
            Scope::Scheduled => !post.is_draft && post.published_at.is_some_and(|at| at > now),
        }
    }

    /// Appends this scope's `WHERE` predicate. A NULL `published_at` never compares true.
    pub fn push_condition(self, query: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        match self {
            Scope::Active | Scope::Published => {
                query.push("is_draft = FALSE AND published_at <= ");
                query.push_bind(now);
            }
            Scope::Draft => {
                query.push("is_draft = TRUE");
            }
            Scope::Scheduled => {
                query.push("is_draft = FALSE AND published_at > ");
                query.push_bind(now);
            }
        }
    }
}
