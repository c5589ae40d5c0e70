use crate::models::{Post, User};
use crate::{Error, Result};

/// Mutations gated by ownership. Both resolve to the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAbility {
    Update,
    Delete,
}

pub fn can_modify(actor: &User, post: &Post) -> bool {
    actor.id == post.user_id
}

pub fn authorize(actor: &User, ability: PostAbility, post: &Post) -> Result<()> {
    if can_modify(actor, post) {
        return Ok(());
    }

    tracing::warn!(
        "User {} denied {:?} on post {} owned by {}",
        actor.id,
        ability,
        post.id,
        post.user_id
    );
    Err(Error::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPost;
    use chrono::Utc;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "someone".to_string(),
            email: "someone@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn post_by(owner: &User) -> Post {
        NewPost::new(owner.id, "Title", "Body", false, None)
            .unwrap()
            .into_post(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_owner_can_modify() {
        let owner = user();
        let post = post_by(&owner);

        assert!(can_modify(&owner, &post));
        assert!(authorize(&owner, PostAbility::Update, &post).is_ok());
        assert!(authorize(&owner, PostAbility::Delete, &post).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let owner = user();
        let other = user();
        let post = post_by(&owner);

        assert!(!can_modify(&other, &post));
        for ability in [PostAbility::Update, PostAbility::Delete] {
            assert!(matches!(
                authorize(&other, ability, &post),
                Err(Error::Forbidden)
            ));
        }
    }
}
