use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::PageRequest,
    error::ValidationErrors,
    models::{Post, Scope, User},
    policy::{self, PostAbility},
    resource::{PostPage, PostResource},
    validation::{self, JsonObject},
    Error, Result,
};

use super::{AppState, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<PostPage>> {
    let page = PageRequest::from_query(params.page.as_deref());
    let now = Utc::now();

    let posts = state.posts.list_posts(Scope::Active, now, page).await?;
    let total = state.posts.count_posts(Scope::Active, now).await?;
    let data = with_authors(&state, posts).await?;

    Ok(Json(PostPage::new(data, total, page)))
}

pub async fn create_form(CurrentUser(_user): CurrentUser) -> &'static str {
    "posts.create"
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: std::result::Result<Json<JsonObject>, JsonRejection>,
) -> Result<(StatusCode, Json<PostResource>)> {
    let input = json_body(body)?;
    let new_post = validation::validate_new_post(user.id, &input)?;

    let post = state.posts.insert_post(new_post).await?;
    tracing::info!("User {} created post {}", user.id, post.id);

    Ok((StatusCode::CREATED, Json(PostResource::new(post, &user))))
}

/// Hidden posts answer exactly like missing ones.
pub async fn show_post(
    State(state): State<Arc<AppState>>,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PostResource>> {
    let post = find_post(&state, id).await?;
    if !post.is_active(Utc::now()) {
        return Err(Error::NotFound);
    }

    let author = author_of(&state, &post).await?;
    Ok(Json(PostResource::new(post, &author)))
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<&'static str> {
    let post = find_post(&state, id).await?;
    policy::authorize(&user, PostAbility::Update, &post)?;

    Ok("posts.edit")
}

pub async fn update_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    id: std::result::Result<Path<Uuid>, PathRejection>,
    body: std::result::Result<Json<JsonObject>, JsonRejection>,
) -> Result<Json<PostResource>> {
    let mut post = find_post(&state, id).await?;
    policy::authorize(&user, PostAbility::Update, &post)?;

    let changes = validation::validate_post_changes(&json_body(body)?)?;
    post.apply(changes);
    let post = state.posts.save_post(&post).await?;
    tracing::info!("User {} updated post {}", user.id, post.id);

    Ok(Json(PostResource::new(post, &user)))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode> {
    let post = find_post(&state, id).await?;
    policy::authorize(&user, PostAbility::Delete, &post)?;

    if !state.posts.delete_post(post.id).await? {
        return Err(Error::NotFound);
    }
    tracing::info!("User {} deleted post {}", user.id, post.id);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// An unparseable id is indistinguishable from an unknown one.
async fn find_post(
    state: &AppState,
    id: std::result::Result<Path<Uuid>, PathRejection>,
) -> Result<Post> {
    let Path(id) = id.map_err(|_| Error::NotFound)?;

    state.posts.find_post(id).await?.ok_or(Error::NotFound)
}

async fn author_of(state: &AppState, post: &Post) -> Result<User> {
    state
        .users
        .find_user(post.user_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("post {} has no owner", post.id)))
}

async fn with_authors(state: &AppState, posts: Vec<Post>) -> Result<Vec<PostResource>> {
    let mut ids: Vec<Uuid> = posts.iter().map(|post| post.user_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let authors: HashMap<Uuid, User> = state
        .users
        .find_users(&ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    posts
        .into_iter()
        .map(|post| -> Result<PostResource> {
            let author = authors
                .get(&post.user_id)
                .ok_or_else(|| Error::Internal(format!("post {} has no owner", post.id)))?;
            Ok(PostResource::new(post, author))
        })
        .collect()
}

pub(super) fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(ValidationErrors::single("body", rejection.body_text()).into())
        }
    }
}
