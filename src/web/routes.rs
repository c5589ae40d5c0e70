use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::{account, handlers, AppState, LOGIN_PATH};

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", get(handlers::list_posts).post(handlers::create_post))
        .route("/posts/create", get(handlers::create_form))
        .route(
            "/posts/:id",
            get(handlers::show_post)
                .put(handlers::update_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/posts/:id/edit", get(handlers::edit_form))
        .route(LOGIN_PATH, get(account::login_form).post(account::login))
        .route("/register", post(account::register))
        .route("/logout", post(account::logout))
        .route("/health", get(handlers::health))
}
