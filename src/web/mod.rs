mod account;
mod extract;
pub mod handlers;
pub mod routes;


pub use extract::{wants_json, CurrentUser, SESSION_COOKIE};

use axum::Router;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::{PostRepository, SessionRepository, UserRepository};

pub const LOGIN_PATH: &str = "/login";

pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub session_ttl: chrono::Duration,
}

impl AppState {
    pub fn new<S>(store: S, session_ttl: chrono::Duration) -> Arc<Self>
    where
        S: PostRepository + UserRepository + SessionRepository + 'static,
    {
        let store = Arc::new(store);
        Arc::new(Self {
            posts: store.clone(),
            users: store.clone(),
            sessions: store,
            session_ttl,
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: String, state: Arc<AppState>) -> crate::Result<()> {
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| crate::Error::Internal(e.to_string()))?;

    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
