use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

use crate::{
    auth::AuthService,
    error::ValidationErrors,
    models::{NewUser, User},
    resource::SessionResource,
    validation::{self, LoginPayload, RegisterPayload},
    Result,
};

use super::{extract::bearer_token, handlers::json_body, AppState, CurrentUser, SESSION_COOKIE};

pub async fn login_form() -> &'static str {
    "auth.login"
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    body: std::result::Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResource>)> {
    let payload = json_body(body)?;
    let registration = validation::validate_registration(&payload)?;

    if state
        .users
        .find_user_by_email(&registration.email)
        .await?
        .is_some()
    {
        return Err(validation::email_taken().into());
    }

    // The unique index still decides when two registrations race past the check above.
    let password_hash = AuthService::hash_password_blocking(registration.password).await?;
    let user = state
        .users
        .insert_user(NewUser {
            name: registration.name,
            email: registration.email,
            password_hash,
        })
        .await?;
    tracing::info!("Registered user {}", user.id);

    let session = start_session(&state, &cookies, user).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    body: std::result::Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Json<SessionResource>> {
    let payload = json_body(body)?;
    let (email, password) = validation::validate_login(&payload)?;

    let user = match state.users.find_user_by_email(&email).await? {
        Some(user) => {
            let hash = user.password_hash.clone();
            AuthService::verify_password_blocking(password, hash)
                .await?
                .then_some(user)
        }
        None => None,
    };

    let Some(user) = user else {
        tracing::warn!("Failed login attempt for {}", email);
        return Err(ValidationErrors::single(
            "email",
            "These credentials do not match our records.",
        )
        .into());
    };

    Ok(Json(start_session(&state, &cookies, user).await?))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let token = bearer_token(&headers)
        .or_else(|| cookies.get(SESSION_COOKIE).map(|c| c.value().to_string()));

    if let Some(token) = token {
        state.sessions.delete_session(&token).await?;
    }
    cookies.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    tracing::info!("User {} logged out", user.id);

    Ok(StatusCode::NO_CONTENT)
}

async fn start_session(state: &AppState, cookies: &Cookies, user: User) -> Result<SessionResource> {
    let now = Utc::now();
    let pruned = state.sessions.delete_expired_sessions(now).await?;
    if pruned > 0 {
        tracing::debug!("Pruned {} expired sessions", pruned);
    }

    let session = AuthService::new_session(user.id, now, state.session_ttl);
    let session = state.sessions.insert_session(session).await?;

    cookies.add(
        Cookie::build((SESSION_COOKIE, session.token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    );

    Ok(SessionResource {
        user: (&user).into(),
        token: session.token,
    })
}
