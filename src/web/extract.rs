use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tower_cookies::Cookies;

use super::{AppState, LOGIN_PATH};
use crate::{models::User, Error};

pub const SESSION_COOKIE: &str = "session_id";

/// The authenticated actor, resolved from the session cookie or a bearer token.
///
/// Anonymous callers are rejected with 401 when they expect JSON and redirected
/// to the login page otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(&parts.headers) {
            Some(token) => Some(token),
            None => Cookies::from_request_parts(parts, state)
                .await
                .map_err(IntoResponse::into_response)?
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_string()),
        };

        let user = match token {
            Some(token) => state
                .sessions
                .find_session_user(&token, Utc::now())
                .await
                .map_err(IntoResponse::into_response)?,
            None => None,
        };

        user.map(CurrentUser)
            .ok_or_else(|| unauthenticated(&parts.headers))
    }
}

/// Whether the caller negotiates JSON rather than browser navigation.
pub fn wants_json(headers: &HeaderMap) -> bool {
    let ajax = headers
        .get("x-requested-with")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

    let accepts_json = headers
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.contains("/json") || v.contains("+json"));

    ajax || accepts_json
}

pub(super) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn unauthenticated(headers: &HeaderMap) -> Response {
    if wants_json(headers) {
        Error::Unauthenticated.into_response()
    } else {
        (StatusCode::FOUND, [(header::LOCATION, LOGIN_PATH)]).into_response()
    }
}
