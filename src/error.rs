use std::collections::BTreeMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Not found")]
    NotFound,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            Error::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO error")
            }
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found."),
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthenticated."),
            Error::Forbidden => (StatusCode::FORBIDDEN, "This action is unauthorized."),
            Error::Validation(errors) => return errors.into_response(),
            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Field-keyed validation messages, rendered as a 422 response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Adds `other`'s fields; a field that already failed keeps its own messages.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_insert(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0
            .values()
            .flat_map(|messages| messages.iter())
            .map(String::as_str)
            .next()
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total: usize = self.0.values().map(Vec::len).sum();
        match self.first_message() {
            Some(first) if total > 1 => write!(f, "{} (and {} more)", first, total - 1),
            Some(first) => f.write_str(first),
            None => f.write_str("no errors"),
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        let message = self.to_string();
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": message, "errors": self })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "The title field is required.");
        errors.add("content", "The content field is required.");
        errors.add("title", "The title field must be a string.");

        assert!(errors.has("title"));
        assert_eq!(errors.messages("title").len(), 2);
        assert_eq!(
            errors.first_message(),
            Some("The content field is required.")
        );
        assert_eq!(
            errors.to_string(),
            "The content field is required. (and 2 more)"
        );
    }

    #[test]
    fn test_merge_keeps_existing_field_messages() {
        let mut errors = ValidationErrors::single("title", "The title field must be a string.");
        let mut other = ValidationErrors::single("title", "The title field is required.");
        other.add("content", "The content field is required.");

        errors.merge(other);

        assert_eq!(errors.messages("title"), ["The title field must be a string."]);
        assert_eq!(errors.messages("content"), ["The content field is required."]);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));

        let errors = ValidationErrors::single("email", "taken");
        assert!(errors.clone().into_result(()).is_err());
        assert_eq!(errors.to_string(), "taken");
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::Unauthenticated, StatusCode::UNAUTHORIZED),
            (Error::Forbidden, StatusCode::FORBIDDEN),
            (
                Error::Validation(ValidationErrors::single("title", "required")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                Error::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
