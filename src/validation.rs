//! Request body validation.
//!
//! Bodies arrive as a loose JSON object so that type mistakes surface as
//! field errors (422) instead of deserializer rejections.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::models::{NewPost, PostChanges};

pub type JsonObject = Map<String, Value>;

const PASSWORD_MIN_CHARS: usize = 8;
const NAME_MAX_CHARS: usize = 255;

/// Validates a create body; the post is owned by `user_id` regardless of input.
pub fn validate_new_post(user_id: Uuid, input: &JsonObject) -> Result<NewPost, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let title = field(input, &["title"]).and_then(|v| text(&mut errors, "title", v));
    let content = field(input, &["content"]).and_then(|v| text(&mut errors, "content", v));
    let is_draft = field(input, &["is_draft", "isDraft"])
        .and_then(|v| flag(&mut errors, "is_draft", v))
        .unwrap_or(false);
    let published_at = field(input, &["published_at", "publishedAt"])
        .and_then(|v| date(&mut errors, "published_at", v))
        .flatten();

    match NewPost::new(
        user_id,
        title.unwrap_or_default(),
        content.unwrap_or_default(),
        is_draft,
        published_at,
    ) {
        Ok(new_post) => errors.into_result(new_post),
        Err(rule_errors) => {
            errors.merge(rule_errors);
            Err(errors)
        }
    }
}

/// Validates an update body. Absent keys stay untouched; present keys must be valid.
pub fn validate_post_changes(input: &JsonObject) -> Result<PostChanges, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut changes = PostChanges::default();

    if let Some(title) = field(input, &["title"]).and_then(|v| text(&mut errors, "title", v)) {
        changes = changes.with_title(&mut errors, title);
    }
    if let Some(content) = field(input, &["content"]).and_then(|v| text(&mut errors, "content", v))
    {
        changes = changes.with_content(&mut errors, content);
    }
    changes.is_draft =
        field(input, &["is_draft", "isDraft"]).and_then(|v| flag(&mut errors, "is_draft", v));
    changes.published_at = field(input, &["published_at", "publishedAt"])
        .and_then(|v| date(&mut errors, "published_at", v));

    errors.into_result(changes)
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(payload: &RegisterPayload) -> Result<Registration, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        errors.add("name", "The name field is required.");
    } else if name.chars().count() > NAME_MAX_CHARS {
        errors.add(
            "name",
            format!(
                "The name field must not be greater than {} characters.",
                NAME_MAX_CHARS
            ),
        );
    }

    let email = normalize_email(&payload.email);
    if email.is_empty() {
        errors.add("email", "The email field is required.");
    } else if !looks_like_email(&email) {
        errors.add("email", "The email field must be a valid email address.");
    }

    if payload.password.chars().count() < PASSWORD_MIN_CHARS {
        errors.add(
            "password",
            format!(
                "The password field must be at least {} characters.",
                PASSWORD_MIN_CHARS
            ),
        );
    }

    errors.into_result(Registration {
        name,
        email,
        password: payload.password.clone(),
    })
}

/// The error reported when another account already owns the address.
pub fn email_taken() -> ValidationErrors {
    ValidationErrors::single("email", "The email has already been taken.")
}

/// Checks presence only; credential matching happens against the store.
pub fn validate_login(payload: &LoginPayload) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = normalize_email(&payload.email);
    if email.is_empty() {
        errors.add("email", "The email field is required.");
    }
    if payload.password.is_empty() {
        errors.add("password", "The password field is required.");
    }

    errors.into_result((email, payload.password.clone()))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

/// First present key among `names` (snake_case first, then aliases).
fn field<'a>(input: &'a JsonObject, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| input.get(*name))
}

/// Strings pass through, `null` reads as empty so the required rule reports it.
fn text(errors: &mut ValidationErrors, name: &'static str, value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => Some(String::new()),
        _ => {
            errors.add(name, format!("The {} field must be a string.", name));
            None
        }
    }
}

fn flag(errors: &mut ValidationErrors, name: &'static str, value: &Value) -> Option<bool> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "0" | "false" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    };

    if parsed.is_none() {
        errors.add(name, format!("The {} field must be true or false.", name));
    }
    parsed
}

/// `Some(None)` for an explicit `null`, `Some(Some(_))` for a parseable date.
fn date(
    errors: &mut ValidationErrors,
    name: &'static str,
    value: &Value,
) -> Option<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => match parse_timestamp(s) {
            Some(at) => Some(Some(at)),
            None => {
                errors.add(name, format!("The {} field must be a valid date.", name));
                None
            }
        },
        _ => {
            errors.add(name, format!("The {} field must be a valid date.", name));
            None
        }
    }
}

/// RFC 3339, or a naive datetime/date taken as UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
