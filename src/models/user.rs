use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::auth::validate_password_length;

/// Row identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered account as stored in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never rendered.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column a user can be looked up by.
#[derive(Debug, Clone, Copy)]
pub enum UserLookup<'a> {
    Email(&'a str),
    Username(&'a str),
}

impl UserLookup<'_> {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            UserLookup::Email(_) => "email",
            UserLookup::Username(_) => "username",
        }
    }

    pub(crate) fn value(&self) -> &str {
        match self {
            UserLookup::Email(value) | UserLookup::Username(value) => value,
        }
    }
}

/// Registration form submitted to `POST /register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 50, message = "Username must be 1 to 50 characters"))]
    pub username: String,
    #[validate(email(message = "Email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[validate(custom = "validate_password_length")]
    pub password: String,
}

/// Login form submitted to `POST /login`.
///
/// Deliberately unvalidated: an unknown or malformed email is answered with
/// the same "Wrong email" rejection.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
