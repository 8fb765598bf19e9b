use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::UserId;

/// Row identifier of a to-do list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ListId(pub i64);

impl std::fmt::Display for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A list id that is not a plain unsigned 32-bit decimal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidListId;

impl std::fmt::Display for InvalidListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid list id")
    }
}

impl std::error::Error for InvalidListId {}

impl std::str::FromStr for ListId {
    type Err = InvalidListId;

    /// Accepts ASCII digits only: no sign, no surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidListId);
        }
        s.parse::<u32>()
            .map(|id| ListId(i64::from(id)))
            .map_err(|_| InvalidListId)
    }
}

/// A to-do list owned by a single user.
#[derive(Debug, Clone, FromRow)]
pub struct List {
    pub id: ListId,
    pub title: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// Form submitted to `POST /list_add`.
#[derive(Debug, Deserialize, Validate)]
pub struct ListForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "List title must be 1 to 200 characters"))]
    pub list_title: String,
}

/// Form submitted to `POST /list_delete`.
///
/// The id stays a string so a malformed value is answered with our own 400.
#[derive(Debug, Deserialize)]
pub struct ListDeleteForm {
    #[serde(default)]
    pub list_id: String,
}
