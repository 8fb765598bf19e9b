use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::models::UserId;

/// Payload persisted for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Set once the visitor has logged in.
    pub user_id: Option<UserId>,
}

/// Failure inside a session backend.
#[derive(Debug)]
pub enum SessionError {
    Database(sqlx::Error),
    Encoding(serde_json::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionError::Database(e) => write!(f, "session store error: {}", e),
            SessionError::Encoding(e) => write!(f, "session encoding error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Database(e) => Some(e),
            SessionError::Encoding(e) => Some(e),
        }
    }
}

impl From<sqlx::Error> for SessionError {
    fn from(error: sqlx::Error) -> Self {
        SessionError::Database(error)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(error: serde_json::Error) -> Self {
        SessionError::Encoding(error)
    }
}

/// Key-value backend for session records.
///
/// Implementations must treat a record whose expiry has passed as absent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the live record stored under `id`, if any.
    async fn get(&self, id: &str) -> Result<Option<SessionData>, SessionError>;

    /// Inserts or replaces the record under `id`.
    async fn set(
        &self,
        id: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError>;

    /// Removes the record under `id`. Removing a missing record is not an error.
    async fn delete(&self, id: &str) -> Result<(), SessionError>;

    /// Drops every expired record and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, SessionError>;
}

/// Runs [`SessionStore::purge_expired`] every `period` until the runtime
/// shuts down.
pub fn spawn_purge_task(
    store: Arc<dyn SessionStore>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => log::debug!("Purged {} expired sessions", removed),
                Err(e) => log::warn!("Failed to purge expired sessions: {}", e),
            }
        }
    })
}
