//! # Server-side sessions
//!
//! A visitor is identified by an opaque `session_id` cookie (a random UUID).
//! The record behind it lives in a [`SessionStore`] and holds the logged-in
//! user's id. Records expire [`SESSION_TTL_HOURS`] after their last write.
//!
//! Store failures never fail a request: they are logged and the visitor is
//! treated as anonymous.

pub mod memory;
pub mod sqlite;
pub mod store;

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::UserId;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;
pub use store::{spawn_purge_task, SessionData, SessionError, SessionStore};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Lifetime of a session record after its last write.
pub const SESSION_TTL_HOURS: i64 = 24;

/// One visitor's session as loaded for the current request.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: SessionData,
    fresh: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data: SessionData::default(),
            fresh: true,
        }
    }

    fn existing(id: String, data: SessionData) -> Self {
        Self {
            id,
            data,
            fresh: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when no stored record backed this session at load time.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.data.user_id
    }

    pub fn set_user_id(&mut self, user_id: UserId) {
        self.data.user_id = Some(user_id);
    }

    pub fn clear_user_id(&mut self) {
        self.data.user_id = None;
    }
}

/// Issues, reads and clears sessions on top of a [`SessionStore`].
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    cookie_secure: bool,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, cookie_secure: bool) -> Self {
        Self {
            store,
            cookie_secure,
        }
    }

    /// Returns the session named by the request's cookie, or a fresh unsaved
    /// one when there is no cookie, no live record, or the store failed.
    pub async fn load(&self, req: &HttpRequest) -> Session {
        let Some(cookie) = req.cookie(SESSION_COOKIE) else {
            return Session::new();
        };

        match self.store.get(cookie.value()).await {
            Ok(Some(data)) => Session::existing(cookie.value().to_owned(), data),
            Ok(None) => Session::new(),
            Err(e) => {
                log::error!("Failed to get session: {}", e);
                Session::new()
            }
        }
    }

    /// The session the access guard already loaded for `req`, falling back
    /// to [`SessionService::load`] on unguarded routes.
    pub async fn current(&self, req: &HttpRequest) -> Session {
        let loaded = req.extensions_mut().remove::<Session>();
        match loaded {
            Some(session) => session,
            None => self.load(req).await,
        }
    }

    pub fn get_user(&self, session: &Session) -> Option<UserId> {
        session.user_id()
    }

    /// Records `user_id` as logged in and persists immediately.
    ///
    /// The session id is rotated on login, so an id handed out before
    /// authentication never becomes an authenticated one.
    pub async fn set_user(&self, session: &mut Session, user_id: UserId) -> Cookie<'static> {
        if !session.fresh {
            if let Err(e) = self.store.delete(&session.id).await {
                log::warn!("Failed to drop pre-login session: {}", e);
            }
        }
        session.id = Uuid::new_v4().to_string();
        session.set_user_id(user_id);
        if let Err(e) = self.save(session).await {
            log::error!("Failed to save session for user {}: {}", user_id, e);
        }
        self.cookie(session.id.clone())
    }

    /// Forgets the logged-in user. The returned cookie always clears
    /// `session_id` on the client, whether or not the store write succeeded.
    pub async fn clear_user(&self, session: &mut Session) -> Cookie<'static> {
        session.clear_user_id();
        if !session.fresh {
            if let Err(e) = self.save(session).await {
                log::error!("Failed to save cleared session: {}", e);
            }
        }
        self.removal_cookie()
    }

    /// Re-persists the session with a fresh expiry.
    pub async fn touch(&self, session: &mut Session) -> Cookie<'static> {
        if let Err(e) = self.save(session).await {
            log::error!("Failed to refresh session: {}", e);
        }
        self.cookie(session.id.clone())
    }

    async fn save(&self, session: &mut Session) -> Result<(), SessionError> {
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        self.store.set(&session.id, &session.data, expires_at).await?;
        session.fresh = false;
        Ok(())
    }

    fn cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, value)
            .path("/")
            .secure(self.cookie_secure)
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(time::Duration::hours(SESSION_TTL_HOURS))
            .finish()
    }

    fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.cookie(String::new());
        cookie.make_removal();
        cookie
    }
}
