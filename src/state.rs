use actix_web::{HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::db::Database;
use crate::error::AppError;
use crate::models::UserId;
use crate::session::{SessionService, SessionStore};
use crate::views::{RenderMode, View, ViewComposer};

/// Everything a request needs, built once in `main` and shared through
/// `web::Data`.
pub struct AppState {
    pub db: Database,
    pub sessions: SessionService,
    pub views: ViewComposer,
}

impl AppState {
    pub fn new(
        db: Database,
        session_store: Arc<dyn SessionStore>,
        views: ViewComposer,
        cookie_secure: bool,
    ) -> Self {
        Self {
            db,
            sessions: SessionService::new(session_store, cookie_secure),
            views,
        }
    }

    /// Bare fragment for `view`.
    pub async fn partial(
        &self,
        view: View,
        user: Option<UserId>,
    ) -> Result<HttpResponse, AppError> {
        self.views
            .respond(&self.db, view, user, RenderMode::Partial)
            .await
    }

    /// See [`ViewComposer::redirect`].
    pub async fn redirect(
        &self,
        req: &HttpRequest,
        view: View,
        target: &str,
        user: Option<UserId>,
    ) -> Result<HttpResponse, AppError> {
        self.views
            .redirect(&self.db, req, view, target, user)
            .await
    }
}
