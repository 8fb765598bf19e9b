use actix_web::{get, web, HttpRequest, HttpResponse};

use crate::auth::{AccessGuard, AuthenticatedUser};
use crate::error::AppError;
use crate::state::AppState;
use crate::views::View;

/// Home page, open to everyone.
#[get("/")]
pub async fn index(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let session = state.sessions.current(&req).await;
    let user = state.sessions.get_user(&session);
    state.redirect(&req, View::Index, "/", user).await
}

/// The lists and tasks of the logged-in user.
#[get("/todo", wrap = "AccessGuard")]
pub async fn todo(
    state: web::Data<AppState>,
    req: HttpRequest,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.redirect(&req, View::Todo, "/todo", Some(user.0)).await
}
