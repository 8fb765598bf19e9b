use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::auth::{AccessGuard, AuthenticatedUser};
use crate::error::AppError;
use crate::models::{ListDeleteForm, ListForm};
use crate::routes::parse_list_id;
use crate::state::AppState;
use crate::views::View;

/// Create a list
///
/// Responds with the refreshed list-of-lists fragment.
#[post("/list_add", wrap = "AccessGuard")]
pub async fn list_add(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Form<ListForm>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;

    let list = state.db.create_list(user.0, &form.list_title).await?;
    log::info!("User {} created list {}", user.0, list.id);

    state.partial(View::ListsPartial, Some(user.0)).await
}

/// Delete a list and its tasks
///
/// Only the owner may delete a list. Responds with the refreshed
/// list-of-lists fragment.
#[post("/list_delete", wrap = "AccessGuard")]
pub async fn list_delete(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Form<ListDeleteForm>,
) -> Result<HttpResponse, AppError> {
    let list_id = parse_list_id(&form.list_id)?;

    let list = state
        .db
        .find_list(list_id)
        .await?
        .ok_or_else(|| AppError::NotFound("List not found".into()))?;

    if !list.is_owned_by(user.0) {
        log::warn!(
            "User {} tried to delete list {} owned by user {}",
            user.0,
            list.id,
            list.user_id
        );
        return Err(AppError::Forbidden("Forbidden".into()));
    }

    let tasks_removed = state.db.delete_list(list.id).await?;
    log::info!(
        "User {} deleted list {} with {} task(s)",
        user.0,
        list.id,
        tasks_removed
    );

    state.partial(View::ListsPartial, Some(user.0)).await
}
