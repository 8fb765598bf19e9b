use actix_web::{post, web, HttpResponse};
use validator::Validate;

use crate::auth::{AccessGuard, AuthenticatedUser};
use crate::error::AppError;
use crate::models::TaskForm;
use crate::routes::{parse_list_id, plain_text};
use crate::state::AppState;

/// Add a task to a list
///
/// The list must exist. Ownership is not enforced here; a task added to
/// another user's list is allowed and logged.
#[post("/task_add", wrap = "AccessGuard")]
pub async fn task_add(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let list_id = parse_list_id(&form.list_id)?;
    form.validate()?;

    let list = state
        .db
        .find_list(list_id)
        .await?
        .ok_or_else(|| AppError::NotFound("List not found".into()))?;

    if !list.is_owned_by(user.0) {
        log::warn!(
            "User {} added a task to list {} owned by user {}",
            user.0,
            list.id,
            list.user_id
        );
    }

    let task = state.db.create_task(form.into_new_task(list.id)).await?;
    log::info!("User {} created task {} in list {}", user.0, task.id, list.id);

    Ok(plain_text("Task created"))
}
