pub mod auth;
pub mod lists;
pub mod pages;
pub mod tasks;

use actix_web::{cookie::Cookie, web, HttpResponse};

use crate::error::AppError;
use crate::models::ListId;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(pages::index)
        .service(pages::todo)
        .service(auth::login_page)
        .service(auth::login)
        .service(auth::register_page)
        .service(auth::register)
        .service(auth::logout)
        .service(lists::list_add)
        .service(lists::list_delete)
        .service(tasks::task_add);
}

/// `200 text/plain`, used for business-rule rejections and acknowledgements.
pub(crate) fn plain_text(message: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(message)
}

pub(crate) fn with_cookie(
    mut response: HttpResponse,
    cookie: Cookie<'static>,
) -> Result<HttpResponse, AppError> {
    response.add_cookie(&cookie)?;
    Ok(response)
}

/// Parses the `list_id` form field shared by the list and task forms.
pub(crate) fn parse_list_id(raw: &str) -> Result<ListId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid list ID".into()))
}
