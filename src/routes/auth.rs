use actix_web::{get, post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::auth::{hash_password, validate_password, AccessGuard, AuthenticatedUser};
use crate::error::{is_unique_violation, AppError};
use crate::models::{LoginForm, RegisterForm, UserLookup};
use crate::routes::{plain_text, with_cookie};
use crate::state::AppState;
use crate::views::View;

const EMAIL_TAKEN: &str = "Email already used";
const USERNAME_TAKEN: &str = "Username already used";

#[get("/login", wrap = "AccessGuard")]
pub async fn login_page(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    state.redirect(&req, View::Login, "/login", None).await
}

/// Login user
///
/// Checks the credentials, binds the session to the user and sends the
/// visitor home. Unknown emails and wrong passwords are answered in plain
/// text with a `200`.
#[post("/login", wrap = "AccessGuard")]
pub async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let Some(user) = state.db.find_user(UserLookup::Email(&form.email)).await? else {
        return Ok(plain_text("Wrong email"));
    };

    let hashed = user.password_hash.clone();
    let password = form.password;
    if !web::block(move || validate_password(&hashed, &password)).await? {
        log::info!("Failed login for user {}", user.id);
        return Ok(plain_text("Wrong password"));
    }

    let mut session = state.sessions.current(&req).await;
    let cookie = state.sessions.set_user(&mut session, user.id).await;
    log::info!("User {} logged in", user.id);

    let response = state.redirect(&req, View::Index, "/", Some(user.id)).await?;
    with_cookie(response, cookie)
}

#[get("/register", wrap = "AccessGuard")]
pub async fn register_page(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    state.redirect(&req, View::Register, "/register", None).await
}

/// Register a new user
///
/// Creates the account and sends the visitor to the login page. A taken
/// email or username is answered in plain text with a `200`.
#[post("/register", wrap = "AccessGuard")]
pub async fn register(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    form.validate()?;

    if state.db.user_exists(UserLookup::Email(&form.email)).await? {
        return Ok(plain_text(EMAIL_TAKEN));
    }

    let password = form.password;
    let password_hash = web::block(move || hash_password(&password)).await?;

    match state
        .db
        .create_user(&form.username, &form.email, &password_hash)
        .await
    {
        Ok(user) => log::info!("Registered user {} ({})", user.id, user.username),
        Err(e) if is_unique_violation(&e) => {
            // the email may have been taken since the check above
            let message = if state.db.user_exists(UserLookup::Email(&form.email)).await? {
                EMAIL_TAKEN
            } else {
                USERNAME_TAKEN
            };
            return Ok(plain_text(message));
        }
        Err(e) => return Err(e.into()),
    }

    state.redirect(&req, View::Login, "/login", None).await
}

#[get("/logout", wrap = "AccessGuard")]
pub async fn logout(
    state: web::Data<AppState>,
    req: HttpRequest,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let mut session = state.sessions.current(&req).await;
    let cookie = state.sessions.clear_user(&mut session).await;
    log::info!("User {} logged out", user.0);

    let response = state.redirect(&req, View::Index, "/", None).await?;
    with_cookie(response, cookie)
}
