#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use std::sync::Arc;

use todoforge::db::Database;
use todoforge::models::{User, UserLookup};
use todoforge::routes;
use todoforge::session::{MemorySessionStore, SessionStore, SESSION_COOKIE};
use todoforge::state::AppState;
use todoforge::views::{ViewComposer, HX_REQUEST};

pub const TITLE: &str = "Test To-Do";

/// Fresh state over an in-memory database and session store.
pub async fn test_state() -> web::Data<AppState> {
    test_state_with(Arc::new(MemorySessionStore::new())).await
}

pub async fn test_state_with(store: Arc<dyn SessionStore>) -> web::Data<AppState> {
    let db = Database::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let views = ViewComposer::new(TITLE).expect("Templates failed to parse");
    web::Data::new(AppState::new(db, store, views, true))
}

pub async fn test_app(
    state: &web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(routes::config),
    )
    .await
}

pub async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let body = test::read_body(resp).await;
    String::from_utf8(body.to_vec()).expect("Body is not UTF-8")
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
}

pub async fn get<S, B>(app: &S, uri: &str, cookie: Option<&Cookie<'static>>) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
{
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    test::call_service(app, req.to_request()).await
}

/// Same as [`get`] but flagged as an htmx request.
pub async fn hx_get<S, B>(app: &S, uri: &str, cookie: Option<&Cookie<'static>>) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
{
    let mut req = test::TestRequest::get()
        .uri(uri)
        .insert_header((HX_REQUEST, "true"));
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    test::call_service(app, req.to_request()).await
}

fn form_request(
    uri: &str,
    cookie: Option<&Cookie<'static>>,
    form: &[(&str, &str)],
    htmx: bool,
) -> Request {
    let mut req = test::TestRequest::post().uri(uri).set_form(form);
    if htmx {
        req = req.insert_header((HX_REQUEST, "true"));
    }
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    req.to_request()
}

/// Form post flagged as an htmx request, as the page's forms send it.
pub async fn post_form<S, B>(
    app: &S,
    uri: &str,
    cookie: Option<&Cookie<'static>>,
    form: &[(&str, &str)],
) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
{
    test::call_service(app, form_request(uri, cookie, form, true)).await
}

/// Form post from a browser without htmx.
pub async fn plain_post_form<S, B>(
    app: &S,
    uri: &str,
    cookie: Option<&Cookie<'static>>,
    form: &[(&str, &str)],
) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
{
    test::call_service(app, form_request(uri, cookie, form, false)).await
}

pub async fn register<S, B>(app: &S, username: &str, email: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
{
    post_form(
        app,
        "/register",
        None,
        &[("username", username), ("email", email), ("password", password)],
    )
    .await
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
{
    post_form(app, "/login", None, &[("email", email), ("password", password)]).await
}

/// Registers and logs in a user, returning the account and its session cookie.
pub async fn signed_in_user<S, B>(
    app: &S,
    state: &web::Data<AppState>,
    username: &str,
    email: &str,
) -> (User, Cookie<'static>)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
{
    let resp = register(app, username, email, "pw").await;
    assert!(resp.status().is_success(), "register failed: {}", resp.status());

    let resp = login(app, email, "pw").await;
    let cookie = session_cookie(&resp).expect("Login did not set a session cookie");

    let user = state
        .db
        .find_user(UserLookup::Email(email))
        .await
        .expect("Failed to look up user")
        .expect("Registered user not found");
    (user, cookie)
}
