mod common;

use actix_web::cookie::{time, SameSite};
use actix_web::http::StatusCode;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use todoforge::models::UserLookup;
use todoforge::session::{MemorySessionStore, SessionData, SessionError, SessionStore};
use todoforge::views::HX_REDIRECT;

use common::*;

#[test_log::test(actix_rt::test)]
async fn test_register_and_login_flow() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let resp = register(&app, "alice", "a@x.com", "pw").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/login");
    assert!(state
        .db
        .user_exists(UserLookup::Email("a@x.com"))
        .await
        .unwrap());

    let resp = login(&app, "a@x.com", "pw").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/");

    let cookie = session_cookie(&resp).expect("session cookie");
    assert!(!cookie.value().is_empty());
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));

    // the cookie now opens the protected page
    let resp = get(&app, "/todo", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("alice's lists"));
}

#[actix_rt::test]
async fn test_password_is_stored_hashed() {
    let state = test_state().await;
    let app = test_app(&state).await;

    register(&app, "alice", "a@x.com", "pw").await;
    let user = state
        .db
        .find_user(UserLookup::Email("a@x.com"))
        .await
        .unwrap()
        .unwrap();
    assert_ne!(user.password_hash, "pw");
    assert!(user.password_hash.starts_with("$2"));
}

#[actix_rt::test]
async fn test_register_duplicate_email() {
    let state = test_state().await;
    let app = test_app(&state).await;

    register(&app, "alice", "a@x.com", "pw").await;
    let resp = register(&app, "alice2", "a@x.com", "other").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(HX_REDIRECT).is_none());
    assert_eq!(body_text(resp).await, "Email already used");

    // no second account under the new username
    assert!(!state
        .db
        .user_exists(UserLookup::Username("alice2"))
        .await
        .unwrap());
}

#[actix_rt::test]
async fn test_register_duplicate_username() {
    let state = test_state().await;
    let app = test_app(&state).await;

    register(&app, "alice", "a@x.com", "pw").await;
    let resp = register(&app, "alice", "b@x.com", "pw").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "Username already used");
    assert!(!state
        .db
        .user_exists(UserLookup::Email("b@x.com"))
        .await
        .unwrap());
}

#[actix_rt::test]
async fn test_register_rejects_invalid_input() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let resp = register(&app, "alice", "not-an-email", "pw").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = register(&app, "", "a@x.com", "pw").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = register(&app, "alice", "a@x.com", "").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(!state
        .db
        .user_exists(UserLookup::Email("a@x.com"))
        .await
        .unwrap());
}

#[actix_rt::test]
async fn test_login_wrong_email_and_wrong_password() {
    let state = test_state().await;
    let app = test_app(&state).await;
    register(&app, "alice", "a@x.com", "pw").await;

    let resp = login(&app, "nobody@x.com", "pw").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_cookie(&resp).is_none());
    assert_eq!(body_text(resp).await, "Wrong email");

    let resp = login(&app, "a@x.com", "wrong").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_cookie(&resp).is_none());
    assert_eq!(body_text(resp).await, "Wrong password");
}

#[actix_rt::test]
async fn test_logout_clears_session() {
    let state = test_state().await;
    let app = test_app(&state).await;
    let (_, cookie) = signed_in_user(&app, &state, "alice", "a@x.com").await;

    let resp = hx_get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/");

    let session_cookies: Vec<_> = resp
        .response()
        .cookies()
        .filter(|c| c.name() == "session_id")
        .collect();
    assert_eq!(session_cookies.len(), 1);
    assert_eq!(session_cookies[0].value(), "");
    assert_eq!(session_cookies[0].max_age(), Some(time::Duration::ZERO));

    // replaying the old cookie no longer authenticates
    let resp = hx_get(&app, "/todo", Some(&cookie)).await;
    assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/");
}

#[actix_rt::test]
async fn test_guard_sends_anonymous_visitors_home() {
    let state = test_state().await;
    let app = test_app(&state).await;

    // htmx gets a redirect header and an empty body
    let resp = hx_get(&app, "/todo", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/");
    assert_eq!(body_text(resp).await, "");

    // a plain request gets the home page in place
    let resp = get(&app, "/todo", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(HX_REDIRECT).is_none());
    let body = body_text(resp).await;
    assert!(body.contains("Keep your lists and tasks in one place."));
    assert!(body.contains(&format!("<title>{}</title>", TITLE)));

    let resp = get(&app, "/logout", None).await;
    assert!(resp.headers().get(HX_REDIRECT).is_none());
    assert!(body_text(resp).await.contains("Keep your lists"));
}

#[actix_rt::test]
async fn test_guard_keeps_logged_in_users_off_login_pages() {
    let state = test_state().await;
    let app = test_app(&state).await;
    let (_, cookie) = signed_in_user(&app, &state, "alice", "a@x.com").await;

    for uri in ["/login", "/register"] {
        let resp = hx_get(&app, uri, Some(&cookie)).await;
        assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/");

        let resp = get(&app, uri, Some(&cookie)).await;
        let body = body_text(resp).await;
        assert!(body.contains("Welcome back, alice."));
    }

    // a second login attempt is refused before the handler runs
    let resp = post_form(
        &app,
        "/login",
        Some(&cookie),
        &[("email", "a@x.com"), ("password", "pw")],
    )
    .await;
    assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/");
    assert!(session_cookie(&resp).is_none());
}

#[actix_rt::test]
async fn test_anonymous_pages_render() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let body = body_text(get(&app, "/login", None).await).await;
    assert!(body.contains("<h1>Log in</h1>"));

    let body = body_text(get(&app, "/register", None).await).await;
    assert!(body.contains("<h1>Register</h1>"));

    let body = body_text(get(&app, "/", None).await).await;
    assert!(body.contains("Keep your lists and tasks in one place."));

    let resp = hx_get(&app, "/", None).await;
    assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/");
}

#[actix_rt::test]
async fn test_guard_refreshes_session_cookie() {
    let state = test_state().await;
    let app = test_app(&state).await;
    let (_, cookie) = signed_in_user(&app, &state, "alice", "a@x.com").await;

    let resp = get(&app, "/todo", Some(&cookie)).await;
    let refreshed = session_cookie(&resp).expect("refreshed cookie");
    assert_eq!(refreshed.value(), cookie.value());
    assert_eq!(refreshed.max_age(), Some(time::Duration::hours(24)));
}

#[actix_rt::test]
async fn test_plain_form_login_renders_home_with_cookie() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let resp = plain_post_form(
        &app,
        "/register",
        None,
        &[("username", "alice"), ("email", "a@x.com"), ("password", "pw")],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(HX_REDIRECT).is_none());
    assert!(body_text(resp).await.contains("<h1>Log in</h1>"));

    let resp = plain_post_form(&app, "/login", None, &[("email", "a@x.com"), ("password", "pw")]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(HX_REDIRECT).is_none());
    let cookie = session_cookie(&resp).expect("session cookie");
    assert!(!cookie.value().is_empty());
    assert_eq!(cookie.http_only(), Some(true));
    assert!(body_text(resp).await.contains("Welcome back, alice."));

    let resp = get(&app, "/todo", Some(&cookie)).await;
    assert!(body_text(resp).await.contains("alice's lists"));
}

#[actix_rt::test]
async fn test_plain_logout_renders_home_and_clears_cookie() {
    let state = test_state().await;
    let app = test_app(&state).await;
    let (_, cookie) = signed_in_user(&app, &state, "alice", "a@x.com").await;

    let resp = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(HX_REDIRECT).is_none());
    let removal = session_cookie(&resp).expect("removal cookie");
    assert_eq!(removal.value(), "");
    assert_eq!(removal.max_age(), Some(time::Duration::ZERO));

    let body = body_text(resp).await;
    assert!(body.contains("Keep your lists and tasks in one place."));
    assert!(!body.contains("Welcome back"));
}

#[actix_rt::test]
async fn test_register_rejects_password_over_72_bytes() {
    let state = test_state().await;
    let app = test_app(&state).await;

    let resp = register(&app, "alice", "a@x.com", &"x".repeat(73)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "Password must be at most 72 bytes");
    assert!(!state
        .db
        .user_exists(UserLookup::Email("a@x.com"))
        .await
        .unwrap());
}

#[actix_rt::test]
async fn test_login_rejects_password_sharing_72_byte_prefix() {
    let state = test_state().await;
    let app = test_app(&state).await;
    let password = "x".repeat(72);
    register(&app, "alice", "a@x.com", &password).await;

    let longer = format!("{}B", password);
    let resp = login(&app, "a@x.com", &longer).await;
    assert!(session_cookie(&resp).is_none());
    assert_eq!(body_text(resp).await, "Wrong password");

    let resp = login(&app, "a@x.com", &password).await;
    assert!(session_cookie(&resp).is_some());
}

/// Memory store that counts reads.
#[derive(Default)]
struct CountingStore {
    inner: MemorySessionStore,
    reads: AtomicUsize,
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn get(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn set(
        &self,
        id: &str,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.inner.set(id, data, expires_at).await
    }

    async fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.inner.delete(id).await
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        self.inner.purge_expired().await
    }
}

#[actix_rt::test]
async fn test_logout_reads_the_session_once() {
    let store = Arc::new(CountingStore::default());
    let state = test_state_with(store.clone()).await;
    let app = test_app(&state).await;
    let (_, cookie) = signed_in_user(&app, &state, "alice", "a@x.com").await;

    store.reads.store(0, Ordering::SeqCst);
    let resp = hx_get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(resp.headers().get(HX_REDIRECT).unwrap(), "/");
    assert_eq!(store.reads.load(Ordering::SeqCst), 1);
}
