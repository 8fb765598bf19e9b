use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::extractors::AuthenticatedUser;
use crate::error::AppError;
use crate::models::UserId;
use crate::session::{Session, SESSION_COOKIE};
use crate::state::AppState;
use crate::views::View;

/// Pages only an anonymous visitor may open.
pub const ANONYMOUS_ONLY: [&str; 2] = ["/login", "/register"];

/// Login state of the current request, derived from its session alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Authenticated(UserId),
    Anonymous,
}

impl LoginState {
    pub fn from_user(user: Option<UserId>) -> Self {
        match user {
            Some(user_id) => LoginState::Authenticated(user_id),
            None => LoginState::Anonymous,
        }
    }

    pub fn user_id(self) -> Option<UserId> {
        match self {
            LoginState::Authenticated(user_id) => Some(user_id),
            LoginState::Anonymous => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    RedirectHome,
}

/// Logged-in visitors are kept off the login and registration pages;
/// anonymous visitors are kept off every other guarded page.
pub fn decide(path: &str, state: LoginState) -> GuardDecision {
    let anonymous_only = ANONYMOUS_ONLY.contains(&path);
    match (anonymous_only, state) {
        (true, LoginState::Authenticated(_)) | (false, LoginState::Anonymous) => {
            GuardDecision::RedirectHome
        }
        _ => GuardDecision::Proceed,
    }
}

/// Route guard based on the session's login state.
///
/// Redirects home when [`decide`] says so. Otherwise, for a logged-in
/// visitor, refreshes the session and stores an [`AuthenticatedUser`] in the
/// request extensions before calling the handler. The loaded [`Session`]
/// is placed in the extensions as well.
pub struct AccessGuard;

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AccessGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessGuardService {
            service: Rc::new(service),
        }))
    }
}

pub struct AccessGuardService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AccessGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let state = match req.app_data::<web::Data<AppState>>() {
                Some(state) => state.clone(),
                None => {
                    let err = AppError::InternalServerError("AppState is not registered".into());
                    return Err(err.into());
                }
            };

            let mut session = state.sessions.load(req.request()).await;
            let login = LoginState::from_user(state.sessions.get_user(&session));

            if decide(req.path(), login) == GuardDecision::RedirectHome {
                log::debug!("Access guard: {:?} sent home from {}", login, req.path());
                let response = state
                    .redirect(req.request(), View::Index, "/", login.user_id())
                    .await?;
                return Ok(req.into_response(response).map_into_right_body());
            }

            let cookie = match login {
                LoginState::Authenticated(user_id) => {
                    req.extensions_mut().insert(AuthenticatedUser(user_id));
                    Some(state.sessions.touch(&mut session).await)
                }
                LoginState::Anonymous => None,
            };
            // handlers reuse it instead of reading the store again
            req.extensions_mut().insert(session);

            let mut res = service.call(req).await?;
            if let Some(cookie) = cookie {
                // a handler that issued or cleared the session cookie wins
                let handler_set_cookie = res
                    .response()
                    .cookies()
                    .any(|c| c.name() == SESSION_COOKIE);
                if !handler_set_cookie {
                    res.response_mut().add_cookie(&cookie)?;
                }
            }
            Ok(res.map_into_left_body())
        })
    }
}
