//!
//! # Custom Error Handling
//!
//! This module defines the error type `AppError` returned by handlers and the
//! access guard. `AppError` implements `actix_web::error::ResponseError`, so a
//! handler can simply use `?` and the error becomes a plain-text HTTP response.
//!
//! Business-rule rejections ("Email already used", "Wrong password", ...) are
//! not errors and never pass through here; they are ordinary `200` responses.
//! Server-side failures are logged with their detail while the client only
//! sees a generic message.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use validator::ValidationErrors;

/// Represents all errors a request can end in.
#[derive(Debug)]
pub enum AppError {
    /// A guarded handler ran without an authenticated user (HTTP 401).
    Unauthorized(String),
    /// The requester is authenticated but does not own the resource (HTTP 403).
    Forbidden(String),
    /// A malformed request, such as a non-numeric id field (HTTP 400).
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// Form input failed its `validator` rules (HTTP 400).
    ValidationError(String),
    /// An unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// An error from the relational store (HTTP 500).
    DatabaseError(String),
    /// A template failed to render (HTTP 500).
    TemplateError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::TemplateError(msg) => write!(f, "Template Error: {}", msg),
        }
    }
}

impl AppError {
    /// Text sent to the client. Server-side details stay in the log.
    fn public_message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => msg,
            AppError::InternalServerError(_)
            | AppError::DatabaseError(_)
            | AppError::TemplateError(_) => "Internal Server Error",
        }
    }
}

/// Converts `AppError` variants into plain-text `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_)
            | AppError::DatabaseError(_)
            | AppError::TemplateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(self.public_message().to_owned())
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `sqlx::Error::RowNotFound` maps to `AppError::NotFound`; everything else
/// becomes `AppError::DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`,
/// keeping the first human-readable message.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(_, errs)| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());
        AppError::ValidationError(message)
    }
}

impl From<tera::Error> for AppError {
    fn from(error: tera::Error) -> AppError {
        // tera nests the useful part in the source chain
        let mut detail = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(inner) = source {
            detail.push_str(": ");
            detail.push_str(&inner.to_string());
            source = inner.source();
        }
        AppError::TemplateError(detail)
    }
}

/// A `web::block` task was cancelled, e.g. its thread pool shut down.
impl From<actix_web::error::BlockingError> for AppError {
    fn from(error: actix_web::error::BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Raised when a header such as `Set-Cookie` cannot be encoded.
impl From<actix_web::error::HttpError> for AppError {
    fn from(error: actix_web::error::HttpError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// True when `error` is a UNIQUE constraint violation.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.is_unique_violation(),
        _ => false,
    }
}
