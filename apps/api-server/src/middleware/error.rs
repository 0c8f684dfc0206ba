//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{
    HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode,
};
use quill_core::DomainError;
use quill_core::ports::{AuthError, MediaError};
use quill_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Unprocessable(String),
    PayloadTooLarge(String),
    Unavailable(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Unprocessable(msg) => write!(f, "Unprocessable: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized(detail) => ErrorResponse::unauthorized().with_detail(detail),
            AppError::Forbidden(detail) => ErrorResponse::forbidden(detail),
            AppError::Unprocessable(detail) => ErrorResponse::unprocessable(detail),
            AppError::PayloadTooLarge(detail) => {
                ErrorResponse::new(413, "Payload Too Large").with_detail(detail)
            }
            AppError::Unavailable(detail) => {
                tracing::error!("Backing store unavailable: {}", detail);
                ErrorResponse::service_unavailable()
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::Invalid(msg) => AppError::Unprocessable(msg),
            DomainError::Unauthenticated => {
                AppError::Unauthorized("Authentication required".to_string())
            }
            DomainError::StoreUnavailable(msg) => AppError::Unavailable(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => AppError::Unauthorized(
                "Your authentication token has expired. Please login again.".to_string(),
            ),
            AuthError::InvalidToken(msg) => AppError::Unauthorized(msg),
            AuthError::MissingAuth => AppError::Unauthorized(
                "Please provide a valid Bearer token in the Authorization header.".to_string(),
            ),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedType(_) | MediaError::Empty => {
                AppError::Unprocessable(err.to_string())
            }
            MediaError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            MediaError::Storage(msg) => AppError::Internal(msg),
        }
    }
}

/// Body rejection for `web::Json` extractors.
///
/// A well-formed body naming unknown or mistyped fields is unprocessable;
/// anything else (bad content type, broken JSON, oversize) is a bad request.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let app_err = match &err {
        JsonPayloadError::Deserialize(e) if e.is_data() => {
            AppError::Unprocessable(e.to_string())
        }
        other => AppError::BadRequest(other.to_string()),
    };
    tracing::debug!(error = %err, "Rejected request body");
    app_err.into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
