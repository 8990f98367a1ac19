//! Mapping of domain errors to HTTP responses
//!
//! Token rejection reasons are logged and collapsed into one generic
//! message; clients never learn why a token was refused.

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use tracing::{error, warn};

use wd_core::errors::{AuthError, DomainError, TokenError};
use wd_shared::errors::{error_codes, ErrorResponse};

pub(crate) const INVALID_TOKEN_MESSAGE: &str = "invalid or expired token";

fn respond(status: StatusCode, body: ErrorResponse) -> HttpResponse {
    HttpResponse::build(status).json(body)
}

/// Handle domain errors and convert them to appropriate HTTP responses
pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    match error {
        DomainError::Token(token_error) => handle_token_error(token_error),
        DomainError::Auth(auth_error) => match auth_error {
            AuthError::Unauthorized => respond(
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(error_codes::UNAUTHORIZED, "authentication required"),
            ),
            AuthError::Forbidden { required } => {
                warn!(%required, "request forbidden");
                respond(
                    StatusCode::FORBIDDEN,
                    ErrorResponse::new(error_codes::FORBIDDEN, "insufficient permissions")
                        .add_detail("required", required),
                )
            }
            AuthError::PrincipalNotFound => respond(
                StatusCode::NOT_FOUND,
                ErrorResponse::new(error_codes::NOT_FOUND, "principal not found"),
            ),
        },
        DomainError::Validation { message } => respond(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(error_codes::VALIDATION_ERROR, message),
        ),
        DomainError::NotFound { resource } => respond(
            StatusCode::NOT_FOUND,
            ErrorResponse::new(error_codes::NOT_FOUND, format!("{} not found", resource)),
        ),
        DomainError::Upstream { message } => {
            error!(%message, "upstream unavailable");
            service_unavailable()
        }
        DomainError::Internal { message } => {
            error!(%message, "internal error");
            internal_error()
        }
    }
}

fn handle_token_error(token_error: TokenError) -> HttpResponse {
    match token_error {
        TokenError::UpstreamUnavailable { message } => {
            error!(%message, "token state unavailable");
            service_unavailable()
        }
        TokenError::SigningFailed => {
            error!("token signing failed");
            internal_error()
        }
        rejected => {
            warn!(reason = rejected.reason(), "token rejected");
            respond(
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(error_codes::TOKEN_INVALID, INVALID_TOKEN_MESSAGE),
            )
        }
    }
}

fn service_unavailable() -> HttpResponse {
    respond(
        StatusCode::SERVICE_UNAVAILABLE,
        ErrorResponse::new(
            error_codes::SERVICE_UNAVAILABLE,
            "service temporarily unavailable",
        ),
    )
}

fn internal_error() -> HttpResponse {
    respond(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new(error_codes::INTERNAL_ERROR, "an internal error occurred"),
    )
}

/// Wrap a domain error as an actix error carrying the mapped response
///
/// For extractors and middleware, which must fail with `actix_web::Error`.
pub fn into_actix_error(error: DomainError) -> actix_web::Error {
    let message = error.to_string();
    InternalError::from_response(message, handle_domain_error(error)).into()
}

/// Render JSON body errors in the common error format
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse::new(error_codes::BAD_REQUEST, err.to_string());
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}
