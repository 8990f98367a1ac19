//! Domain-specific error types and error handling.

mod types;


pub use types::{AuthError, TokenError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Upstream unavailable: {message}")]
    Upstream { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Convert a storage failure into a token-state failure.
    ///
    /// Used on the validation path so an unreachable store surfaces as
    /// "cannot decide" rather than as a rejected credential.
    pub fn into_token_state(self) -> DomainError {
        match self {
            DomainError::Upstream { message } | DomainError::Internal { message } => {
                DomainError::Token(TokenError::UpstreamUnavailable { message })
            }
            other => other,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
