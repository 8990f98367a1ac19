//! Error types for token lifecycle and access-control operations
//!
//! Messages here are for logs. The presentation layer decides what a client
//! is allowed to see; token rejection reasons are never exposed.

use thiserror::Error;

use crate::domain::entities::token::TokenKind;

/// Authentication and authorization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Missing required permission: {required}")]
    Forbidden { required: String },

    #[error("Principal not found")]
    PrincipalNotFound,
}

/// Token lifecycle errors
///
/// Each variant is a distinct reason a token was rejected or an operation on
/// it could not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature verification failed")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Wrong token kind: expected {expected}, found {actual}")]
    WrongKind { expected: TokenKind, actual: TokenKind },

    #[error("Token is blacklisted")]
    Blacklisted,

    #[error("Token not found")]
    NotFound,

    #[error("Token already revoked")]
    AlreadyRevoked,

    #[error("Token revoked")]
    Revoked,

    #[error("Principal is inactive")]
    PrincipalInactive,

    #[error("Token signing failed")]
    SigningFailed,

    #[error("Token state unavailable: {message}")]
    UpstreamUnavailable { message: String },
}

impl TokenError {
    /// Short machine-readable reason, used as a structured log field
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::Expired => "expired",
            TokenError::WrongKind { .. } => "wrong_kind",
            TokenError::Blacklisted => "blacklisted",
            TokenError::NotFound => "not_found",
            TokenError::AlreadyRevoked => "already_revoked",
            TokenError::Revoked => "revoked",
            TokenError::PrincipalInactive => "principal_inactive",
            TokenError::SigningFailed => "signing_failed",
            TokenError::UpstreamUnavailable { .. } => "upstream_unavailable",
        }
    }

    /// Whether the error means the presented credential is unusable, as
    /// opposed to the server being unable to decide.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            TokenError::SigningFailed | TokenError::UpstreamUnavailable { .. }
        )
    }
}
