//! MySQL-specific database implementations
//!
//! This module contains MySQL implementations of repository traits
//! using SQLx for database operations.

pub mod permission_repository_impl;
pub mod principal_repository_impl;
pub mod session_repository_impl;
pub mod token_repository_impl;

// Re-export the MySQL implementations
pub use permission_repository_impl::MySqlPermissionRepository;
pub use principal_repository_impl::MySqlPrincipalRepository;
pub use session_repository_impl::MySqlSessionRepository;
pub use token_repository_impl::MySqlTokenRepository;

use uuid::Uuid;
use wd_core::errors::DomainError;

/// Map a driver error to a domain error, logging it with its context
///
/// Unique-key violations are caller mistakes and become validation errors;
/// everything else means storage is unavailable.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        let unique_violation = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique_violation {
            return DomainError::Validation {
                message: format!("{}: duplicate key", context),
            };
        }
        tracing::error!(context, error = %e, "database operation failed");
        DomainError::Upstream {
            message: format!("{}: {}", context, e),
        }
    }
}

/// Map a column decoding error
pub(crate) fn column_error(column: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| DomainError::Internal {
        message: format!("Failed to get {}: {}", column, e),
    }
}

/// Parse a `CHAR(36)` id column
pub(crate) fn parse_uuid(value: &str, column: &'static str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID in {}: {}", column, e),
    })
}
