//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for Warden, following
//! Clean Architecture principles. It provides MySQL implementations of the
//! repository traits declared in `wd_core`.
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

#[cfg(feature = "mysql")]
pub use database::{
    DatabasePool, MySqlPermissionRepository, MySqlPrincipalRepository, MySqlSessionRepository,
    MySqlTokenRepository, PoolStatistics,
};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
