//! Database module - MySQL implementations using SQLx
//!
//! This module provides database access layer implementations including:
//! - Connection pool management
//! - Repository implementations for tokens, sessions, principals and permissions
//! - Transaction support for atomic session revocation

pub mod connection;
pub mod mysql;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::{
    MySqlPermissionRepository, MySqlPrincipalRepository, MySqlSessionRepository,
    MySqlTokenRepository,
};
