//! Token service module
//!
//! This module handles all token-lifecycle operations including:
//! - Issuing access/refresh pairs bound to a login session
//! - Rotating pairs on refresh and rejecting reuse of rotated tokens
//! - Revoking single tokens, sessions, or everything a principal holds
//! - Validating access tokens against signature, blacklist and storage
//! - Single-purpose reset-password and email-verification tokens
//! - Background cleanup of expired state

mod cleanup;
mod config;
mod service;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupConfig, CleanupResult, CleanupScheduler};
pub use config::TokenServiceConfig;
pub use service::{RevocationSummary, TokenService};
