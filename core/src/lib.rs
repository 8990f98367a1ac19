//! # Warden Core
//!
//! Token and access-control lifecycle for the Warden backend.
//! This crate contains domain entities, the error taxonomy, repository
//! interfaces, and the services that issue, rotate, revoke and validate
//! tokens on top of them.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    AuthToken, ClaimKind, Claims, DeviceInfo, LoginSession, PermissionSet, Principal,
    RevocationReason, RevocationRecord, RoleRef, TokenKind,
};
pub use domain::value_objects::{AccessContext, IssuedTokens};
pub use errors::{AuthError, DomainError, DomainResult, TokenError};
pub use repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};
pub use services::{
    CacheStats, CleanupConfig, CleanupResult, CleanupScheduler, PermissionCache,
    RevocationStore, RevocationSummary, SessionService, TokenCodec, TokenService,
    TokenServiceConfig,
};
