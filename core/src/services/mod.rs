//! Business services containing domain logic and use cases.

pub mod codec;
pub mod permission_cache;
pub mod revocation;
pub mod session;
pub mod token;

// Re-export commonly used types
pub use codec::{hash_token, IssuedToken, TokenCodec};
pub use permission_cache::{CacheStats, PermissionCache};
pub use revocation::RevocationStore;
pub use session::SessionService;
pub use token::{
    CleanupConfig, CleanupResult, CleanupScheduler, RevocationSummary, TokenService,
    TokenServiceConfig,
};
