pub mod permission;
pub mod principal;
pub mod session;
pub mod token;

pub use permission::PermissionRepository;
pub use principal::PrincipalRepository;
pub use session::SessionRepository;
pub use token::TokenRepository;

#[cfg(any(test, feature = "test-utils"))]
pub use permission::InMemoryPermissionRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use principal::InMemoryPrincipalRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use session::InMemorySessionRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use token::InMemoryTokenRepository;
