//! Domain entities representing core business objects.

pub mod principal;
pub mod revocation;
pub mod session;
pub mod token;

// Re-export commonly used types
pub use principal::{PermissionSet, Principal, RoleRef};
pub use revocation::{RevocationReason, RevocationRecord};
pub use session::{DeviceInfo, LoginSession};
pub use token::{AuthToken, ClaimKind, Claims, TokenKind};
