//! Token lifecycle route handlers
//!
//! - Token refresh
//! - Logout of the current session or of every session
//! - Caller identity and session listing
//! - Administrative revocation of a principal's tokens

pub mod admin;
pub mod logout;
pub mod me;
pub mod refresh;
pub mod sessions;

pub use admin::revoke_principal;
pub use logout::{logout, logout_all};
pub use me::me;
pub use refresh::refresh;
pub use sessions::{list_principal_sessions, list_sessions};
