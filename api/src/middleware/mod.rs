pub mod auth;
pub mod authorization;

pub use auth::{AccessTokenValidator, AuthContext, AuthMode, JwtAuth, OptionalAuth};
pub use authorization::{authorize, authorize_owner_or, Authorize, Requirement};
