//! Signing and verification of compact JWS tokens
//!
//! Each token kind family is signed with its own HMAC secret:
//! - access tokens
//! - refresh tokens
//! - single-purpose tokens (reset-password, email-verification)

mod codec;

pub use codec::{hash_token, IssuedToken, TokenCodec};
