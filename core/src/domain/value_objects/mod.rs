//! Value objects representing immutable domain concepts.

pub mod access_context;
pub mod issued_tokens;

// Re-export commonly used types
pub use access_context::AccessContext;
pub use issued_tokens::IssuedTokens;
