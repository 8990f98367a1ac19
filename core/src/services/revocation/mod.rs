//! In-process blacklist of revoked token ids
//!
//! Records expire with the token they mirror. Lookups delete expired records
//! lazily and a periodic sweep removes the rest.

mod store;

pub use store::RevocationStore;
