//! Short-lived cache of resolved roles and permissions per principal
//!
//! Entries expire after a TTL, the oldest entry by creation time is evicted
//! at capacity, and a failing permission source is bridged by serving
//! entries that are still inside the stale window.

mod cache;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, PermissionCache};
