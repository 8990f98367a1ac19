//! Permission cache configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Sizing and expiry of the in-process permission cache
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermissionCacheConfig {
    /// Time-to-live of a resolved entry in seconds
    pub ttl: i64,

    /// Maximum number of principals held at once
    pub max_entries: usize,

    /// How long past creation an entry may still be served when the
    /// permission source is failing, in seconds
    pub stale_window: i64,

    /// Interval in seconds between cleanup passes
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for PermissionCacheConfig {
    fn default() -> Self {
        Self {
            ttl: 300,           // 5 minutes
            max_entries: 10_000,
            stale_window: 900, // 15 minutes
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

impl PermissionCacheConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: env_or("PERMISSION_CACHE_TTL", defaults.ttl),
            max_entries: env_or("PERMISSION_CACHE_MAX_ENTRIES", defaults.max_entries),
            stale_window: env_or("PERMISSION_CACHE_STALE_WINDOW", defaults.stale_window),
            cleanup_interval: env_or(
                "PERMISSION_CACHE_CLEANUP_INTERVAL",
                defaults.cleanup_interval,
            ),
        }
    }

    /// Set the entry TTL in seconds
    pub fn with_ttl(mut self, seconds: i64) -> Self {
        self.ttl = seconds;
        self
    }

    /// Set the capacity
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the stale window in seconds
    pub fn with_stale_window(mut self, seconds: i64) -> Self {
        self.stale_window = seconds;
        self
    }
}

fn default_cleanup_interval() -> u64 {
    600
}
