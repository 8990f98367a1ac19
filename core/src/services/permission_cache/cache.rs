//! Permission cache implementation

use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use wd_shared::config::PermissionCacheConfig;

use crate::domain::entities::principal::PermissionSet;
use crate::errors::DomainResult;

struct CacheEntry {
    permissions: PermissionSet,
    created_at: Instant,
    expires_at: Instant,
    /// Insertion order, breaks ties between equal creation instants
    seq: u64,
}

/// Counters reported by [`PermissionCache::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale_hits: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Principal id to [`PermissionSet`] cache
///
/// Every mutation takes a synchronous lock; the resolver passed to
/// [`PermissionCache::get`] runs with no lock held.
pub struct PermissionCache {
    entries: Mutex<HashMap<Uuid, CacheEntry>>,
    ttl: Duration,
    stale_window: Duration,
    max_entries: usize,
    next_seq: AtomicU64,
    /// Bumped by every invalidation; a resolve that straddles one is not stored
    epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    stale_hits: AtomicU64,
    evictions: AtomicU64,
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new(&PermissionCacheConfig::default())
    }
}

fn seconds(value: i64) -> Duration {
    Duration::from_secs(value.max(0) as u64)
}

impl PermissionCache {
    pub fn new(config: &PermissionCacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: seconds(config.ttl),
            stale_window: seconds(config.stale_window),
            max_entries: config.max_entries,
            next_seq: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale_hits: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached permissions of `principal_id`, resolving on a miss
    ///
    /// # Arguments
    /// * `principal_id` - Principal to look up
    /// * `resolver` - Loads fresh permissions; called only on a miss
    ///
    /// # Returns
    /// * `Ok(PermissionSet)` - Fresh, newly resolved, or stale-but-permitted value
    /// * `Err(DomainError)` - The resolver failed and no entry inside the
    ///   stale window exists
    pub async fn get<F, Fut>(&self, principal_id: Uuid, resolver: F) -> DomainResult<PermissionSet>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<PermissionSet>>,
    {
        if let Some(permissions) = self.lookup(principal_id, Instant::now(), false) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(permissions);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let epoch = self.epoch.load(Ordering::Acquire);
        match resolver().await {
            Ok(permissions) => {
                if self.epoch.load(Ordering::Acquire) == epoch {
                    self.insert(principal_id, permissions.clone());
                } else {
                    debug!(%principal_id, "permissions invalidated during resolve, not caching");
                }
                Ok(permissions)
            }
            Err(err) => match self.lookup(principal_id, Instant::now(), true) {
                Some(permissions) => {
                    self.stale_hits.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        %principal_id,
                        error = %err,
                        "permission source failed, serving stale entry"
                    );
                    Ok(permissions)
                }
                None => Err(err),
            },
        }
    }

    fn lookup(&self, principal_id: Uuid, now: Instant, allow_stale: bool) -> Option<PermissionSet> {
        let entries = self.lock();
        let entry = entries.get(&principal_id)?;
        let usable = if allow_stale {
            now < entry.created_at + self.stale_window
        } else {
            now < entry.expires_at
        };
        usable.then(|| entry.permissions.clone())
    }

    /// Store `permissions` with a fresh TTL, evicting the oldest entry at capacity
    pub fn insert(&self, principal_id: Uuid, permissions: PermissionSet) {
        if self.max_entries == 0 {
            return;
        }
        let now = Instant::now();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.lock();

        if !entries.contains_key(&principal_id) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| (e.created_at, e.seq))
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(principal_id = %oldest, "permission cache entry evicted");
            }
        }

        entries.insert(
            principal_id,
            CacheEntry {
                permissions,
                created_at: now,
                expires_at: now + self.ttl,
                seq,
            },
        );
    }

    /// Drop the entry of one principal
    pub fn invalidate(&self, principal_id: Uuid) -> bool {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.lock().remove(&principal_id).is_some()
    }

    /// Drop every entry whose role list contains `role_id`
    pub fn invalidate_by_role(&self, role_id: Uuid) -> usize {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.permissions.has_role_id(role_id));
        before - entries.len()
    }

    pub fn invalidate_all(&self) -> usize {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Remove entries that can no longer be served, fresh or stale.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let stale_window = self.stale_window;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at || now < e.created_at + stale_window);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
