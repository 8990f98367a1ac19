//! Tests for the permission cache, driven by paused tokio time

use std::future::{ready, Ready};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::advance;
use uuid::Uuid;

use wd_shared::config::PermissionCacheConfig;

use crate::domain::entities::principal::{PermissionSet, RoleRef};
use crate::errors::{DomainError, DomainResult};
use crate::services::permission_cache::PermissionCache;

fn cache(ttl: i64, max_entries: usize, stale_window: i64) -> PermissionCache {
    PermissionCache::new(
        &PermissionCacheConfig::default()
            .with_ttl(ttl)
            .with_max_entries(max_entries)
            .with_stale_window(stale_window),
    )
}

fn set(permission: &str) -> PermissionSet {
    PermissionSet::new(Vec::new(), vec![permission.to_string()])
}

fn ok(permissions: PermissionSet) -> impl FnOnce() -> Ready<DomainResult<PermissionSet>> {
    move || ready(Ok(permissions))
}

fn failing() -> impl FnOnce() -> Ready<DomainResult<PermissionSet>> {
    || {
        ready(Err(DomainError::Upstream {
            message: "permission source down".to_string(),
        }))
    }
}

#[tokio::test(start_paused = true)]
async fn test_hit_within_ttl_skips_resolver() {
    let cache = cache(300, 10, 900);
    let principal = Uuid::new_v4();
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let got = cache
            .get(principal, || {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(Ok(set("users:read")))
            })
            .await
            .unwrap();
        assert!(got.has_permission("users:read"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.entries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_is_resolved_again() {
    let cache = cache(300, 10, 900);
    let principal = Uuid::new_v4();

    cache.get(principal, ok(set("old"))).await.unwrap();
    advance(Duration::from_secs(301)).await;

    let got = cache.get(principal, ok(set("new"))).await.unwrap();
    assert!(got.has_permission("new"));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_eviction_at_capacity_drops_oldest_by_creation() {
    let cache = cache(300, 3, 900);
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

    for id in &ids[..3] {
        cache.get(*id, ok(set("p"))).await.unwrap();
        advance(Duration::from_secs(1)).await;
    }

    // reading the oldest entry does not protect it; eviction is not LRU
    cache.get(ids[0], failing()).await.unwrap();

    cache.get(ids[3], ok(set("p"))).await.unwrap();
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.stats().evictions, 1);

    // ids[0] is gone, so a failing resolver now propagates
    assert!(cache.get(ids[0], failing()).await.is_err());
    for id in &ids[1..] {
        assert!(cache.get(*id, failing()).await.is_ok());
    }
}

#[tokio::test(start_paused = true)]
async fn test_reinserting_existing_key_does_not_evict() {
    let cache = cache(1, 2, 900);
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    cache.get(a, ok(set("p"))).await.unwrap();
    cache.get(b, ok(set("p"))).await.unwrap();
    advance(Duration::from_secs(2)).await;
    cache.get(a, ok(set("q"))).await.unwrap();

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_entry_served_when_resolver_fails() {
    let cache = cache(300, 10, 900);
    let principal = Uuid::new_v4();

    cache.get(principal, ok(set("users:read"))).await.unwrap();
    advance(Duration::from_secs(600)).await;

    let got = cache.get(principal, failing()).await.unwrap();
    assert!(got.has_permission("users:read"));
    assert_eq!(cache.stats().stale_hits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_outside_stale_window_propagates() {
    let cache = cache(300, 10, 900);
    let principal = Uuid::new_v4();

    cache.get(principal, ok(set("users:read"))).await.unwrap();
    advance(Duration::from_secs(901)).await;

    let err = cache.get(principal, failing()).await.unwrap_err();
    assert!(matches!(err, DomainError::Upstream { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_failure_without_entry_propagates() {
    let cache = cache(300, 10, 900);
    assert!(cache.get(Uuid::new_v4(), failing()).await.is_err());
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_by_principal_and_role() {
    let cache = cache(300, 10, 900);
    let editor = RoleRef {
        id: Uuid::new_v4(),
        name: "editor".to_string(),
    };
    let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let with_role = PermissionSet::new(vec![editor.clone()], vec!["posts:write".to_string()]);
    cache.get(alice, ok(with_role.clone())).await.unwrap();
    cache.get(bob, ok(with_role)).await.unwrap();
    cache.get(carol, ok(set("posts:read"))).await.unwrap();

    assert_eq!(cache.invalidate_by_role(editor.id), 2);
    assert_eq!(cache.len(), 1);

    assert!(cache.invalidate(carol));
    assert!(!cache.invalidate(carol));
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_all() {
    let cache = cache(300, 10, 900);
    for _ in 0..4 {
        cache.get(Uuid::new_v4(), ok(set("p"))).await.unwrap();
    }
    assert_eq!(cache.invalidate_all(), 4);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalidation_during_resolve_is_not_overwritten() {
    let cache = cache(300, 10, 900);
    let principal = Uuid::new_v4();

    let got = cache
        .get(principal, || {
            cache.invalidate(principal);
            ready(Ok(set("before-change")))
        })
        .await
        .unwrap();

    assert!(got.has_permission("before-change"));
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_keeps_entries_inside_stale_window() {
    let cache = cache(300, 10, 900);
    let (old, recent) = (Uuid::new_v4(), Uuid::new_v4());

    cache.get(old, ok(set("p"))).await.unwrap();
    advance(Duration::from_secs(600)).await;
    cache.get(recent, ok(set("p"))).await.unwrap();

    assert_eq!(cache.cleanup(), 0);

    advance(Duration::from_secs(301)).await;
    assert_eq!(cache.cleanup(), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_capacity_never_stores() {
    let cache = cache(300, 0, 900);
    let got = cache.get(Uuid::new_v4(), ok(set("p"))).await.unwrap();
    assert!(got.has_permission("p"));
    assert!(cache.is_empty());
}
