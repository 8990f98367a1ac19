//! Tests for the session service

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use wd_shared::config::SessionConfig;

use crate::domain::entities::session::{DeviceInfo, LoginSession};
use crate::repositories::{InMemorySessionRepository, InMemoryTokenRepository, SessionRepository};
use crate::services::session::SessionService;

fn service() -> (SessionService<InMemorySessionRepository>, Arc<InMemorySessionRepository>) {
    let repository = Arc::new(InMemorySessionRepository::new(InMemoryTokenRepository::new()));
    let config = SessionConfig {
        inactivity_timeout: 3600,
        ..Default::default()
    };
    (SessionService::new(repository.clone(), config), repository)
}

fn device() -> DeviceInfo {
    DeviceInfo::new(
        Some("laptop".to_string()),
        Some("10.0.0.1".to_string()),
        Some("curl/8".to_string()),
    )
}

#[tokio::test]
async fn test_create_and_find_by_either_token() {
    let (service, _) = service();
    let (session_id, principal, access, refresh) =
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let session = service
        .create(session_id, principal, access, refresh, device())
        .await
        .unwrap();
    assert!(session.is_active);
    assert_eq!(session.device.ip_address.as_deref(), Some("10.0.0.1"));

    let by_access = service.find_by_token_id(access).await.unwrap().unwrap();
    let by_refresh = service.find_by_token_id(refresh).await.unwrap().unwrap();
    assert_eq!(by_access.id, session_id);
    assert_eq!(by_refresh.id, session_id);
    assert!(service.find_by_token_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rotate_keeps_session_id() {
    let (service, _) = service();
    let (session_id, principal) = (Uuid::new_v4(), Uuid::new_v4());
    let before = service
        .create(session_id, principal, Uuid::new_v4(), Uuid::new_v4(), device())
        .await
        .unwrap();

    let (access, refresh) = (Uuid::new_v4(), Uuid::new_v4());
    assert!(service.rotate(session_id, access, refresh).await.unwrap());

    let after = service.find(session_id).await.unwrap().unwrap();
    assert_eq!(after.access_token_id, access);
    assert_eq!(after.refresh_token_id, refresh);
    assert!(after.last_activity_at >= before.last_activity_at);
    assert!(service.find_by_token_id(before.refresh_token_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_active_orders_by_recent_activity() {
    let (service, repository) = service();
    let principal = Uuid::new_v4();
    let now = Utc::now();

    let mut older = session_for(principal);
    older.last_activity_at = now - Duration::minutes(30);
    let mut newer = session_for(principal);
    newer.last_activity_at = now - Duration::minutes(1);
    let mut closed = session_for(principal);
    closed.is_active = false;

    for s in [older.clone(), newer.clone(), closed] {
        repository.save(s).await.unwrap();
    }

    let listed = service.list_active(principal).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn test_reap_idle_uses_inactivity_timeout() {
    let (service, repository) = service();
    let principal = Uuid::new_v4();

    let mut idle = session_for(principal);
    idle.last_activity_at = Utc::now() - Duration::hours(2);
    let fresh = session_for(principal);

    repository.save(idle.clone()).await.unwrap();
    repository.save(fresh.clone()).await.unwrap();

    assert_eq!(service.reap_idle().await.unwrap(), 1);
    assert!(!service.find(idle.id).await.unwrap().unwrap().is_active);
    assert!(service.find(fresh.id).await.unwrap().unwrap().is_active);
    assert_eq!(service.reap_idle().await.unwrap(), 0);
}

#[tokio::test]
async fn test_deactivate_all_counts_only_active() {
    let (service, _) = service();
    let principal = Uuid::new_v4();
    for _ in 0..3 {
        service
            .create(Uuid::new_v4(), principal, Uuid::new_v4(), Uuid::new_v4(), device())
            .await
            .unwrap();
    }

    assert_eq!(service.deactivate_all(principal).await.unwrap(), 3);
    assert_eq!(service.deactivate_all(principal).await.unwrap(), 0);
    assert!(service.list_active(principal).await.unwrap().is_empty());
}

fn session_for(principal: Uuid) -> LoginSession {
    LoginSession::new(Uuid::new_v4(), principal, Uuid::new_v4(), Uuid::new_v4(), device())
}
