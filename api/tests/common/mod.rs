//! Shared fixture for HTTP tests: a token service over in-memory repositories

#![allow(dead_code)]

use actix_web::web;
use std::sync::Arc;
use uuid::Uuid;

use wd_api::AppState;
use wd_core::domain::entities::principal::{PermissionSet, Principal, RoleRef};
use wd_core::domain::entities::session::DeviceInfo;
use wd_core::domain::value_objects::IssuedTokens;
use wd_core::repositories::{
    InMemoryPermissionRepository, InMemoryPrincipalRepository, InMemorySessionRepository,
    InMemoryTokenRepository,
};
use wd_core::services::{PermissionCache, RevocationStore, TokenService, TokenServiceConfig};
use wd_shared::config::{JwtConfig, PermissionCacheConfig, RevocationConfig, SessionConfig};

pub type TestService = TokenService<
    InMemoryTokenRepository,
    InMemorySessionRepository,
    InMemoryPrincipalRepository,
    InMemoryPermissionRepository,
>;

pub type TestState = AppState<
    InMemoryTokenRepository,
    InMemorySessionRepository,
    InMemoryPrincipalRepository,
    InMemoryPermissionRepository,
>;

pub struct TestContext {
    pub service: Arc<TestService>,
    pub principals: Arc<InMemoryPrincipalRepository>,
    pub permissions: Arc<InMemoryPermissionRepository>,
}

impl TestContext {
    pub fn new() -> Self {
        let tokens = InMemoryTokenRepository::new();
        let sessions = Arc::new(InMemorySessionRepository::new(tokens.clone()));
        let principals = Arc::new(InMemoryPrincipalRepository::new());
        let permissions = Arc::new(InMemoryPermissionRepository::new());

        let jwt = JwtConfig {
            purpose_secret: "api-test-purpose".to_string(),
            ..JwtConfig::new("api-test-access", "api-test-refresh")
        }
        .with_access_expiry_minutes(10)
        .with_refresh_expiry_days(7);

        let service = Arc::new(TokenService::new(
            Arc::new(tokens),
            sessions,
            principals.clone(),
            permissions.clone(),
            Arc::new(RevocationStore::new(&RevocationConfig::default())),
            Arc::new(PermissionCache::new(&PermissionCacheConfig::default())),
            TokenServiceConfig::new(jwt, SessionConfig::default()),
        ));

        Self {
            service,
            principals,
            permissions,
        }
    }

    pub fn state(&self) -> web::Data<TestState> {
        web::Data::new(AppState::new(self.service.clone()))
    }

    /// Register an active principal with the given role and permissions
    pub async fn principal(&self, email: &str, role: &str, permissions: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        self.principals.insert(Principal::new(id, email)).await;
        self.permissions
            .set_permissions(
                id,
                PermissionSet::new(
                    vec![RoleRef {
                        id: Uuid::new_v4(),
                        name: role.to_string(),
                    }],
                    permissions.iter().map(|p| p.to_string()),
                ),
            )
            .await;
        id
    }

    pub async fn login(&self, principal_id: Uuid) -> IssuedTokens {
        self.service
            .issue_pair(principal_id, DeviceInfo::new(Some("api-test".into()), None, None))
            .await
            .expect("issue pair")
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
