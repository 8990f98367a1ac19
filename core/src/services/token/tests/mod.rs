//! Token service test suites and their shared fixture


use std::sync::Arc;
use uuid::Uuid;

use wd_shared::config::{JwtConfig, PermissionCacheConfig, RevocationConfig, SessionConfig};

use crate::domain::entities::principal::{PermissionSet, Principal, RoleRef};
use crate::domain::entities::session::DeviceInfo;
use crate::repositories::{
    InMemoryPermissionRepository, InMemoryPrincipalRepository, InMemorySessionRepository,
    InMemoryTokenRepository,
};
use crate::services::permission_cache::PermissionCache;
use crate::services::revocation::RevocationStore;
use crate::services::token::{TokenService, TokenServiceConfig};

pub(super) type TestTokenService = TokenService<
    InMemoryTokenRepository,
    InMemorySessionRepository,
    InMemoryPrincipalRepository,
    InMemoryPermissionRepository,
>;

pub(super) struct Fixture {
    pub service: Arc<TestTokenService>,
    pub tokens: Arc<InMemoryTokenRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub principals: Arc<InMemoryPrincipalRepository>,
    pub permissions: Arc<InMemoryPermissionRepository>,
    pub revocations: Arc<RevocationStore>,
    pub cache: Arc<PermissionCache>,
    pub editor: RoleRef,
}

impl Fixture {
    pub fn new() -> Self {
        let tokens = InMemoryTokenRepository::new();
        let sessions = Arc::new(InMemorySessionRepository::new(tokens.clone()));
        let tokens = Arc::new(tokens);
        let principals = Arc::new(InMemoryPrincipalRepository::new());
        let permissions = Arc::new(InMemoryPermissionRepository::new());
        let revocations = Arc::new(RevocationStore::new(&RevocationConfig::default()));
        let cache = Arc::new(PermissionCache::new(&PermissionCacheConfig::default()));

        let jwt = JwtConfig {
            purpose_secret: "test-purpose-secret".to_string(),
            ..JwtConfig::new("test-access-secret", "test-refresh-secret")
        }
        .with_access_expiry_minutes(10)
        .with_refresh_expiry_days(7);

        let service = Arc::new(TokenService::new(
            tokens.clone(),
            sessions.clone(),
            principals.clone(),
            permissions.clone(),
            revocations.clone(),
            cache.clone(),
            TokenServiceConfig::new(jwt, SessionConfig::default()),
        ));

        Self {
            service,
            tokens,
            sessions,
            principals,
            permissions,
            revocations,
            cache,
            editor: RoleRef {
                id: Uuid::new_v4(),
                name: "editor".to_string(),
            },
        }
    }

    /// Register an active principal holding the editor role
    pub async fn principal(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.principals.insert(Principal::new(id, email)).await;
        self.permissions
            .set_permissions(
                id,
                PermissionSet::new(
                    vec![self.editor.clone()],
                    vec!["posts:read".to_string(), "posts:write".to_string()],
                ),
            )
            .await;
        id
    }
}

pub(super) fn device() -> DeviceInfo {
    DeviceInfo::new(
        Some("integration-test".to_string()),
        Some("127.0.0.1".to_string()),
        Some("warden-tests/1.0".to_string()),
    )
}
