//! In-memory implementation of PermissionRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::principal::PermissionSet;
use crate::errors::DomainError;

use super::PermissionRepository;

/// In-memory permission source with switchable failure and a call counter
#[derive(Clone, Default)]
pub struct InMemoryPermissionRepository {
    grants: Arc<RwLock<HashMap<Uuid, PermissionSet>>>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_permissions(&self, principal_id: Uuid, set: PermissionSet) {
        self.grants.write().await.insert(principal_id, set);
    }

    /// Make every lookup fail with `DomainError::Upstream` until reset
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of lookups served so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn find_permissions_by_principal_id(
        &self,
        principal_id: Uuid,
    ) -> Result<PermissionSet, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Upstream {
                message: "permission store unavailable".to_string(),
            });
        }
        Ok(self
            .grants
            .read()
            .await
            .get(&principal_id)
            .cloned()
            .unwrap_or_default())
    }
}
