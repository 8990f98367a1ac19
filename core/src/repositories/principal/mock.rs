//! In-memory implementation of PrincipalRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::principal::Principal;
use crate::errors::DomainError;

use super::PrincipalRepository;

#[derive(Clone, Default)]
pub struct InMemoryPrincipalRepository {
    principals: Arc<RwLock<HashMap<Uuid, Principal>>>,
}

impl InMemoryPrincipalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, principal: Principal) {
        self.principals.write().await.insert(principal.id, principal);
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) {
        if let Some(principal) = self.principals.write().await.get_mut(&id) {
            principal.is_active = is_active;
        }
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryPrincipalRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, DomainError> {
        Ok(self.principals.read().await.get(&id).cloned())
    }
}
