//! In-memory implementation of TokenRepository for tests and local wiring

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::{AuthToken, TokenKind};
use crate::errors::DomainError;

use super::TokenRepository;

/// In-memory token repository
#[derive(Clone, Default)]
pub struct InMemoryTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, AuthToken>>>,
}

impl InMemoryTokenRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, revoked or not
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }

    /// Flip the revoked flag on several tokens under one lock.
    ///
    /// Used by the in-memory session repository to keep
    /// `revoke_session_and_tokens` atomic.
    pub(crate) async fn revoke_many(&self, ids: &[Uuid]) -> usize {
        let mut tokens = self.tokens.write().await;
        let mut revoked = 0;
        for id in ids {
            if tokens.get_mut(id).is_some_and(|token| token.revoke()) {
                revoked += 1;
            }
        }
        revoked
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn save(&self, token: AuthToken) -> Result<AuthToken, DomainError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(&token.id) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }

        tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthToken>, DomainError> {
        Ok(self.tokens.read().await.get(&id).cloned())
    }

    async fn find_live_by_principal(
        &self,
        principal_id: Uuid,
        kind: Option<TokenKind>,
    ) -> Result<Vec<AuthToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| t.principal_id == principal_id && t.is_live())
            .filter(|t| kind.map_or(true, |k| t.kind == k))
            .cloned()
            .collect())
    }

    async fn revoke_token(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens.get_mut(&id).map_or(false, |token| token.revoke()))
    }

    async fn revoke_all_for_principal(
        &self,
        principal_id: Uuid,
        kind: Option<TokenKind>,
    ) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens
            .values_mut()
            .filter(|t| t.principal_id == principal_id)
            .filter(|t| kind.map_or(true, |k| t.kind == k))
            .map(|t| t.revoke())
            .filter(|flipped| *flipped)
            .count())
    }

    async fn delete_expired(&self) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired());
        Ok(before - tokens.len())
    }
}
