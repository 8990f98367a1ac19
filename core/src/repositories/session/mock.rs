//! In-memory implementation of SessionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::session::LoginSession;
use crate::errors::DomainError;
use crate::repositories::token::InMemoryTokenRepository;

use super::SessionRepository;

/// In-memory session repository
///
/// Shares the token store it was built with so that
/// `revoke_session_and_tokens` can flip both sides while holding the session
/// lock.
#[derive(Clone)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<Uuid, LoginSession>>>,
    tokens: InMemoryTokenRepository,
}

impl InMemorySessionRepository {
    pub fn new(tokens: InMemoryTokenRepository) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            tokens,
        }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: LoginSession) -> Result<LoginSession, DomainError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(DomainError::Validation {
                message: "Session already exists".to_string(),
            });
        }
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LoginSession>, DomainError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn find_by_token_id(&self, token_id: Uuid) -> Result<Option<LoginSession>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().find(|s| s.holds_token(token_id)).cloned())
    }

    async fn find_active_by_principal(
        &self,
        principal_id: Uuid,
    ) -> Result<Vec<LoginSession>, DomainError> {
        let sessions = self.sessions.read().await;
        let mut active: Vec<LoginSession> = sessions
            .values()
            .filter(|s| s.principal_id == principal_id && s.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(active)
    }

    async fn rotate_tokens(
        &self,
        session_id: Uuid,
        access_token_id: Uuid,
        refresh_token_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session_id) {
            Some(session) if session.is_active => {
                session.rotate(access_token_id, refresh_token_id, at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn touch(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session_id) {
            Some(session) if session.is_active => {
                session.touch(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn deactivate_all(&self, principal_id: Uuid) -> Result<usize, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .values_mut()
            .filter(|s| s.principal_id == principal_id)
            .map(|s| s.deactivate())
            .filter(|closed| *closed)
            .count())
    }

    async fn revoke_session_and_tokens(
        &self,
        session_id: Uuid,
    ) -> Result<Option<LoginSession>, DomainError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&session_id) else {
            return Ok(None);
        };
        let before = session.clone();
        if !session.deactivate() {
            return Ok(None);
        }
        self.tokens
            .revoke_many(&[before.access_token_id, before.refresh_token_id])
            .await;
        Ok(Some(before))
    }

    async fn deactivate_idle_since(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions
            .values_mut()
            .filter(|s| s.is_active && s.is_idle_since(cutoff))
            .map(|s| s.deactivate())
            .filter(|closed| *closed)
            .count())
    }
}
