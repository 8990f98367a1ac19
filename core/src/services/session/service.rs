//! Session service implementation

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use wd_shared::config::SessionConfig;

use crate::domain::entities::session::{DeviceInfo, LoginSession};
use crate::errors::DomainResult;
use crate::repositories::SessionRepository;

/// Lifecycle of [`LoginSession`] records
///
/// Storage is delegated to the repository; this service owns the
/// inactivity policy and the timestamps written on each transition.
pub struct SessionService<S: SessionRepository> {
    repository: Arc<S>,
    config: SessionConfig,
}

impl<S: SessionRepository> SessionService<S> {
    pub fn new(repository: Arc<S>, config: SessionConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Record a new active session for a freshly issued pair
    ///
    /// # Arguments
    /// * `session_id` - Id already embedded in both tokens' claims
    /// * `principal_id` - Owner of the session
    /// * `access_token_id` - `jti` of the access token
    /// * `refresh_token_id` - `jti` of the refresh token
    /// * `device` - Client metadata captured at login
    pub async fn create(
        &self,
        session_id: Uuid,
        principal_id: Uuid,
        access_token_id: Uuid,
        refresh_token_id: Uuid,
        device: DeviceInfo,
    ) -> DomainResult<LoginSession> {
        let session = LoginSession::new(
            session_id,
            principal_id,
            access_token_id,
            refresh_token_id,
            device,
        );
        let saved = self.repository.save(session).await?;
        debug!(session_id = %saved.id, %principal_id, "session created");
        Ok(saved)
    }

    pub async fn find(&self, session_id: Uuid) -> DomainResult<Option<LoginSession>> {
        self.repository.find_by_id(session_id).await
    }

    /// Session currently holding `token_id` as its access or refresh token
    pub async fn find_by_token_id(&self, token_id: Uuid) -> DomainResult<Option<LoginSession>> {
        self.repository.find_by_token_id(token_id).await
    }

    /// Active sessions of a principal, most recently used first
    pub async fn list_active(&self, principal_id: Uuid) -> DomainResult<Vec<LoginSession>> {
        let mut sessions = self.repository.find_active_by_principal(principal_id).await?;
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(sessions)
    }

    /// Mark the session as used now
    pub async fn touch(&self, session_id: Uuid) -> DomainResult<bool> {
        self.repository.touch(session_id, Utc::now()).await
    }

    /// Point the session at a rotated pair
    pub async fn rotate(
        &self,
        session_id: Uuid,
        access_token_id: Uuid,
        refresh_token_id: Uuid,
    ) -> DomainResult<bool> {
        self.repository
            .rotate_tokens(session_id, access_token_id, refresh_token_id, Utc::now())
            .await
    }

    pub async fn deactivate_all(&self, principal_id: Uuid) -> DomainResult<usize> {
        let count = self.repository.deactivate_all(principal_id).await?;
        if count > 0 {
            info!(%principal_id, sessions = count, "sessions deactivated");
        }
        Ok(count)
    }

    /// Deactivate the session and revoke both of its tokens in one step
    pub async fn revoke_session_and_tokens(
        &self,
        session_id: Uuid,
    ) -> DomainResult<Option<LoginSession>> {
        self.repository.revoke_session_and_tokens(session_id).await
    }

    /// Deactivate sessions idle for longer than the inactivity timeout
    pub async fn reap_idle(&self) -> DomainResult<usize> {
        let cutoff = Utc::now() - Duration::seconds(self.config.inactivity_timeout);
        let reaped = self.repository.deactivate_idle_since(cutoff).await?;
        if reaped > 0 {
            info!(reaped, %cutoff, "idle sessions reaped");
        }
        Ok(reaped)
    }
}
