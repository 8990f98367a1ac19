//! Session repository trait for persisted login sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::session::LoginSession;
use crate::errors::DomainError;

/// Repository trait for [`LoginSession`] persistence operations
///
/// # Consistency Requirements
/// - `revoke_session_and_tokens` must deactivate the session and revoke both
///   of its tokens in one atomic unit
/// - `update` must never move `last_activity_at` backward
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a new session
    ///
    /// # Returns
    /// * `Ok(LoginSession)` - The saved session
    /// * `Err(DomainError)` - Save failed
    async fn save(&self, session: LoginSession) -> Result<LoginSession, DomainError>;

    /// Find a session by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<LoginSession>, DomainError>;

    /// Find the session currently holding a token, by access or refresh id
    ///
    /// # Returns
    /// * `Ok(Some(LoginSession))` - Session references the token
    /// * `Ok(None)` - No session references it (rotated away or never paired)
    async fn find_by_token_id(&self, token_id: Uuid) -> Result<Option<LoginSession>, DomainError>;

    /// Active sessions of a principal, most recent activity first
    async fn find_active_by_principal(
        &self,
        principal_id: Uuid,
    ) -> Result<Vec<LoginSession>, DomainError>;

    /// Point a session at a new token pair and advance its activity time
    ///
    /// # Returns
    /// * `Ok(true)` - Active session updated
    /// * `Ok(false)` - Session missing or inactive
    async fn rotate_tokens(
        &self,
        session_id: Uuid,
        access_token_id: Uuid,
        refresh_token_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Advance `last_activity_at`; older timestamps are ignored
    async fn touch(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError>;

    /// Deactivate all active sessions of a principal
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of sessions deactivated
    async fn deactivate_all(&self, principal_id: Uuid) -> Result<usize, DomainError>;

    /// Atomically deactivate a session and revoke its access and refresh tokens
    ///
    /// # Returns
    /// * `Ok(Some(LoginSession))` - The session as it was before deactivation
    /// * `Ok(None)` - Session missing or already inactive
    async fn revoke_session_and_tokens(
        &self,
        session_id: Uuid,
    ) -> Result<Option<LoginSession>, DomainError>;

    /// Deactivate active sessions idle since before `cutoff`
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of sessions reaped
    async fn deactivate_idle_since(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError>;
}
