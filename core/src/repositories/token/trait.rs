//! Token repository trait defining the interface for persisted token records.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::token::{AuthToken, TokenKind};
use crate::errors::DomainError;

/// Repository trait for [`AuthToken`] persistence operations
///
/// The persisted `revoked` flag is the authoritative revocation signal shared
/// by every process; the in-memory blacklist only shortens the window in
/// which a revoked token could still pass signature checks.
///
/// # Consistency Requirements
/// - `revoke_token` must be a compare-and-set: exactly one concurrent caller
///   observes `Ok(true)` for a given id
/// - Revocation is one-way; implementations never clear the flag
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Save a new token record
    ///
    /// # Arguments
    /// * `token` - The record to persist; `id` equals the token's `jti`
    ///
    /// # Returns
    /// * `Ok(AuthToken)` - The saved record
    /// * `Err(DomainError)` - Save failed (e.g., duplicate id)
    async fn save(&self, token: AuthToken) -> Result<AuthToken, DomainError>;

    /// Find a token by id (which is also its `jti`)
    ///
    /// # Returns
    /// * `Ok(Some(AuthToken))` - Record found, revoked or not
    /// * `Ok(None)` - No record with that id
    /// * `Err(DomainError)` - Storage error
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthToken>, DomainError>;

    /// Find live (unrevoked, unexpired) tokens of a principal
    ///
    /// # Arguments
    /// * `principal_id` - Owner of the tokens
    /// * `kind` - Restrict to one kind, or `None` for all kinds
    async fn find_live_by_principal(
        &self,
        principal_id: Uuid,
        kind: Option<TokenKind>,
    ) -> Result<Vec<AuthToken>, DomainError>;

    /// Revoke a single token
    ///
    /// # Returns
    /// * `Ok(true)` - This call flipped the flag
    /// * `Ok(false)` - Token missing or already revoked
    /// * `Err(DomainError)` - Storage error
    async fn revoke_token(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Revoke every unrevoked token of a principal
    ///
    /// # Arguments
    /// * `principal_id` - Owner of the tokens
    /// * `kind` - Restrict to one kind, or `None` for all kinds
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of tokens whose flag was flipped
    async fn revoke_all_for_principal(
        &self,
        principal_id: Uuid,
        kind: Option<TokenKind>,
    ) -> Result<usize, DomainError>;

    /// Delete expired token records
    ///
    /// This method should be called periodically to bound table growth.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted
    async fn delete_expired(&self) -> Result<usize, DomainError>;

    /// Find a token by `jti` or id; the two coincide for tokens issued here
    async fn find_by_jti_or_id(&self, id: Uuid) -> Result<Option<AuthToken>, DomainError> {
        self.find_by_id(id).await
    }

    /// Count live tokens for a principal
    async fn count_live(&self, principal_id: Uuid) -> Result<usize, DomainError> {
        Ok(self.find_live_by_principal(principal_id, None).await?.len())
    }
}
