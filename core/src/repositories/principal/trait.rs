//! Principal repository trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::principal::Principal;
use crate::errors::DomainError;

/// Read access to principals (users) owned by the account subsystem
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Find a principal by id
    ///
    /// # Returns
    /// * `Ok(Some(Principal))` - Principal found
    /// * `Ok(None)` - No such principal
    /// * `Err(DomainError)` - Storage error
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, DomainError>;
}
