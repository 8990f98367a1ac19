//! Permission repository trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::principal::PermissionSet;
use crate::errors::DomainError;

/// Resolves the roles and permission keys currently granted to a principal
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Load the permission set of a principal straight from storage
    ///
    /// # Returns
    /// * `Ok(PermissionSet)` - Possibly empty set of roles and keys
    /// * `Err(DomainError)` - Storage error; callers may fall back to a
    ///   recently cached value
    async fn find_permissions_by_principal_id(
        &self,
        principal_id: Uuid,
    ) -> Result<PermissionSet, DomainError>;
}
