//! MySQL implementation of the PermissionRepository trait.
//!
//! Permissions are granted to roles and roles to users; a principal's set is
//! the union over all of its roles.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use wd_core::domain::entities::principal::{PermissionSet, RoleRef};
use wd_core::errors::DomainError;
use wd_core::repositories::PermissionRepository;

use super::{column_error, db_error, parse_uuid};

/// MySQL implementation of PermissionRepository
pub struct MySqlPermissionRepository {
    pool: MySqlPool,
}

impl MySqlPermissionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for MySqlPermissionRepository {
    async fn find_permissions_by_principal_id(
        &self,
        principal_id: Uuid,
    ) -> Result<PermissionSet, DomainError> {
        let id = principal_id.to_string();

        let role_rows = sqlx::query(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.name
            "#,
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load roles"))?;

        let roles = role_rows
            .iter()
            .map(|row| {
                let role_id: String = row.try_get("id").map_err(column_error("id"))?;
                Ok(RoleRef {
                    id: parse_uuid(&role_id, "id")?,
                    name: row.try_get("name").map_err(column_error("name"))?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let permissions: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.permission_key
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = ?
            "#,
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load permissions"))?;

        Ok(PermissionSet::new(roles, permissions))
    }
}
