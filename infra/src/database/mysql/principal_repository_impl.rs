//! MySQL implementation of the PrincipalRepository trait.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use wd_core::domain::entities::principal::Principal;
use wd_core::errors::DomainError;
use wd_core::repositories::PrincipalRepository;

use super::{column_error, db_error, parse_uuid};

/// MySQL implementation of PrincipalRepository, backed by the `users` table
pub struct MySqlPrincipalRepository {
    pool: MySqlPool,
}

impl MySqlPrincipalRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalRepository for MySqlPrincipalRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, DomainError> {
        let row = sqlx::query("SELECT id, email, is_active FROM users WHERE id = ? LIMIT 1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find principal"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let id: String = row.try_get("id").map_err(column_error("id"))?;
        Ok(Some(Principal {
            id: parse_uuid(&id, "id")?,
            email: row.try_get("email").map_err(column_error("email"))?,
            is_active: row.try_get("is_active").map_err(column_error("is_active"))?,
        }))
    }
}
