//! MySQL implementation of the TokenRepository trait.
//!
//! Persists every issued token by id with the SHA-256 of its signed form.
//! Revocation is a conditional `UPDATE ... WHERE revoked = FALSE`, so the
//! affected-row count tells exactly one caller that it won.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use wd_core::domain::entities::token::{AuthToken, TokenKind};
use wd_core::errors::DomainError;
use wd_core::repositories::TokenRepository;

use super::{column_error, db_error, parse_uuid};

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, token_type, expires_at, revoked, \
                             device_info, ip_address, created_at, updated_at";

/// MySQL implementation of TokenRepository
pub struct MySqlTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    /// Create a new MySQL token repository
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to AuthToken entity
    pub(crate) fn row_to_token(row: &MySqlRow) -> Result<AuthToken, DomainError> {
        let id: String = row.try_get("id").map_err(column_error("id"))?;
        let user_id: String = row.try_get("user_id").map_err(column_error("user_id"))?;
        let token_type: String = row.try_get("token_type").map_err(column_error("token_type"))?;

        Ok(AuthToken {
            id: parse_uuid(&id, "id")?,
            principal_id: parse_uuid(&user_id, "user_id")?,
            token_hash: row.try_get("token_hash").map_err(column_error("token_hash"))?,
            kind: TokenKind::from_db_str(&token_type).ok_or_else(|| DomainError::Internal {
                message: format!("Unknown token type: {}", token_type),
            })?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(column_error("expires_at"))?,
            revoked: row.try_get("revoked").map_err(column_error("revoked"))?,
            device_info: row.try_get("device_info").map_err(column_error("device_info"))?,
            ip_address: row.try_get("ip_address").map_err(column_error("ip_address"))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(column_error("created_at"))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(column_error("updated_at"))?,
        })
    }

}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn save(&self, token: AuthToken) -> Result<AuthToken, DomainError> {
        let query = r#"
            INSERT INTO auth_tokens (
                id, user_id, token_hash, token_type, expires_at, revoked,
                device_info, ip_address, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(token.id.to_string())
            .bind(token.principal_id.to_string())
            .bind(&token.token_hash)
            .bind(token.kind.as_db_str())
            .bind(token.expires_at)
            .bind(token.revoked)
            .bind(&token.device_info)
            .bind(&token.ip_address)
            .bind(token.created_at)
            .bind(token.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to save token"))?;

        Ok(token)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthToken>, DomainError> {
        let query = format!("SELECT {} FROM auth_tokens WHERE id = ? LIMIT 1", TOKEN_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find token"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_live_by_principal(
        &self,
        principal_id: Uuid,
        kind: Option<TokenKind>,
    ) -> Result<Vec<AuthToken>, DomainError> {
        let query = format!(
            r#"
            SELECT {}
            FROM auth_tokens
            WHERE user_id = ?
                AND revoked = FALSE
                AND expires_at > ?
                AND (? IS NULL OR token_type = ?)
            ORDER BY created_at DESC
            "#,
            TOKEN_COLUMNS
        );
        let kind = kind.map(|k| k.as_db_str());

        let rows = sqlx::query(&query)
            .bind(principal_id.to_string())
            .bind(Utc::now())
            .bind(kind)
            .bind(kind)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to find principal tokens"))?;

        rows.iter().map(Self::row_to_token).collect()
    }

    async fn revoke_token(&self, id: Uuid) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE auth_tokens
            SET revoked = TRUE, updated_at = ?
            WHERE id = ? AND revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to revoke token"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_all_for_principal(
        &self,
        principal_id: Uuid,
        kind: Option<TokenKind>,
    ) -> Result<usize, DomainError> {
        let query = r#"
            UPDATE auth_tokens
            SET revoked = TRUE, updated_at = ?
            WHERE user_id = ?
                AND revoked = FALSE
                AND (? IS NULL OR token_type = ?)
        "#;
        let kind = kind.map(|k| k.as_db_str());

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(principal_id.to_string())
            .bind(kind)
            .bind(kind)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to revoke principal tokens"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_expired(&self) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete expired tokens"))?;

        let deleted = result.rows_affected() as usize;
        if deleted > 0 {
            tracing::info!(deleted, "expired tokens deleted");
        }
        Ok(deleted)
    }
}
