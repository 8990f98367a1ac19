//! MySQL implementation of the SessionRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use wd_core::domain::entities::session::{DeviceInfo, LoginSession};
use wd_core::errors::DomainError;
use wd_core::repositories::SessionRepository;

use super::{column_error, db_error, parse_uuid};

const SESSION_COLUMNS: &str = "id, user_id, access_token_id, refresh_token_id, device_info, \
                               ip_address, user_agent, is_active, last_activity_at, \
                               created_at, updated_at";

/// MySQL implementation of SessionRepository
pub struct MySqlSessionRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlSessionRepository {
    /// Create a new MySQL session repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to LoginSession entity
    fn row_to_session(row: &MySqlRow) -> Result<LoginSession, DomainError> {
        let id: String = row.try_get("id").map_err(column_error("id"))?;
        let user_id: String = row.try_get("user_id").map_err(column_error("user_id"))?;
        let access: String = row
            .try_get("access_token_id")
            .map_err(column_error("access_token_id"))?;
        let refresh: String = row
            .try_get("refresh_token_id")
            .map_err(column_error("refresh_token_id"))?;

        Ok(LoginSession {
            id: parse_uuid(&id, "id")?,
            principal_id: parse_uuid(&user_id, "user_id")?,
            access_token_id: parse_uuid(&access, "access_token_id")?,
            refresh_token_id: parse_uuid(&refresh, "refresh_token_id")?,
            device: DeviceInfo {
                device_info: row.try_get("device_info").map_err(column_error("device_info"))?,
                ip_address: row.try_get("ip_address").map_err(column_error("ip_address"))?,
                user_agent: row.try_get("user_agent").map_err(column_error("user_agent"))?,
            },
            is_active: row.try_get("is_active").map_err(column_error("is_active"))?,
            last_activity_at: row
                .try_get::<DateTime<Utc>, _>("last_activity_at")
                .map_err(column_error("last_activity_at"))?,
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
impl SessionRepository for MySqlSessionRepository {
    async fn save(&self, session: LoginSession) -> Result<LoginSession, DomainError> {
        let query = r#"
            INSERT INTO login_sessions (
                id, user_id, access_token_id, refresh_token_id, device_info,
                ip_address, user_agent, is_active, last_activity_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(session.id.to_string())
            .bind(session.principal_id.to_string())
            .bind(session.access_token_id.to_string())
            .bind(session.refresh_token_id.to_string())
            .bind(&session.device.device_info)
            .bind(&session.device.ip_address)
            .bind(&session.device.user_agent)
            .bind(session.is_active)
            .bind(session.last_activity_at)
            .bind(session.created_at)
            .bind(session.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to save session"))?;

        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LoginSession>, DomainError> {
        let query = format!("SELECT {} FROM login_sessions WHERE id = ? LIMIT 1", SESSION_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find session"))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn find_by_token_id(&self, token_id: Uuid) -> Result<Option<LoginSession>, DomainError> {
        let query = format!(
            r#"
            SELECT {}
            FROM login_sessions
            WHERE access_token_id = ? OR refresh_token_id = ?
            ORDER BY is_active DESC, last_activity_at DESC
            LIMIT 1
            "#,
            SESSION_COLUMNS
        );
        let id = token_id.to_string();
        let row = sqlx::query(&query)
            .bind(&id)
            .bind(&id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find session by token"))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn find_active_by_principal(
        &self,
        principal_id: Uuid,
    ) -> Result<Vec<LoginSession>, DomainError> {
        let query = format!(
            r#"
            SELECT {}
            FROM login_sessions
            WHERE user_id = ? AND is_active = TRUE
            ORDER BY last_activity_at DESC
            "#,
            SESSION_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(principal_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list sessions"))?;

        rows.iter().map(Self::row_to_session).collect()
    }

    async fn rotate_tokens(
        &self,
        session_id: Uuid,
        access_token_id: Uuid,
        refresh_token_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE login_sessions
            SET access_token_id = ?,
                refresh_token_id = ?,
                last_activity_at = GREATEST(last_activity_at, ?),
                updated_at = ?
            WHERE id = ? AND is_active = TRUE
        "#;

        let result = sqlx::query(query)
            .bind(access_token_id.to_string())
            .bind(refresh_token_id.to_string())
            .bind(at)
            .bind(Utc::now())
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to rotate session tokens"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn touch(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE login_sessions
            SET last_activity_at = GREATEST(last_activity_at, ?), updated_at = ?
            WHERE id = ? AND is_active = TRUE
        "#;

        let result = sqlx::query(query)
            .bind(at)
            .bind(Utc::now())
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to touch session"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_all(&self, principal_id: Uuid) -> Result<usize, DomainError> {
        let result = sqlx::query(
            "UPDATE login_sessions SET is_active = FALSE, updated_at = ? WHERE user_id = ? AND is_active = TRUE",
        )
        .bind(Utc::now())
        .bind(principal_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to deactivate sessions"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn revoke_session_and_tokens(
        &self,
        session_id: Uuid,
    ) -> Result<Option<LoginSession>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let query = format!(
            "SELECT {} FROM login_sessions WHERE id = ? FOR UPDATE",
            SESSION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(session_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to lock session"))?;

        let session = match row.as_ref().map(Self::row_to_session).transpose()? {
            Some(session) if session.is_active => session,
            _ => {
                tx.rollback()
                    .await
                    .map_err(db_error("Failed to roll back transaction"))?;
                return Ok(None);
            }
        };

        let now = Utc::now();
        sqlx::query("UPDATE login_sessions SET is_active = FALSE, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to deactivate session"))?;

        sqlx::query(
            "UPDATE auth_tokens SET revoked = TRUE, updated_at = ? WHERE id IN (?, ?) AND revoked = FALSE",
        )
        .bind(now)
        .bind(session.access_token_id.to_string())
        .bind(session.refresh_token_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to revoke session tokens"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit session revocation"))?;

        Ok(Some(session))
    }

    async fn deactivate_idle_since(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query(
            "UPDATE login_sessions SET is_active = FALSE, updated_at = ? WHERE is_active = TRUE AND last_activity_at < ?",
        )
        .bind(Utc::now())
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to reap idle sessions"))?;

        Ok(result.rows_affected() as usize)
    }
}
