use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wd_core::domain::entities::revocation::RevocationReason;
use wd_core::domain::entities::session::LoginSession;
use wd_core::domain::value_objects::{AccessContext, IssuedTokens};
use wd_core::services::RevocationSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Token pair returned by `/refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    /// Seconds until the refresh token expires
    pub refresh_expires_in: i64,
    pub session_id: Uuid,
}

impl From<IssuedTokens> for TokenPairResponse {
    fn from(tokens: IssuedTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
            refresh_expires_in: tokens.refresh_expires_in,
            session_id: tokens.session_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
    /// `false` when the session had already been closed
    pub session_closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationSummaryResponse {
    pub tokens_revoked: usize,
    pub sessions_closed: usize,
}

impl From<RevocationSummary> for RevocationSummaryResponse {
    fn from(summary: RevocationSummary) -> Self {
        Self {
            tokens_revoked: summary.tokens_revoked,
            sessions_closed: summary.sessions_deactivated,
        }
    }
}

/// Identity of the caller as carried by its access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub principal_id: Uuid,
    pub email: String,
    pub session_id: Uuid,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<&AccessContext> for MeResponse {
    fn from(ctx: &AccessContext) -> Self {
        Self {
            principal_id: ctx.principal_id,
            email: ctx.email.clone(),
            session_id: ctx.session_id,
            roles: ctx.roles.clone(),
            permissions: ctx.permissions.clone(),
            expires_at: ctx.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Whether this is the session the request was made from
    pub current: bool,
}

impl SessionResponse {
    pub fn from_session(session: LoginSession, current_session: Uuid) -> Self {
        Self {
            current: session.id == current_session,
            id: session.id,
            device_info: session.device.device_info,
            ip_address: session.device.ip_address,
            user_agent: session.device.user_agent,
            last_activity_at: session.last_activity_at,
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevokePrincipalRequest {
    /// Defaults to `manual`
    #[serde(default)]
    pub reason: Option<RevocationReason>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wd_core::domain::entities::session::DeviceInfo;

    #[test]
    fn test_revoke_request_reason_is_optional() {
        let empty: RevokePrincipalRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.reason, None);

        let breach: RevokePrincipalRequest =
            serde_json::from_str(r#"{"reason":"security_breach"}"#).unwrap();
        assert_eq!(breach.reason, Some(RevocationReason::SecurityBreach));

        assert!(serde_json::from_str::<RevokePrincipalRequest>(r#"{"reason":"boredom"}"#).is_err());
    }

    #[test]
    fn test_session_response_marks_current() {
        let session = LoginSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            DeviceInfo::new(Some("laptop".into()), None, None),
        );
        let id = session.id;

        let current = SessionResponse::from_session(session.clone(), id);
        assert!(current.current);
        assert_eq!(current.device_info.as_deref(), Some("laptop"));

        let other = SessionResponse::from_session(session, Uuid::new_v4());
        assert!(!other.current);
    }
}
