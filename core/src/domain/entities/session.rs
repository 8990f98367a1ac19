//! Login session entity linking a principal to its current token pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client metadata recorded at login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl DeviceInfo {
    pub fn new(
        device_info: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            device_info,
            ip_address,
            user_agent,
        }
    }
}

/// Persisted login session
///
/// A session always references exactly one access token and one refresh
/// token. Refresh replaces both ids in place; logout deactivates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub access_token_id: Uuid,
    pub refresh_token_id: Uuid,
    pub device: DeviceInfo,
    pub is_active: bool,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoginSession {
    /// Creates a new active session for a freshly issued pair
    pub fn new(
        id: Uuid,
        principal_id: Uuid,
        access_token_id: Uuid,
        refresh_token_id: Uuid,
        device: DeviceInfo,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            principal_id,
            access_token_id,
            refresh_token_id,
            device,
            is_active: true,
            last_activity_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the activity timestamp. Older timestamps are ignored.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_activity_at {
            self.last_activity_at = at;
            self.updated_at = at;
        }
    }

    /// Point the session at a rotated token pair
    pub fn rotate(&mut self, access_token_id: Uuid, refresh_token_id: Uuid, at: DateTime<Utc>) {
        self.access_token_id = access_token_id;
        self.refresh_token_id = refresh_token_id;
        self.touch(at);
    }

    pub fn deactivate(&mut self) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.updated_at = Utc::now();
        true
    }

    pub fn holds_token(&self, token_id: Uuid) -> bool {
        self.access_token_id == token_id || self.refresh_token_id == token_id
    }

    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_activity_at < cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session() -> LoginSession {
        LoginSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            DeviceInfo::default(),
        )
    }

    #[test]
    fn test_touch_never_moves_backward() {
        let mut s = session();
        let start = s.last_activity_at;

        s.touch(start - Duration::minutes(5));
        assert_eq!(s.last_activity_at, start);

        let later = start + Duration::minutes(5);
        s.touch(later);
        assert_eq!(s.last_activity_at, later);
    }

    #[test]
    fn test_rotate_replaces_both_ids() {
        let mut s = session();
        let (access, refresh) = (Uuid::new_v4(), Uuid::new_v4());
        let at = s.last_activity_at + Duration::seconds(1);

        s.rotate(access, refresh, at);

        assert!(s.holds_token(access));
        assert!(s.holds_token(refresh));
        assert_eq!(s.last_activity_at, at);
    }

    #[test]
    fn test_deactivate_once() {
        let mut s = session();
        assert!(s.deactivate());
        assert!(!s.deactivate());
        assert!(!s.is_active);
    }
}
