//! Principal context derived from a validated access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::token::{ClaimKind, Claims};

/// Identity and authorization snapshot of an authenticated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    pub principal_id: Uuid,
    pub email: String,
    pub session_id: Uuid,
    pub jti: Uuid,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl AccessContext {
    /// Build from access-token claims. Returns `None` for any other kind.
    pub fn from_claims(claims: Claims) -> Option<Self> {
        let expires_at = claims.expires_at();
        match claims.kind {
            ClaimKind::Access {
                roles,
                permissions,
                session_id,
            } => Some(Self {
                principal_id: claims.user_id,
                email: claims.email,
                session_id,
                jti: claims.jti,
                roles,
                permissions,
                expires_at,
            }),
            _ => None,
        }
    }

    pub fn has_permission(&self, key: &str) -> bool {
        self.permissions.iter().any(|p| p == key)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r == name)
    }
}
