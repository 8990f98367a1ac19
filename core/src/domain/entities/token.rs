//! Token entities: the signed claim set and the persisted token record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of token issued by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    ResetPassword,
    EmailVerification,
}

impl TokenKind {
    /// Column value used by the persistence layer
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "ACCESS",
            TokenKind::Refresh => "REFRESH",
            TokenKind::ResetPassword => "RESET_PASSWORD",
            TokenKind::EmailVerification => "EMAIL_VERIFICATION",
        }
    }

    /// Parse the persistence column value
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "ACCESS" => Some(TokenKind::Access),
            "REFRESH" => Some(TokenKind::Refresh),
            "RESET_PASSWORD" => Some(TokenKind::ResetPassword),
            "EMAIL_VERIFICATION" => Some(TokenKind::EmailVerification),
            _ => None,
        }
    }

    /// Single-purpose kinds are never tied to a session and never rotated
    pub fn is_purpose(&self) -> bool {
        matches!(self, TokenKind::ResetPassword | TokenKind::EmailVerification)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::ResetPassword => "reset_password",
            TokenKind::EmailVerification => "email_verification",
        };
        f.write_str(name)
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenKind::Access),
            "refresh" => Ok(TokenKind::Refresh),
            "reset_password" => Ok(TokenKind::ResetPassword),
            "email_verification" => Ok(TokenKind::EmailVerification),
            other => TokenKind::from_db_str(other)
                .ok_or_else(|| format!("Invalid token kind: {}", other)),
        }
    }
}

/// Kind-specific part of the claim set, tagged on the wire by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaimKind {
    /// Access tokens carry the authorization snapshot taken at issuance
    Access {
        #[serde(default)]
        roles: Vec<String>,
        #[serde(default)]
        permissions: Vec<String>,
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    Refresh {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    ResetPassword,
    EmailVerification,
}

impl ClaimKind {
    pub fn token_kind(&self) -> TokenKind {
        match self {
            ClaimKind::Access { .. } => TokenKind::Access,
            ClaimKind::Refresh { .. } => TokenKind::Refresh,
            ClaimKind::ResetPassword => TokenKind::ResetPassword,
            ClaimKind::EmailVerification => TokenKind::EmailVerification,
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            ClaimKind::Access { session_id, .. } | ClaimKind::Refresh { session_id } => {
                Some(*session_id)
            }
            ClaimKind::ResetPassword | ClaimKind::EmailVerification => None,
        }
    }
}

/// Claim set carried inside a signed token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal the token was issued to
    #[serde(rename = "userId")]
    pub user_id: Uuid,

    pub email: String,

    /// Token id, equal to the id of the persisted [`AuthToken`]
    pub jti: Uuid,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expires at (seconds since epoch)
    pub exp: i64,

    #[serde(flatten)]
    pub kind: ClaimKind,
}

impl Claims {
    pub fn token_kind(&self) -> TokenKind {
        self.kind.token_kind()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.kind.session_id()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Persisted token record
///
/// Created at issuance, mutated only to flip `revoked`, and physically
/// removed only by the expired-token sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Token id; also the `jti` of the signed token
    pub id: Uuid,

    /// Principal this token belongs to
    pub principal_id: Uuid,

    /// SHA-256 of the signed token, hex encoded
    pub token_hash: String,

    pub kind: TokenKind,

    pub expires_at: DateTime<Utc>,

    /// One-way flag: once set it is never cleared
    pub revoked: bool,

    pub device_info: Option<String>,

    pub ip_address: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl AuthToken {
    /// Build the persisted record for freshly signed claims
    pub fn from_claims(
        claims: &Claims,
        token_hash: String,
        device: &super::session::DeviceInfo,
    ) -> Self {
        let created_at = DateTime::<Utc>::from_timestamp(claims.iat, 0).unwrap_or_else(Utc::now);
        Self {
            id: claims.jti,
            principal_id: claims.user_id,
            token_hash,
            kind: claims.token_kind(),
            expires_at: claims.expires_at(),
            revoked: false,
            device_info: device.device_info.clone(),
            ip_address: device.ip_address.clone(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Neither revoked nor expired
    pub fn is_live(&self) -> bool {
        !self.revoked && !self.is_expired()
    }

    /// Flip the revoked flag. Returns `false` if it was already set.
    pub fn revoke(&mut self) -> bool {
        if self.revoked {
            return false;
        }
        self.revoked = true;
        self.updated_at = Utc::now();
        true
    }
}
