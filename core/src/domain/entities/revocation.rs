//! In-memory revocation record and the reasons a token can be revoked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::token::TokenKind;

/// Why a token was revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    Logout,
    LogoutAll,
    PasswordChange,
    AccountDisabled,
    SecurityBreach,
    TokenRefresh,
    Manual,
}

impl RevocationReason {
    /// Rank used when a bulk revocation meets an existing record.
    ///
    /// A record is restamped only when the incoming reason ranks at least as
    /// high as the one it already carries.
    pub fn specificity(&self) -> u8 {
        match self {
            RevocationReason::TokenRefresh => 0,
            RevocationReason::Logout | RevocationReason::Manual => 1,
            RevocationReason::LogoutAll => 2,
            RevocationReason::PasswordChange | RevocationReason::AccountDisabled => 3,
            RevocationReason::SecurityBreach => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::LogoutAll => "logout_all",
            RevocationReason::PasswordChange => "password_change",
            RevocationReason::AccountDisabled => "account_disabled",
            RevocationReason::SecurityBreach => "security_breach",
            RevocationReason::TokenRefresh => "token_refresh",
            RevocationReason::Manual => "manual",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevocationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logout" => Ok(RevocationReason::Logout),
            "logout_all" => Ok(RevocationReason::LogoutAll),
            "password_change" => Ok(RevocationReason::PasswordChange),
            "account_disabled" => Ok(RevocationReason::AccountDisabled),
            "security_breach" => Ok(RevocationReason::SecurityBreach),
            "token_refresh" => Ok(RevocationReason::TokenRefresh),
            "manual" => Ok(RevocationReason::Manual),
            _ => Err(format!("Invalid revocation reason: {}", s)),
        }
    }
}

/// Blacklist entry for one token id
///
/// Lives no longer than the token it mirrors; past `expires_at` the record
/// is garbage and reports nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRecord {
    pub jti: Uuid,
    pub principal_id: Uuid,
    pub kind: TokenKind,
    pub blacklisted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub reason: RevocationReason,
}

impl RevocationRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Apply a bulk reason if it is at least as specific as the current one
    pub fn restamp(&mut self, reason: RevocationReason, at: DateTime<Utc>) -> bool {
        if reason.specificity() < self.reason.specificity() {
            return false;
        }
        self.reason = reason;
        self.blacklisted_at = at;
        true
    }
}
