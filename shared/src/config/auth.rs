//! Token, session and revocation configuration

use serde::{Deserialize, Serialize};

use super::env_or;

const DEFAULT_ACCESS_SECRET: &str = "access-secret-change-in-production";
const DEFAULT_REFRESH_SECRET: &str = "refresh-secret-change-in-production";
const DEFAULT_PURPOSE_SECRET: &str = "purpose-secret-change-in-production";

/// JWT signing configuration
///
/// Access, refresh and single-purpose tokens are signed with distinct secrets
/// so a token of one kind can never verify as another.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret used to sign access tokens
    pub access_secret: String,

    /// Secret used to sign refresh tokens
    pub refresh_secret: String,

    /// Secret used to sign reset-password and email-verification tokens
    pub purpose_secret: String,

    /// Access token expiry time in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiry time in seconds
    pub refresh_token_expiry: i64,

    /// Reset-password token expiry time in seconds
    #[serde(default = "default_reset_password_expiry")]
    pub reset_password_expiry: i64,

    /// Email-verification token expiry time in seconds
    #[serde(default = "default_email_verification_expiry")]
    pub email_verification_expiry: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: String::from(DEFAULT_ACCESS_SECRET),
            refresh_secret: String::from(DEFAULT_REFRESH_SECRET),
            purpose_secret: String::from(DEFAULT_PURPOSE_SECRET),
            access_token_expiry: 600,     // 10 minutes
            refresh_token_expiry: 604800, // 7 days
            reset_password_expiry: default_reset_password_expiry(),
            email_verification_expiry: default_email_verification_expiry(),
        }
    }
}

impl JwtConfig {
    /// Create a configuration with explicit access and refresh secrets
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_secret: std::env::var("JWT_ACCESS_SECRET").unwrap_or(defaults.access_secret),
            refresh_secret: std::env::var("JWT_REFRESH_SECRET").unwrap_or(defaults.refresh_secret),
            purpose_secret: std::env::var("JWT_PURPOSE_SECRET").unwrap_or(defaults.purpose_secret),
            access_token_expiry: env_or("JWT_ACCESS_TOKEN_EXPIRY", defaults.access_token_expiry),
            refresh_token_expiry: env_or("JWT_REFRESH_TOKEN_EXPIRY", defaults.refresh_token_expiry),
            reset_password_expiry: env_or(
                "JWT_RESET_PASSWORD_EXPIRY",
                defaults.reset_password_expiry,
            ),
            email_verification_expiry: env_or(
                "JWT_EMAIL_VERIFICATION_EXPIRY",
                defaults.email_verification_expiry,
            ),
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Check if any secret is still a built-in default (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.access_secret == DEFAULT_ACCESS_SECRET
            || self.refresh_secret == DEFAULT_REFRESH_SECRET
            || self.purpose_secret == DEFAULT_PURPOSE_SECRET
    }

    /// Check that no two token kinds share a signing secret
    pub fn has_distinct_secrets(&self) -> bool {
        self.access_secret != self.refresh_secret
            && self.access_secret != self.purpose_secret
            && self.refresh_secret != self.purpose_secret
    }
}

/// Login session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Sessions idle for longer than this many seconds are reaped
    pub inactivity_timeout: i64,

    /// Interval in seconds between session and expired-token sweeps
    pub sweep_interval: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: 30 * 86400, // 30 days
            sweep_interval: 3600,
        }
    }
}

impl SessionConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            inactivity_timeout: env_or("SESSION_INACTIVITY_TIMEOUT", defaults.inactivity_timeout),
            sweep_interval: env_or("SESSION_SWEEP_INTERVAL", defaults.sweep_interval),
        }
    }
}

/// In-memory revocation blacklist configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RevocationConfig {
    /// Interval in seconds between expired-record sweeps
    pub sweep_interval: u64,

    /// Treat tokens as blacklisted when the store cannot be read
    #[serde(default = "default_fail_closed")]
    pub fail_closed: bool,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            sweep_interval: 300,
            fail_closed: default_fail_closed(),
        }
    }
}

impl RevocationConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sweep_interval: env_or("REVOCATION_SWEEP_INTERVAL", defaults.sweep_interval),
            fail_closed: env_or("REVOCATION_FAIL_CLOSED", defaults.fail_closed),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Revocation blacklist configuration
    #[serde(default)]
    pub revocation: RevocationConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            session: SessionConfig::from_env(),
            revocation: RevocationConfig::from_env(),
        }
    }
}

fn default_reset_password_expiry() -> i64 {
    3600 // 1 hour
}

fn default_email_verification_expiry() -> i64 {
    86400 // 24 hours
}

fn default_fail_closed() -> bool {
    true
}
