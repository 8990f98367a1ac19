//! Configuration for the token service

use chrono::Duration;

use wd_shared::config::{AuthConfig, JwtConfig, SessionConfig};

use crate::domain::entities::token::TokenKind;

/// Configuration for the token service
#[derive(Debug, Clone, Default)]
pub struct TokenServiceConfig {
    /// Secrets and lifetimes per token kind
    pub jwt: JwtConfig,
    /// Session inactivity policy
    pub session: SessionConfig,
}

impl TokenServiceConfig {
    pub fn new(jwt: JwtConfig, session: SessionConfig) -> Self {
        Self { jwt, session }
    }

    pub fn from_auth(config: &AuthConfig) -> Self {
        Self::new(config.jwt.clone(), config.session.clone())
    }

    /// Lifetime of a token of `kind`
    pub fn ttl_for(&self, kind: TokenKind) -> Duration {
        let seconds = match kind {
            TokenKind::Access => self.jwt.access_token_expiry,
            TokenKind::Refresh => self.jwt.refresh_token_expiry,
            TokenKind::ResetPassword => self.jwt.reset_password_expiry,
            TokenKind::EmailVerification => self.jwt.email_verification_expiry,
        };
        Duration::seconds(seconds)
    }

    pub fn access_ttl(&self) -> Duration {
        self.ttl_for(TokenKind::Access)
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.ttl_for(TokenKind::Refresh)
    }
}
