//! HS256 token codec

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use wd_shared::config::JwtConfig;

use crate::domain::entities::principal::Principal;
use crate::domain::entities::token::{ClaimKind, Claims, TokenKind};
use crate::errors::TokenError;

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// A freshly signed token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    pub fn hash(&self) -> String {
        hash_token(&self.token)
    }
}

/// Signs and verifies claim sets
///
/// Pure function of secrets, payload and the wall clock; holds no state
/// beyond the keys.
pub struct TokenCodec {
    access: SigningKeys,
    refresh: SigningKeys,
    purpose: SigningKeys,
    header: Header,
    validation: Validation,
    unverified: Validation,
}

impl TokenCodec {
    /// Creates a codec from the JWT configuration
    pub fn new(config: &JwtConfig) -> Self {
        Self::from_secrets(
            &config.access_secret,
            &config.refresh_secret,
            &config.purpose_secret,
        )
    }

    /// Creates a codec from explicit secrets
    pub fn from_secrets(access_secret: &str, refresh_secret: &str, purpose_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        let mut unverified = Validation::new(Algorithm::HS256);
        unverified.insecure_disable_signature_validation();
        unverified.validate_exp = false;
        unverified.required_spec_claims.clear();

        Self {
            access: SigningKeys::from_secret(access_secret),
            refresh: SigningKeys::from_secret(refresh_secret),
            purpose: SigningKeys::from_secret(purpose_secret),
            header: Header::new(Algorithm::HS256),
            validation,
            unverified,
        }
    }

    fn keys_for(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
            TokenKind::ResetPassword | TokenKind::EmailVerification => &self.purpose,
        }
    }

    /// Issue a token of the given kind for a principal
    ///
    /// Every call draws a fresh `jti` and stamps `iat` with the current time.
    ///
    /// # Arguments
    ///
    /// * `principal` - Subject of the token
    /// * `kind` - Kind-specific claims
    /// * `ttl` - Lifetime; must be positive
    pub fn issue(
        &self,
        principal: &Principal,
        kind: ClaimKind,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::SigningFailed);
        }
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: principal.id,
            email: principal.email.clone(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl.num_seconds(),
            kind,
        };
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Sign an already assembled claim set with the secret for its kind
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let keys = self.keys_for(claims.token_kind());
        encode(&self.header, claims, &keys.encoding).map_err(|e| {
            debug!(error = %e, "token signing failed");
            TokenError::SigningFailed
        })
    }

    /// Verify a token expected to be of `expected` kind
    ///
    /// Checks the signature, then expiry, then that the embedded `type`
    /// matches.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let keys = self.keys_for(expected);
        let data = decode::<Claims>(token, &keys.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        let claims = data.claims;

        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed);
        }
        if claims.is_expired_at(Utc::now()) {
            return Err(TokenError::Expired);
        }

        let actual = claims.token_kind();
        if actual != expected {
            return Err(TokenError::WrongKind { expected, actual });
        }

        Ok(claims)
    }

    /// Read claims without checking signature or expiry.
    ///
    /// For routing decisions only (e.g. which kind to verify as); never use
    /// the result to authorize anything.
    pub fn decode_unverified(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.purpose.decoding, &self.unverified)
            .ok()
            .map(|data| data.claims)
    }
}

/// Hash a signed token for storage as its opaque persisted reference
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
