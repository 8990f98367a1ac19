//! Main token service implementation

use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::entities::principal::{PermissionSet, Principal};
use crate::domain::entities::revocation::RevocationReason;
use crate::domain::entities::session::{DeviceInfo, LoginSession};
use crate::domain::entities::token::{AuthToken, ClaimKind, TokenKind};
use crate::domain::value_objects::{AccessContext, IssuedTokens};
use crate::errors::{AuthError, DomainError, DomainResult, TokenError};
use crate::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};
use crate::services::codec::{hash_token, IssuedToken, TokenCodec};
use crate::services::permission_cache::{CacheStats, PermissionCache};
use crate::services::revocation::RevocationStore;
use crate::services::session::SessionService;

use super::config::TokenServiceConfig;

/// Outcome of a bulk revocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevocationSummary {
    /// Persisted tokens whose revoked flag this call flipped
    pub tokens_revoked: usize,
    /// Blacklist records inserted or restamped
    pub blacklisted: usize,
    pub sessions_deactivated: usize,
}

/// Log a rejected credential and convert it into a domain error.
///
/// The reason goes to the log only; callers facing clients collapse it.
fn rejected(operation: &'static str, err: TokenError) -> DomainError {
    if err.is_rejection() {
        warn!(operation, reason = err.reason(), "token rejected");
    } else {
        error!(operation, reason = err.reason(), error = %err, "token check could not complete");
    }
    DomainError::Token(err)
}

/// Check a persisted record against the presented token
fn check_record(record: &AuthToken, token: &str, expected: TokenKind) -> Result<(), TokenError> {
    if !constant_time_eq(record.token_hash.as_bytes(), hash_token(token).as_bytes()) {
        return Err(TokenError::NotFound);
    }
    if record.kind != expected {
        return Err(TokenError::WrongKind {
            expected,
            actual: record.kind,
        });
    }
    if record.revoked {
        return Err(TokenError::Revoked);
    }
    if record.is_expired() {
        return Err(TokenError::Expired);
    }
    Ok(())
}

/// Orchestrates issuance, rotation, revocation and validation of tokens
///
/// A pair moves `Issued -> Valid -> (Revoked | Expired)`. The persisted
/// `revoked` flag is authoritative; the in-process blacklist is consulted
/// first so revocations are visible without a storage round trip.
pub struct TokenService<T, S, U, P>
where
    T: TokenRepository,
    S: SessionRepository,
    U: PrincipalRepository,
    P: PermissionRepository,
{
    token_repository: Arc<T>,
    sessions: SessionService<S>,
    principal_repository: Arc<U>,
    permission_repository: Arc<P>,
    codec: TokenCodec,
    revocations: Arc<RevocationStore>,
    permission_cache: Arc<PermissionCache>,
    config: TokenServiceConfig,
}

impl<T, S, U, P> TokenService<T, S, U, P>
where
    T: TokenRepository,
    S: SessionRepository,
    U: PrincipalRepository,
    P: PermissionRepository,
{
    /// Creates a new token service
    ///
    /// # Arguments
    ///
    /// * `token_repository` - Persisted token records
    /// * `session_repository` - Persisted login sessions
    /// * `principal_repository` - Principal lookup
    /// * `permission_repository` - Role and permission resolution
    /// * `revocations` - Shared in-process blacklist
    /// * `permission_cache` - Shared permission cache
    /// * `config` - Secrets, lifetimes and session policy
    pub fn new(
        token_repository: Arc<T>,
        session_repository: Arc<S>,
        principal_repository: Arc<U>,
        permission_repository: Arc<P>,
        revocations: Arc<RevocationStore>,
        permission_cache: Arc<PermissionCache>,
        config: TokenServiceConfig,
    ) -> Self {
        if config.jwt.is_using_default_secret() {
            warn!("token service is using a default signing secret");
        }
        Self {
            token_repository,
            sessions: SessionService::new(session_repository, config.session.clone()),
            principal_repository,
            permission_repository,
            codec: TokenCodec::new(&config.jwt),
            revocations,
            permission_cache,
            config,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn sessions(&self) -> &SessionService<S> {
        &self.sessions
    }

    pub fn revocations(&self) -> &Arc<RevocationStore> {
        &self.revocations
    }

    pub fn permission_cache(&self) -> &Arc<PermissionCache> {
        &self.permission_cache
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Issue an access/refresh pair bound to a new session
    ///
    /// Roles and permissions are loaded from the repository, bypassing the
    /// cache, and the result replaces any cached entry.
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedTokens)` - Both signed tokens and their lifetimes
    /// * `Err(DomainError)` - Principal missing or inactive, or storage failed
    pub async fn issue_pair(
        &self,
        principal_id: Uuid,
        device: DeviceInfo,
    ) -> DomainResult<IssuedTokens> {
        let principal = self.load_active_principal(principal_id).await?;
        let permissions = self.load_fresh_permissions(principal_id).await?;

        let session_id = Uuid::new_v4();
        let (access, refresh) = self.sign_pair(&principal, &permissions, session_id)?;
        self.persist_pair(&access, &refresh, &device).await?;

        if let Err(err) = self
            .sessions
            .create(session_id, principal_id, access.claims.jti, refresh.claims.jti, device)
            .await
        {
            error!(
                %principal_id,
                %session_id,
                error = %err,
                "session creation failed, discarding pair"
            );
            self.discard(&[access.claims.jti, refresh.claims.jti]).await;
            return Err(err);
        }

        info!(%principal_id, %session_id, "token pair issued");
        Ok(self.issued(access, refresh, session_id))
    }

    /// Roles and permissions straight from the repository; the result
    /// replaces the cached entry
    async fn load_fresh_permissions(&self, principal_id: Uuid) -> DomainResult<PermissionSet> {
        let permissions = self
            .permission_repository
            .find_permissions_by_principal_id(principal_id)
            .await?;
        self.permission_cache.insert(principal_id, permissions.clone());
        Ok(permissions)
    }

    fn sign_pair(
        &self,
        principal: &Principal,
        permissions: &PermissionSet,
        session_id: Uuid,
    ) -> Result<(IssuedToken, IssuedToken), TokenError> {
        let access = self.codec.issue(
            principal,
            ClaimKind::Access {
                roles: permissions.role_names(),
                permissions: permissions.permission_keys(),
                session_id,
            },
            self.config.access_ttl(),
        )?;
        let refresh = self.codec.issue(
            principal,
            ClaimKind::Refresh { session_id },
            self.config.refresh_ttl(),
        )?;
        Ok((access, refresh))
    }

    async fn persist_pair(
        &self,
        access: &IssuedToken,
        refresh: &IssuedToken,
        device: &DeviceInfo,
    ) -> DomainResult<()> {
        self.token_repository
            .save(AuthToken::from_claims(&access.claims, access.hash(), device))
            .await?;
        if let Err(err) = self
            .token_repository
            .save(AuthToken::from_claims(&refresh.claims, refresh.hash(), device))
            .await
        {
            self.discard(&[access.claims.jti]).await;
            return Err(err);
        }
        Ok(())
    }

    /// Best-effort revoke of tokens that were persisted but never handed out
    async fn discard(&self, token_ids: &[Uuid]) {
        for id in token_ids {
            if let Err(err) = self.token_repository.revoke_token(*id).await {
                warn!(jti = %id, error = %err, "failed to discard orphaned token");
            }
        }
    }

    fn issued(&self, access: IssuedToken, refresh: IssuedToken, session_id: Uuid) -> IssuedTokens {
        IssuedTokens::new(
            access.token,
            refresh.token,
            self.config.access_ttl().num_seconds(),
            self.config.refresh_ttl().num_seconds(),
            session_id,
        )
    }

    async fn load_active_principal(&self, principal_id: Uuid) -> DomainResult<Principal> {
        let principal = self
            .principal_repository
            .find_by_id(principal_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;
        if !principal.is_active {
            return Err(rejected("load_principal", TokenError::PrincipalInactive));
        }
        Ok(principal)
    }

    /// Rotate a refresh token into a new pair within the same session
    ///
    /// Like [`Self::issue_pair`], the new access token carries permissions
    /// loaded from the repository rather than the cache.
    ///
    /// The old refresh token is revoked with a compare-and-set, so of several
    /// concurrent refreshes with the same token exactly one succeeds and the
    /// rest fail with [`TokenError::Revoked`]. The paired access token is
    /// revoked too and both old ids are blacklisted.
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<IssuedTokens> {
        let claims = self
            .codec
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| rejected("refresh", e))?;
        if self.revocations.is_blacklisted(claims.jti) {
            return Err(rejected("refresh", TokenError::Blacklisted));
        }

        let record = self
            .token_repository
            .find_by_jti_or_id(claims.jti)
            .await?
            .ok_or_else(|| rejected("refresh", TokenError::NotFound))?;
        check_record(&record, refresh_token, TokenKind::Refresh)
            .map_err(|e| rejected("refresh", e))?;

        let session_id = claims
            .session_id()
            .ok_or_else(|| rejected("refresh", TokenError::Malformed))?;
        let session = self
            .sessions
            .find(session_id)
            .await?
            .filter(|s| s.is_active && s.refresh_token_id == claims.jti)
            .ok_or_else(|| rejected("refresh", TokenError::Revoked))?;

        let principal = self.load_active_principal(claims.user_id).await?;
        let permissions = self.load_fresh_permissions(principal.id).await?;

        if !self.token_repository.revoke_token(claims.jti).await? {
            warn!(
                jti = %claims.jti,
                principal_id = %principal.id,
                %session_id,
                "refresh token reuse rejected"
            );
            return Err(TokenError::Revoked.into());
        }
        self.token_repository.revoke_token(session.access_token_id).await?;

        self.revocations.blacklist(
            claims.jti,
            principal.id,
            TokenKind::Refresh,
            claims.expires_at(),
            RevocationReason::TokenRefresh,
        );
        let access_expiry = self.expiry_of(session.access_token_id, TokenKind::Access).await;
        self.revocations.blacklist_if_absent(
            session.access_token_id,
            principal.id,
            TokenKind::Access,
            access_expiry,
            RevocationReason::TokenRefresh,
        );

        let (access, refresh) = self.sign_pair(&principal, &permissions, session_id)?;
        self.persist_pair(&access, &refresh, &session.device).await?;

        if !self
            .sessions
            .rotate(session_id, access.claims.jti, refresh.claims.jti)
            .await?
        {
            // the session was logged out between the check and the rotation
            self.discard(&[access.claims.jti, refresh.claims.jti]).await;
            return Err(rejected("refresh", TokenError::Revoked));
        }

        debug!(principal_id = %principal.id, %session_id, "token pair rotated");
        Ok(self.issued(access, refresh, session_id))
    }

    /// Stored expiry of a token, or the full lifetime of its kind from now
    async fn expiry_of(&self, token_id: Uuid, kind: TokenKind) -> DateTime<Utc> {
        match self.token_repository.find_by_id(token_id).await {
            Ok(Some(token)) => token.expires_at,
            _ => Utc::now() + self.config.ttl_for(kind),
        }
    }

    /// Revoke a single token by id
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The token was revoked by this call
    /// * `Ok(false)` - It was already revoked
    /// * `Err(DomainError)` - Unknown token or storage failure
    pub async fn revoke(&self, token_id: Uuid) -> DomainResult<bool> {
        let record = self
            .token_repository
            .find_by_id(token_id)
            .await?
            .ok_or(TokenError::NotFound)?;

        let flipped = self.token_repository.revoke_token(token_id).await?;
        if flipped {
            self.revocations.blacklist(
                token_id,
                record.principal_id,
                record.kind,
                record.expires_at,
                RevocationReason::Manual,
            );
            info!(jti = %token_id, principal_id = %record.principal_id, "token revoked");
        } else {
            self.revocations.blacklist_if_absent(
                token_id,
                record.principal_id,
                record.kind,
                record.expires_at,
                RevocationReason::Manual,
            );
            debug!(
                jti = %token_id,
                reason = TokenError::AlreadyRevoked.reason(),
                "revoke was a no-op"
            );
        }
        Ok(flipped)
    }

    /// Revoke every token and session of a principal
    pub async fn revoke_all_for_principal(
        &self,
        principal_id: Uuid,
        reason: RevocationReason,
    ) -> DomainResult<RevocationSummary> {
        let summary = self.revoke_for_principal(principal_id, None, reason).await?;
        self.permission_cache.invalidate(principal_id);
        info!(
            %principal_id,
            %reason,
            tokens = summary.tokens_revoked,
            sessions = summary.sessions_deactivated,
            "all tokens revoked"
        );
        Ok(summary)
    }

    /// Revoke every refresh token of a principal, e.g. after a password change
    ///
    /// Outstanding access tokens stay valid until they expire.
    pub async fn revoke_refresh_tokens_for_principal(
        &self,
        principal_id: Uuid,
        reason: RevocationReason,
    ) -> DomainResult<RevocationSummary> {
        let summary = self
            .revoke_for_principal(principal_id, Some(TokenKind::Refresh), reason)
            .await?;
        info!(
            %principal_id,
            %reason,
            tokens = summary.tokens_revoked,
            "refresh tokens revoked"
        );
        Ok(summary)
    }

    async fn revoke_for_principal(
        &self,
        principal_id: Uuid,
        kind: Option<TokenKind>,
        reason: RevocationReason,
    ) -> DomainResult<RevocationSummary> {
        let live = self
            .token_repository
            .find_live_by_principal(principal_id, kind)
            .await?;
        let tokens_revoked = self
            .token_repository
            .revoke_all_for_principal(principal_id, kind)
            .await?;

        let mut blacklisted = match kind {
            Some(TokenKind::Refresh) => self
                .revocations
                .blacklist_all_refresh_for_principal(principal_id, reason),
            _ => self.revocations.blacklist_all_for_principal(principal_id, reason),
        };
        for token in &live {
            if self.revocations.blacklist_if_absent(
                token.id,
                principal_id,
                token.kind,
                token.expires_at,
                reason,
            ) {
                blacklisted += 1;
            }
        }

        let sessions_deactivated = self.sessions.deactivate_all(principal_id).await?;

        Ok(RevocationSummary {
            tokens_revoked,
            blacklisted,
            sessions_deactivated,
        })
    }

    /// Log out the session a token belongs to
    ///
    /// Accepts either token of the pair. Returns `Ok(false)` if the session
    /// was already closed.
    pub async fn logout(&self, token: &str) -> DomainResult<bool> {
        let kind = match self.codec.decode_unverified(token).map(|c| c.token_kind()) {
            Some(kind @ (TokenKind::Access | TokenKind::Refresh)) => kind,
            _ => return Err(rejected("logout", TokenError::Malformed)),
        };
        let claims = self
            .codec
            .verify(token, kind)
            .map_err(|e| rejected("logout", e))?;
        if self.revocations.is_blacklisted(claims.jti) {
            return Err(rejected("logout", TokenError::Blacklisted));
        }

        let session_id = claims
            .session_id()
            .ok_or_else(|| rejected("logout", TokenError::Malformed))?;
        match self.sessions.find(session_id).await? {
            Some(session) if session.holds_token(claims.jti) => {
                self.logout_session(session_id, RevocationReason::Logout).await
            }
            Some(_) => Err(rejected("logout", TokenError::Revoked)),
            None => Err(rejected("logout", TokenError::NotFound)),
        }
    }

    /// Close a session by id, revoking and blacklisting both of its tokens
    pub async fn logout_session(
        &self,
        session_id: Uuid,
        reason: RevocationReason,
    ) -> DomainResult<bool> {
        let Some(session) = self.sessions.revoke_session_and_tokens(session_id).await? else {
            debug!(%session_id, "session already closed");
            return Ok(false);
        };

        for (token_id, kind) in [
            (session.access_token_id, TokenKind::Access),
            (session.refresh_token_id, TokenKind::Refresh),
        ] {
            let expires_at = self.expiry_of(token_id, kind).await;
            self.revocations
                .blacklist(token_id, session.principal_id, kind, expires_at, reason);
        }

        info!(principal_id = %session.principal_id, %session_id, %reason, "session logged out");
        Ok(true)
    }

    /// Validate an access token
    ///
    /// Signature, blacklist and the persisted record must all agree. Storage
    /// failures surface as [`TokenError::UpstreamUnavailable`]. On success the
    /// session's last activity is advanced.
    pub async fn validate_access(&self, token: &str) -> DomainResult<AccessContext> {
        let claims = self
            .codec
            .verify(token, TokenKind::Access)
            .map_err(|e| rejected("validate_access", e))?;
        if self.revocations.is_blacklisted(claims.jti) {
            return Err(rejected("validate_access", TokenError::Blacklisted));
        }

        let record = self
            .token_repository
            .find_by_jti_or_id(claims.jti)
            .await
            .map_err(DomainError::into_token_state)?
            .ok_or_else(|| rejected("validate_access", TokenError::NotFound))?;
        check_record(&record, token, TokenKind::Access)
            .map_err(|e| rejected("validate_access", e))?;

        let active = self
            .principal_repository
            .find_by_id(claims.user_id)
            .await
            .map_err(DomainError::into_token_state)?
            .is_some_and(|p| p.is_active);
        if !active {
            return Err(rejected("validate_access", TokenError::PrincipalInactive));
        }

        let ctx = AccessContext::from_claims(claims)
            .ok_or_else(|| rejected("validate_access", TokenError::Malformed))?;

        // activity feeds the idle-session reaper; a failed touch does not fail the request
        if let Err(err) = self.sessions.touch(ctx.session_id).await {
            warn!(session_id = %ctx.session_id, error = %err, "failed to record session activity");
        }
        Ok(ctx)
    }

    /// Issue a reset-password or email-verification token
    ///
    /// Earlier tokens of the same kind for the principal are revoked, so only
    /// the latest one can be consumed.
    pub async fn issue_purpose_token(
        &self,
        principal_id: Uuid,
        kind: TokenKind,
    ) -> DomainResult<String> {
        let claim_kind = match kind {
            TokenKind::ResetPassword => ClaimKind::ResetPassword,
            TokenKind::EmailVerification => ClaimKind::EmailVerification,
            TokenKind::Access | TokenKind::Refresh => {
                return Err(DomainError::Validation {
                    message: format!("{} is not a single-purpose token kind", kind),
                })
            }
        };

        let principal = self.load_active_principal(principal_id).await?;
        self.token_repository
            .revoke_all_for_principal(principal_id, Some(kind))
            .await?;

        let issued = self
            .codec
            .issue(&principal, claim_kind, self.config.ttl_for(kind))?;
        self.token_repository
            .save(AuthToken::from_claims(&issued.claims, issued.hash(), &DeviceInfo::default()))
            .await?;

        debug!(%principal_id, %kind, "purpose token issued");
        Ok(issued.token)
    }

    /// Consume a single-purpose token, returning its principal id
    ///
    /// A second consumption of the same token fails with
    /// [`TokenError::Revoked`].
    pub async fn consume_purpose_token(&self, token: &str, kind: TokenKind) -> DomainResult<Uuid> {
        if !kind.is_purpose() {
            return Err(DomainError::Validation {
                message: format!("{} is not a single-purpose token kind", kind),
            });
        }

        let claims = self
            .codec
            .verify(token, kind)
            .map_err(|e| rejected("consume_purpose_token", e))?;
        if self.revocations.is_blacklisted(claims.jti) {
            return Err(rejected("consume_purpose_token", TokenError::Blacklisted));
        }

        let record = self
            .token_repository
            .find_by_jti_or_id(claims.jti)
            .await?
            .ok_or_else(|| rejected("consume_purpose_token", TokenError::NotFound))?;
        check_record(&record, token, kind).map_err(|e| rejected("consume_purpose_token", e))?;

        if !self.token_repository.revoke_token(claims.jti).await? {
            return Err(rejected("consume_purpose_token", TokenError::Revoked));
        }

        info!(principal_id = %claims.user_id, %kind, "purpose token consumed");
        Ok(claims.user_id)
    }

    /// Current roles and permissions of a principal, through the cache
    pub async fn resolve_permissions(&self, principal_id: Uuid) -> DomainResult<PermissionSet> {
        let repository = Arc::clone(&self.permission_repository);
        self.permission_cache
            .get(principal_id, || async move {
                repository.find_permissions_by_principal_id(principal_id).await
            })
            .await
    }

    /// Drop cached permissions of every principal holding `role_id`
    pub fn on_role_changed(&self, role_id: Uuid) -> usize {
        let invalidated = self.permission_cache.invalidate_by_role(role_id);
        info!(%role_id, invalidated, "role changed, permission cache invalidated");
        invalidated
    }

    /// Drop cached permissions of one principal
    pub fn on_permissions_changed(&self, principal_id: Uuid) {
        self.permission_cache.invalidate(principal_id);
    }

    pub async fn list_sessions(&self, principal_id: Uuid) -> DomainResult<Vec<LoginSession>> {
        self.sessions.list_active(principal_id).await
    }

    pub fn sweep_revocations(&self) -> usize {
        self.revocations.sweep_expired()
    }

    pub async fn delete_expired_tokens(&self) -> DomainResult<usize> {
        self.token_repository.delete_expired().await
    }

    pub async fn reap_idle_sessions(&self) -> DomainResult<usize> {
        self.sessions.reap_idle().await
    }

    pub fn cleanup_permission_cache(&self) -> usize {
        self.permission_cache.cleanup()
    }

    pub fn permission_cache_stats(&self) -> CacheStats {
        self.permission_cache.stats()
    }

    pub fn blacklisted_count(&self) -> usize {
        self.revocations.len()
    }
}
