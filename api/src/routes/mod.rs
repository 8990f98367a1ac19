//! HTTP route handlers

pub mod auth;
pub mod health;

use std::sync::Arc;

use wd_core::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};
use wd_core::services::TokenService;

/// Application state shared by all handlers
pub struct AppState<T, S, U, P>
where
    T: TokenRepository,
    S: SessionRepository,
    U: PrincipalRepository,
    P: PermissionRepository,
{
    pub token_service: Arc<TokenService<T, S, U, P>>,
}

impl<T, S, U, P> AppState<T, S, U, P>
where
    T: TokenRepository,
    S: SessionRepository,
    U: PrincipalRepository,
    P: PermissionRepository,
{
    pub fn new(token_service: Arc<TokenService<T, S, U, P>>) -> Self {
        Self { token_service }
    }
}
