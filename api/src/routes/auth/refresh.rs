use actix_web::{web, HttpResponse};

use wd_core::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};

use crate::dto::{RefreshTokenRequest, TokenPairResponse};
use crate::handlers::error::handle_domain_error;
use crate::routes::AppState;

/// Handler for POST /api/v1/auth/refresh
///
/// Rotates a refresh token into a new access/refresh pair on the same
/// session. The presented refresh token and its paired access token stop
/// working immediately.
///
/// # Request Body
///
/// ```json
/// { "refresh_token": "eyJ..." }
/// ```
///
/// ## Errors
/// - 401 Unauthorized: Invalid, expired, revoked or reused refresh token
/// - 503 Service Unavailable: Token storage unreachable
pub async fn refresh<T, S, U, P>(
    state: web::Data<AppState<T, S, U, P>>,
    request: web::Json<RefreshTokenRequest>,
) -> HttpResponse
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    match state.token_service.refresh(&request.refresh_token).await {
        Ok(tokens) => HttpResponse::Ok().json(TokenPairResponse::from(tokens)),
        Err(error) => handle_domain_error(error),
    }
}
