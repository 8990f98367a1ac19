use actix_web::{web, HttpResponse};

use wd_core::domain::entities::revocation::RevocationReason;
use wd_core::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};

use crate::dto::{LogoutResponse, RevocationSummaryResponse};
use crate::handlers::error::handle_domain_error;
use crate::middleware::auth::AuthContext;
use crate::routes::AppState;

/// Handler for POST /api/v1/auth/logout
///
/// Closes the session the presented access token belongs to and revokes
/// both of its tokens.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer {access_token}
/// ```
pub async fn logout<T, S, U, P>(
    state: web::Data<AppState<T, S, U, P>>,
    auth: AuthContext,
) -> HttpResponse
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    match state
        .token_service
        .logout_session(auth.session_id, RevocationReason::Logout)
        .await
    {
        Ok(session_closed) => HttpResponse::Ok().json(LogoutResponse {
            message: "Logged out successfully".to_string(),
            session_closed,
        }),
        Err(error) => handle_domain_error(error),
    }
}

/// Handler for POST /api/v1/auth/logout-all
///
/// Revokes every token and closes every session of the caller.
pub async fn logout_all<T, S, U, P>(
    state: web::Data<AppState<T, S, U, P>>,
    auth: AuthContext,
) -> HttpResponse
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    match state
        .token_service
        .revoke_all_for_principal(auth.principal_id, RevocationReason::LogoutAll)
        .await
    {
        Ok(summary) => HttpResponse::Ok().json(RevocationSummaryResponse::from(summary)),
        Err(error) => handle_domain_error(error),
    }
}
