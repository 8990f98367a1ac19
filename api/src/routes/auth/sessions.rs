use actix_web::{web, HttpResponse};
use uuid::Uuid;

use wd_core::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};

use crate::dto::SessionResponse;
use crate::handlers::error::handle_domain_error;
use crate::middleware::auth::AuthContext;
use crate::middleware::authorization::{authorize_owner_or, Requirement};
use crate::routes::AppState;

/// Permission allowing a principal to see other principals' sessions
pub const READ_SESSIONS_PERMISSION: &str = "sessions:read";

async fn respond_with_sessions<T, S, U, P>(
    state: &AppState<T, S, U, P>,
    principal_id: Uuid,
    current_session: Uuid,
) -> HttpResponse
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    match state.token_service.list_sessions(principal_id).await {
        Ok(sessions) => HttpResponse::Ok().json(
            sessions
                .into_iter()
                .map(|s| SessionResponse::from_session(s, current_session))
                .collect::<Vec<_>>(),
        ),
        Err(error) => handle_domain_error(error),
    }
}

/// Handler for GET /api/v1/auth/sessions
///
/// Active sessions of the caller, most recently used first.
pub async fn list_sessions<T, S, U, P>(
    state: web::Data<AppState<T, S, U, P>>,
    auth: AuthContext,
) -> HttpResponse
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    respond_with_sessions(&state, auth.principal_id, auth.session_id).await
}

/// Handler for GET /api/v1/auth/principals/{id}/sessions
///
/// Allowed for the principal itself or callers holding `sessions:read`.
pub async fn list_principal_sessions<T, S, U, P>(
    state: web::Data<AppState<T, S, U, P>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> HttpResponse
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    let principal_id = path.into_inner();
    let fallback = Requirement::permission(READ_SESSIONS_PERMISSION);
    if let Err(error) = authorize_owner_or(&auth, principal_id, &fallback) {
        return handle_domain_error(error);
    }
    respond_with_sessions(&state, principal_id, auth.session_id).await
}
