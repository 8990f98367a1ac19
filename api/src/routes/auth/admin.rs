use actix_web::{web, HttpResponse};
use tracing::info;
use uuid::Uuid;

use wd_core::domain::entities::revocation::RevocationReason;
use wd_core::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};

use crate::dto::{RevocationSummaryResponse, RevokePrincipalRequest};
use crate::handlers::error::handle_domain_error;
use crate::middleware::auth::AuthContext;
use crate::routes::AppState;

/// Permission required to revoke another principal's tokens
pub const REVOKE_SESSIONS_PERMISSION: &str = "sessions:revoke";

/// Handler for POST /api/v1/auth/admin/principals/{id}/revoke
///
/// Revokes every token and session of the target principal. The permission
/// check is done by the `Authorize` middleware on the route.
///
/// # Request Body (optional)
///
/// ```json
/// { "reason": "security_breach" }
/// ```
pub async fn revoke_principal<T, S, U, P>(
    state: web::Data<AppState<T, S, U, P>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    body: Option<web::Json<RevokePrincipalRequest>>,
) -> HttpResponse
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    let target = path.into_inner();
    let reason = body
        .and_then(|b| b.into_inner().reason)
        .unwrap_or(RevocationReason::Manual);

    info!(actor = %auth.principal_id, %target, %reason, "administrative revocation");

    match state
        .token_service
        .revoke_all_for_principal(target, reason)
        .await
    {
        Ok(summary) => HttpResponse::Ok().json(RevocationSummaryResponse::from(summary)),
        Err(error) => handle_domain_error(error),
    }
}
