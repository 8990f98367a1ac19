use actix_web::{web, HttpResponse};
use chrono::Utc;

use wd_core::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};
use wd_shared::types::{HealthResponse, HealthStatus};

use super::AppState;

/// Handler for GET /health
///
/// Reports in-process token state; does not touch the database.
pub async fn health_check<T, S, U, P>(state: web::Data<AppState<T, S, U, P>>) -> HttpResponse
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    let service = &state.token_service;
    HttpResponse::Ok().json(HealthResponse {
        status: HealthStatus::Healthy,
        blacklisted_tokens: service.blacklisted_count(),
        cached_principals: service.permission_cache().len(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
