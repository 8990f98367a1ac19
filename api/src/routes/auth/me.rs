use actix_web::HttpResponse;

use crate::dto::MeResponse;
use crate::middleware::auth::AuthContext;

/// Handler for GET /api/v1/auth/me
///
/// Echoes the identity and authorization snapshot of the access token.
pub async fn me(auth: AuthContext) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse::from(&*auth))
}
