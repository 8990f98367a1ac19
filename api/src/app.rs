//! Application factory
//!
//! Wires routes, middleware and shared state into an Actix-web `App`.

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, HttpResponse,
};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use wd_core::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};
use wd_shared::errors::{error_codes, ErrorResponse};

use crate::handlers::error::json_error_handler;
use crate::middleware::auth::{AccessTokenValidator, JwtAuth};
use crate::middleware::authorization::Authorize;
use crate::routes::auth::{
    admin::REVOKE_SESSIONS_PERMISSION, list_principal_sessions, list_sessions, logout,
    logout_all, me, refresh, revoke_principal,
};
use crate::routes::health::health_check;
use crate::routes::AppState;

/// Register the `/api/v1/auth` routes and the health check
pub fn configure<T, S, U, P>(cfg: &mut web::ServiceConfig)
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    cfg.route("/health", web::get().to(health_check::<T, S, U, P>))
        .service(
            web::scope("/api/v1/auth")
                .route("/refresh", web::post().to(refresh::<T, S, U, P>))
                .service(
                    web::resource("/logout")
                        .wrap(JwtAuth::required())
                        .route(web::post().to(logout::<T, S, U, P>)),
                )
                .service(
                    web::resource("/logout-all")
                        .wrap(JwtAuth::required())
                        .route(web::post().to(logout_all::<T, S, U, P>)),
                )
                .service(
                    web::resource("/me")
                        .wrap(JwtAuth::required())
                        .route(web::get().to(me)),
                )
                .service(
                    web::resource("/sessions")
                        .wrap(JwtAuth::required())
                        .route(web::get().to(list_sessions::<T, S, U, P>)),
                )
                .service(
                    web::resource("/principals/{id}/sessions")
                        .wrap(JwtAuth::required())
                        .route(web::get().to(list_principal_sessions::<T, S, U, P>)),
                )
                .service(
                    web::resource("/admin/principals/{id}/revoke")
                        .wrap(Authorize::permission(REVOKE_SESSIONS_PERMISSION))
                        .wrap(JwtAuth::required())
                        .route(web::post().to(revoke_principal::<T, S, U, P>)),
                ),
        );
}

/// Create and configure the application with all dependencies
///
/// The token service in `state` is also registered as the
/// [`AccessTokenValidator`] used by the authentication middleware.
pub fn create_app<T, S, U, P>(
    state: web::Data<AppState<T, S, U, P>>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    let validator: Arc<dyn AccessTokenValidator> = state.token_service.clone();

    App::new()
        .app_data(state)
        .app_data(web::Data::from(validator))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(TracingLogger::default())
        .configure(configure::<T, S, U, P>)
        .default_service(web::route().to(not_found))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
