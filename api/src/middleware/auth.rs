//! JWT authentication middleware for protecting API endpoints.
//!
//! Extracts the bearer token from the Authorization header, validates it
//! through the [`AccessTokenValidator`] registered as app data, and injects
//! the resulting [`AuthContext`] into the request.
//!
//! In [`AuthMode::Required`] a missing or rejected token ends the request
//! with 401. In [`AuthMode::Optional`] the request proceeds anonymously.

use actix_web::{
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    ops::Deref,
    rc::Rc,
};
use tracing::{debug, error};

use wd_core::domain::value_objects::AccessContext;
use wd_core::errors::{AuthError, DomainError, DomainResult};
use wd_core::repositories::{
    PermissionRepository, PrincipalRepository, SessionRepository, TokenRepository,
};
use wd_core::services::TokenService;

use crate::handlers::error::{handle_domain_error, into_actix_error};

/// Object-safe view of the token service used by the middleware
#[async_trait]
pub trait AccessTokenValidator: Send + Sync {
    async fn validate_access(&self, token: &str) -> DomainResult<AccessContext>;
}

#[async_trait]
impl<T, S, U, P> AccessTokenValidator for TokenService<T, S, U, P>
where
    T: TokenRepository + 'static,
    S: SessionRepository + 'static,
    U: PrincipalRepository + 'static,
    P: PermissionRepository + 'static,
{
    async fn validate_access(&self, token: &str) -> DomainResult<AccessContext> {
        TokenService::validate_access(self, token).await
    }
}

/// Authenticated principal injected into request extensions
#[derive(Debug, Clone)]
pub struct AuthContext(AccessContext);

impl AuthContext {
    pub fn new(context: AccessContext) -> Self {
        Self(context)
    }

    pub fn into_inner(self) -> AccessContext {
        self.0
    }
}

impl Deref for AuthContext {
    type Target = AccessContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Whether a request without a valid token may proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
}

/// JWT authentication middleware factory
#[derive(Debug, Clone, Copy)]
pub struct JwtAuth {
    mode: AuthMode,
}

impl JwtAuth {
    /// Reject requests without a valid access token
    pub fn required() -> Self {
        Self {
            mode: AuthMode::Required,
        }
    }

    /// Attach the principal when a valid token is present, otherwise pass through
    pub fn optional() -> Self {
        Self {
            mode: AuthMode::Optional,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }
}

impl Default for JwtAuth {
    fn default() -> Self {
        Self::required()
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            mode: self.mode,
        }))
    }
}

/// JWT authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    mode: AuthMode,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let mode = self.mode;

        Box::pin(async move {
            let Some(validator) = req
                .app_data::<web::Data<dyn AccessTokenValidator>>()
                .cloned()
            else {
                error!("no access token validator registered");
                let response = handle_domain_error(DomainError::Internal {
                    message: "access token validator not configured".to_string(),
                });
                return Ok(req.into_response(response).map_into_right_body());
            };

            let outcome = match extract_bearer_token(&req) {
                Some(token) => validator.validate_access(&token).await,
                None => Err(AuthError::Unauthorized.into()),
            };

            match (outcome, mode) {
                (Ok(context), _) => {
                    req.extensions_mut().insert(AuthContext::new(context));
                }
                (Err(error), AuthMode::Required) => {
                    let response = handle_domain_error(error);
                    return Ok(req.into_response(response).map_into_right_body());
                }
                (Err(error), AuthMode::Optional) => {
                    debug!(error = %error, "proceeding without authentication");
                }
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

/// Extracts Bearer token from Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| into_actix_error(AuthError::Unauthorized.into()));

        ready(result)
    }
}

/// Extractor for optional authentication
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequest for OptionalAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let auth = req.extensions().get::<AuthContext>().cloned();
        ready(Ok(OptionalAuth(auth)))
    }
}
