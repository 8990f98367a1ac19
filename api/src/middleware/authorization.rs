//! Permission and role checks on top of an authenticated request.
//!
//! Requirements compose with AND/OR. The [`Authorize`] middleware enforces a
//! requirement for a whole resource; handlers that need the resource owner
//! use [`authorize_owner_or`].

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    fmt,
    future::{ready, Ready},
    rc::Rc,
};
use uuid::Uuid;

use wd_core::domain::value_objects::AccessContext;
use wd_core::errors::{AuthError, DomainError};

use crate::handlers::error::handle_domain_error;

use super::auth::AuthContext;

/// What an authenticated principal must hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Permission(String),
    Role(String),
    /// Every member must hold; an empty list always holds
    All(Vec<Requirement>),
    /// At least one member must hold; an empty list never holds
    Any(Vec<Requirement>),
}

impl Requirement {
    pub fn permission(key: impl Into<String>) -> Self {
        Requirement::Permission(key.into())
    }

    pub fn role(name: impl Into<String>) -> Self {
        Requirement::Role(name.into())
    }

    pub fn all(requirements: impl IntoIterator<Item = Requirement>) -> Self {
        Requirement::All(requirements.into_iter().collect())
    }

    pub fn any(requirements: impl IntoIterator<Item = Requirement>) -> Self {
        Requirement::Any(requirements.into_iter().collect())
    }

    /// Every listed permission
    pub fn all_permissions<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::all(keys.into_iter().map(Self::permission))
    }

    /// At least one listed permission
    pub fn any_permission<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::any(keys.into_iter().map(Self::permission))
    }

    pub fn is_satisfied_by(&self, ctx: &AccessContext) -> bool {
        match self {
            Requirement::Permission(key) => ctx.has_permission(key),
            Requirement::Role(name) => ctx.has_role(name),
            Requirement::All(requirements) => requirements.iter().all(|r| r.is_satisfied_by(ctx)),
            Requirement::Any(requirements) => requirements.iter().any(|r| r.is_satisfied_by(ctx)),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Requirement], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", part)?;
    }
    f.write_str(")")
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Permission(key) => f.write_str(key),
            Requirement::Role(name) => write!(f, "role:{}", name),
            Requirement::All(parts) => write_joined(f, parts, " AND "),
            Requirement::Any(parts) => write_joined(f, parts, " OR "),
        }
    }
}

/// Check a requirement against the caller
pub fn authorize(ctx: &AccessContext, requirement: &Requirement) -> Result<(), DomainError> {
    if requirement.is_satisfied_by(ctx) {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            required: requirement.to_string(),
        }
        .into())
    }
}

/// Allow the owner of a resource, or anyone satisfying `fallback`
pub fn authorize_owner_or(
    ctx: &AccessContext,
    owner_id: Uuid,
    fallback: &Requirement,
) -> Result<(), DomainError> {
    if ctx.principal_id == owner_id {
        return Ok(());
    }
    authorize(ctx, fallback)
}

/// Middleware enforcing a [`Requirement`]
///
/// Must run inside [`super::JwtAuth`]: register it with `.wrap()` before the
/// authentication middleware so that authentication executes first.
#[derive(Debug, Clone)]
pub struct Authorize {
    requirement: Rc<Requirement>,
}

impl Authorize {
    pub fn new(requirement: Requirement) -> Self {
        Self {
            requirement: Rc::new(requirement),
        }
    }

    pub fn permission(key: impl Into<String>) -> Self {
        Self::new(Requirement::permission(key))
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authorize
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthorizeMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthorizeMiddleware {
            service: Rc::new(service),
            requirement: Rc::clone(&self.requirement),
        }))
    }
}

pub struct AuthorizeMiddleware<S> {
    service: Rc<S>,
    requirement: Rc<Requirement>,
}

impl<S, B> Service<ServiceRequest> for AuthorizeMiddleware<S>
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
        let requirement = Rc::clone(&self.requirement);

        Box::pin(async move {
            let decision = match req.extensions().get::<AuthContext>() {
                Some(ctx) => authorize(ctx, &requirement),
                None => Err(AuthError::Unauthorized.into()),
            };

            if let Err(error) = decision {
                let response = handle_domain_error(error);
                return Ok(req.into_response(response).map_into_right_body());
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}
