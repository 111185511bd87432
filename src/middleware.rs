use std::rc::Rc;

use actix_service::{forward_ready, Service};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ok, ready, LocalBoxFuture, Ready};

use crate::auth::TokenKeys;
use crate::error::AppError;

/// Identity resolved from a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

/// Why a presented credential was refused. Kept on the request so only
/// handlers that need an [`AuthUser`] answer 401.
#[derive(Debug, Clone)]
struct RejectedCredential(String);

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        let user = match extensions.get::<AuthUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                let message = extensions
                    .get::<RejectedCredential>()
                    .map(|rejected| rejected.0.clone())
                    .unwrap_or_else(|| "Authorization header missing".to_string());
                Err(AppError::Unauthenticated(message).into())
            }
        };
        ready(user)
    }
}

/// Resolves `Authorization: Bearer` headers into an [`AuthUser`] request
/// extension. Every request reaches its handler: a missing or refused
/// credential only matters to handlers that take [`AuthUser`].
pub struct AuthMiddleware {
    keys: TokenKeys,
}

impl AuthMiddleware {
    pub fn new(keys: TokenKeys) -> Self {
        AuthMiddleware { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    keys: TokenKeys,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let keys = self.keys.clone();
        let service = self.service.clone();

        Box::pin(async move {
            if let Some(header) = req.headers().get("Authorization") {
                let verified = bearer_token(header.to_str().ok())
                    .ok_or_else(|| AppError::Unauthenticated("Invalid authorization scheme".to_string()))
                    .and_then(|token| keys.verify(token));
                match verified {
                    Ok(id) => {
                        req.extensions_mut().insert(AuthUser { id });
                    }
                    Err(e) => {
                        log::debug!("Ignoring refused credential: {e}");
                        req.extensions_mut().insert(RejectedCredential(e.to_string()));
                    }
                }
            }
            service.call(req).await
        })
    }
}

fn bearer_token(value: Option<&str>) -> Option<&str> {
    value?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
