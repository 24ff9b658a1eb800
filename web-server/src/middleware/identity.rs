// web-server/src/middleware/identity.rs
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use vaev_common::models::User;

use crate::error::ApiError;
use crate::identity::IdentityProvider;

/// The signed-in account, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Resolves the auth cookie to a user. Never rejects and never touches cookies.
#[derive(Clone)]
pub struct Identity {
    provider: Arc<dyn IdentityProvider>,
    cookie_name: String,
}

impl Identity {
    pub fn new(provider: Arc<dyn IdentityProvider>, cookie_name: impl Into<String>) -> Self {
        Self {
            provider,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Identity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = IdentityMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddleware {
            service: Rc::new(service),
            identity: self.clone(),
        }))
    }
}

pub struct IdentityMiddleware<S> {
    service: Rc<S>,
    identity: Identity,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let provider = Arc::clone(&self.identity.provider);
        let token = req
            .cookie(&self.identity.cookie_name)
            .map(|cookie| cookie.value().to_string());

        Box::pin(async move {
            if let Some(token) = token {
                match provider.resolve_token(&token).await {
                    Ok(user) => {
                        req.extensions_mut().insert(AuthUser(user));
                    }
                    Err(e) => {
                        tracing::debug!("Ignoring unresolvable auth cookie: {}", e);
                    }
                }
            }

            service.call(req).await
        })
    }
}

/// The signed-in user attached by [`Identity`], if any
pub fn current_user(req: &HttpRequest) -> Option<User> {
    req.extensions().get::<AuthUser>().map(|auth| auth.0.clone())
}

/// Extractor that fails with 401 when nobody is signed in
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(current_user(req).map(CurrentUser).ok_or(ApiError::AuthMissing))
    }
}
