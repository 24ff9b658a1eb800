// web-server/src/middleware/guard.rs
use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use sqlx::SqlitePool;
use vaev_common::models::{Permissions, Project, User};

use crate::db;
use crate::error::ApiError;
use crate::middleware::identity::AuthUser;

#[derive(Debug, Clone)]
enum Rejection {
    /// 303 to the given page with `?next=<current path>`
    Redirect(String),
    /// 401 JSON body
    Json,
}

/// Rejects requests that carry no signed-in user
#[derive(Debug, Clone)]
pub struct AuthGuard {
    rejection: Rejection,
}

impl AuthGuard {
    pub fn redirect(to: impl Into<String>) -> Self {
        Self {
            rejection: Rejection::Redirect(to.into()),
        }
    }

    pub fn json() -> Self {
        Self {
            rejection: Rejection::Json,
        }
    }
}

fn login_location(to: &str, path: &str) -> String {
    format!(
        "{}?next={}",
        to,
        url::form_urlencoded::byte_serialize(path.as_bytes()).collect::<String>()
    )
}

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGuardMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGuardMiddleware {
            service: Rc::new(service),
            rejection: self.rejection.clone(),
        }))
    }
}

pub struct AuthGuardMiddleware<S> {
    service: Rc<S>,
    rejection: Rejection,
}

impl<S, B> Service<ServiceRequest> for AuthGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if req.extensions().contains::<AuthUser>() {
            let service = Rc::clone(&self.service);
            return Box::pin(async move {
                let res = service.call(req).await?;
                Ok(res.map_into_left_body())
            });
        }

        let response = match &self.rejection {
            Rejection::Redirect(to) => {
                let location = login_location(to, req.path());
                HttpResponse::SeeOther()
                    .insert_header((header::LOCATION, location))
                    .finish()
            }
            Rejection::Json => {
                tracing::warn!("Rejected anonymous request to {}", req.path());
                actix_web::ResponseError::error_response(&ApiError::AuthMissing)
            }
        };

        let res = req.into_response(response).map_into_right_body();
        Box::pin(async move { Ok(res) })
    }
}

/// Load the project named in the path and make sure `user` owns it
pub async fn require_project_owner(
    pool: &SqlitePool,
    project_id: &str,
    user: &User,
) -> Result<Project, ApiError> {
    let project = db::find_project(pool, project_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if !project.is_owned_by(user) {
        tracing::warn!(
            "User {} attempted to access project {} owned by {}",
            user.id,
            project.id,
            project.owner
        );
        return Err(ApiError::Unauthorized);
    }

    Ok(project)
}

/// Deny the request unless the project grants every bit of `needed`
pub fn require_permission(project: &Project, needed: Permissions) -> Result<(), ApiError> {
    if project.permissions.contains(needed) {
        Ok(())
    } else {
        tracing::warn!(
            "Project {} lacks permission bits {:?}",
            project.id,
            needed
        );
        Err(ApiError::Unauthorized)
    }
}
