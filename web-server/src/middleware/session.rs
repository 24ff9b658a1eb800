// web-server/src/middleware/session.rs
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    cookie::{time, Cookie, SameSite},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::PayloadError,
    http::Method,
    web::Bytes,
    Error, HttpMessage, HttpRequest,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use futures_util::{stream, Stream};
use vaev_common::models::{SessionData, SESSION_TTL_DAYS};
use vaev_common::SignedCookieCodec;

use crate::error::ApiError;
use crate::forms::{form_kind, parse_form, read_body, FORM_BODY_LIMIT};
use crate::utils::token::{constant_time_eq, generate_csrf_token};

pub const SESSION_COOKIE: &str = "app_session";
pub const CSRF_FIELD: &str = "CSRF-Token";
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// The session's CSRF token, stored in request extensions for page rendering
#[derive(Debug, Clone)]
pub struct CsrfToken(pub String);

pub fn csrf_token(req: &HttpRequest) -> String {
    req.extensions()
        .get::<CsrfToken>()
        .map(|token| token.0.clone())
        .unwrap_or_default()
}

/// `HttpOnly; Secure; SameSite=Strict; Path=/` cookie expiring `ttl` from now
pub fn secure_cookie(name: &str, value: String, ttl: time::Duration) -> Cookie<'static> {
    Cookie::build(name.to_owned(), value)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .expires(time::OffsetDateTime::now_utc() + ttl)
        .finish()
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Put a buffered body back so handlers can read it again
fn restore_payload(req: &mut ServiceRequest, body: Bytes) {
    let replay: Pin<Box<dyn Stream<Item = Result<Bytes, PayloadError>>>> =
        Box::pin(stream::once(async move { Ok(body) }));
    req.set_payload(Payload::from(replay));
}

/// Carries the CSRF token in a signed `app_session` cookie and checks it on
/// every state-changing request.
#[derive(Clone)]
pub struct SessionCsrf {
    codec: Arc<SignedCookieCodec>,
}

impl SessionCsrf {
    pub fn new(codec: SignedCookieCodec) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionCsrf
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionCsrfMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionCsrfMiddleware {
            service: Rc::new(service),
            codec: Arc::clone(&self.codec),
        }))
    }
}

pub struct SessionCsrfMiddleware<S> {
    service: Rc<S>,
    codec: Arc<SignedCookieCodec>,
}

/// Adopt a valid session cookie, otherwise start a session with a fresh token
fn load_session(codec: &SignedCookieCodec, req: &ServiceRequest) -> SessionData {
    let session = match req.cookie(SESSION_COOKIE) {
        Some(cookie) => codec.decode(cookie.value()).unwrap_or_else(|e| {
            tracing::debug!("Discarding session cookie: {}", e);
            SessionData::default()
        }),
        None => SessionData::default(),
    };

    if session.has_csrf_token() {
        session
    } else {
        SessionData::with_csrf_token(generate_csrf_token())
    }
}

/// Token supplied by the client, from the form body or the header
async fn supplied_token(req: &mut ServiceRequest) -> Result<Option<String>, ApiError> {
    if form_kind(req.headers()).is_none() {
        return Ok(req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned));
    }

    let body = read_body(req.take_payload(), FORM_BODY_LIMIT).await?;
    let fields = parse_form(req.headers(), body.clone()).await;
    restore_payload(req, body);

    Ok(fields?.get(CSRF_FIELD).map(str::to_owned))
}

impl<S, B> Service<ServiceRequest> for SessionCsrfMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let codec = Arc::clone(&self.codec);

        Box::pin(async move {
            let mut session = load_session(&codec, &req);

            if !is_safe(req.method()) {
                let verdict = match supplied_token(&mut req).await {
                    Ok(None) => Err(ApiError::CsrfMissing),
                    Ok(Some(token)) if !constant_time_eq(&token, &session.csrf_token) => {
                        Err(ApiError::CsrfInvalid)
                    }
                    Ok(Some(_)) => Ok(()),
                    Err(e) => Err(e),
                };

                if let Err(e) = verdict {
                    tracing::warn!("Rejected {} {}: {}", req.method(), req.path(), e);
                    return Ok(req.error_response(e).map_into_right_body());
                }
            }

            req.extensions_mut()
                .insert(CsrfToken(session.csrf_token.clone()));

            let mut res = service.call(req).await?;

            session.expires_at =
                chrono::Utc::now().timestamp() + SESSION_TTL_DAYS * 24 * 60 * 60;
            match codec.encode(&session) {
                Ok(value) => {
                    let cookie = secure_cookie(
                        SESSION_COOKIE,
                        value,
                        time::Duration::days(SESSION_TTL_DAYS),
                    );
                    if let Err(e) = res.response_mut().add_cookie(&cookie) {
                        tracing::warn!("Failed to set session cookie: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Failed to encode session cookie: {}", e),
            }

            Ok(res.map_into_left_body())
        })
    }
}
