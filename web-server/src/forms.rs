// web-server/src/forms.rs
//! Buffered form parsing shared by the CSRF middleware and form handlers.
use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::error::PayloadError;
use actix_web::http::header::{self, HeaderMap};
use actix_web::web::{self, Bytes, BytesMut};
use actix_web::HttpRequest;
use futures_util::{stream, Stream, StreamExt, TryStreamExt};
use thiserror::Error;

use crate::error::ApiError;

/// Cap on buffered form bodies
pub const FORM_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form body exceeds {0} bytes")]
    TooLarge(usize),
    #[error("failed to read request body: {0}")]
    Payload(#[from] PayloadError),
    #[error("malformed multipart body: {0}")]
    Multipart(String),
    #[error("request is not a form submission")]
    NotAForm,
}

impl From<FormError> for ApiError {
    fn from(value: FormError) -> Self {
        ApiError::BadRequest(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    UrlEncoded,
    Multipart,
}

/// Classify a request by its content type, ignoring parameters such as the boundary
pub fn form_kind(headers: &HeaderMap) -> Option<FormKind> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mime: mime::Mime = content_type.parse().ok()?;

    if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
        Some(FormKind::UrlEncoded)
    } else if mime.essence_str() == mime::MULTIPART_FORM_DATA.essence_str() {
        Some(FormKind::Multipart)
    } else {
        None
    }
}

/// Text fields of a submitted form. Later duplicates win.
#[derive(Debug, Clone, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Field value with surrounding whitespace removed, `None` when blank
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|value| !value.is_empty())
    }
}

/// Buffer a request body, failing once it grows past `limit`
pub async fn read_body<S>(mut body: S, limit: usize) -> Result<Bytes, FormError>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if buffer.len() + chunk.len() > limit {
            return Err(FormError::TooLarge(limit));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Parse an already buffered body according to the request's content type
pub async fn parse_form(headers: &HeaderMap, body: Bytes) -> Result<FormFields, FormError> {
    match form_kind(headers) {
        Some(FormKind::UrlEncoded) => Ok(FormFields(
            url::form_urlencoded::parse(&body).into_owned().collect(),
        )),
        Some(FormKind::Multipart) => parse_multipart(headers, body).await,
        None => Err(FormError::NotAForm),
    }
}

async fn parse_multipart(headers: &HeaderMap, body: Bytes) -> Result<FormFields, FormError> {
    let source = stream::once(async move { Ok::<_, PayloadError>(body) });
    let mut multipart = Multipart::new(headers, source);
    let mut fields = HashMap::new();

    while let Some(mut field) = multipart
        .try_next()
        .await
        .map_err(|e| FormError::Multipart(e.to_string()))?
    {
        let name = field.content_disposition().get_name().map(str::to_owned);
        let mut value = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| FormError::Multipart(e.to_string()))?
        {
            value.extend_from_slice(&chunk);
        }

        if let Some(name) = name {
            fields.insert(name, String::from_utf8_lossy(&value).into_owned());
        }
    }

    Ok(FormFields(fields))
}

/// Read and parse a form body inside a handler
pub async fn read_form(req: &HttpRequest, payload: web::Payload) -> Result<FormFields, ApiError> {
    let body = read_body(payload, FORM_BODY_LIMIT).await?;
    Ok(parse_form(req.headers(), body).await?)
}
