// web-server/src/error.rs
use actix_web::{http::{header, StatusCode}, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub const UNAUTHORIZED_MESSAGE: &str = "You are not authorized to access this resource";
pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const CSRF_MISSING_MESSAGE: &str = "CSRF token missing";
pub const CSRF_INVALID_MESSAGE: &str = "Invalid CSRF token";

/// Errors surfaced to HTTP callers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no signed-in user")]
    AuthMissing,
    #[error("user is not allowed to access this resource")]
    Unauthorized,
    #[error("resource not found")]
    NotFound,
    #[error("csrf token missing")]
    CsrfMissing,
    #[error("csrf token mismatch")]
    CsrfInvalid,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::BadRequest(format!("Malformed JSON body: {}", value))
    }
}

fn json_message(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .body(json!({ "message": message }).to_string())
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthMissing | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::CsrfMissing | ApiError::CsrfInvalid => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::AuthMissing | ApiError::Unauthorized => {
                json_message(self.status_code(), UNAUTHORIZED_MESSAGE)
            }
            ApiError::NotFound => json_message(self.status_code(), NOT_FOUND_MESSAGE),
            ApiError::CsrfMissing => HttpResponse::Forbidden()
                .content_type("text/plain; charset=utf-8")
                .body(CSRF_MISSING_MESSAGE),
            ApiError::CsrfInvalid => HttpResponse::Forbidden()
                .content_type("text/plain; charset=utf-8")
                .body(CSRF_INVALID_MESSAGE),
            ApiError::BadRequest(message) => json_message(self.status_code(), message),
            ApiError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                json_message(self.status_code(), "Internal server error")
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                json_message(self.status_code(), "Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_unauthorized_body() {
        let response = ApiError::Unauthorized.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], UNAUTHORIZED_MESSAGE);
    }

    #[actix_web::test]
    async fn test_csrf_errors_are_plain_text() {
        let response = ApiError::CsrfMissing.error_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], CSRF_MISSING_MESSAGE.as_bytes());
    }

    #[test]
    fn test_store_errors_map_to_500() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
