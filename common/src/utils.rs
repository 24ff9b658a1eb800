// Common Crate - utils.rs
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use jsonwebtoken::{encode, decode, Header, Algorithm, Validation, EncodingKey, DecodingKey};
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

/// Lifetime of an auth token and of the cookie carrying it
pub const AUTH_TOKEN_TTL_DAYS: i64 = 365;

/// Setup tracing for consistent logging across services
pub fn setup_tracing() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Store timestamp, `YYYY-MM-DD HH:MM:SS.sssZ` in UTC
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3fZ").to_string()
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,       // user id
    pub exp: usize,        // expiration time
    pub iat: usize,        // issued at time
}

// Generate an auth token for a user id
pub fn generate_jwt_token(user_id: &str, secret: &[u8]) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as usize;

    let claims = JwtClaims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + (AUTH_TOKEN_TTL_DAYS as usize) * 86400,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret)
    )
}

// Validate an auth token and extract the user id
pub fn validate_jwt_token(token: &str, secret: &[u8]) -> Result<String, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &validation
    )?;

    if token_data.claims.sub.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    Ok(token_data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(format_timestamp(at), "2024-03-09 07:05:01.042Z");
    }

    #[test]
    fn test_jwt_round_trip() {
        let token = generate_jwt_token("user123", b"secret").unwrap();
        assert_eq!(validate_jwt_token(&token, b"secret").unwrap(), "user123");
    }

    #[test]
    fn test_jwt_rejects_other_secret() {
        let token = generate_jwt_token("user123", b"secret").unwrap();
        assert!(validate_jwt_token(&token, b"other").is_err());
    }
}
