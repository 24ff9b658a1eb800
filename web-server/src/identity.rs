// web-server/src/identity.rs
//! Identity provider seam: credential checks and auth token minting.
use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use vaev_common::models::User;
use vaev_common::{generate_jwt_token, validate_jwt_token};

use crate::db;
use crate::utils::token::verify_password;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid auth token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token subject {0} does not exist")]
    UnknownUser(String),
    #[error("identity store failure: {0}")]
    Store(#[from] sqlx::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check an email/password pair and return the matching account
    async fn verify(&self, email: &str, password: &str) -> Result<User, IdentityError>;

    /// Mint an opaque auth token for the account
    fn mint_token(&self, user: &User) -> Result<String, IdentityError>;

    /// Resolve an auth token back to its account
    async fn resolve_token(&self, token: &str) -> Result<User, IdentityError>;
}

/// Accounts from the `users` table, HS256 tokens
pub struct StoreIdentity {
    pool: SqlitePool,
    secret: Vec<u8>,
}

impl StoreIdentity {
    pub fn new(pool: SqlitePool, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            pool,
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StoreIdentity {
    async fn verify(&self, email: &str, password: &str) -> Result<User, IdentityError> {
        let credentials = db::find_credentials_by_email(&self.pool, email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !verify_password(password, &credentials.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(credentials.into())
    }

    fn mint_token(&self, user: &User) -> Result<String, IdentityError> {
        Ok(generate_jwt_token(&user.id, &self.secret)?)
    }

    async fn resolve_token(&self, token: &str) -> Result<User, IdentityError> {
        let user_id = validate_jwt_token(token, &self.secret)?;
        db::find_user(&self.pool, &user_id)
            .await?
            .ok_or(IdentityError::UnknownUser(user_id))
    }
}
