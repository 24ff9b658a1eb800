// web-server/src/state.rs
use std::sync::Arc;

use sqlx::SqlitePool;
use vaev_common::Config;

use crate::identity::IdentityProvider;

/// Shared by every worker; all mutable state lives in the database
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            identity,
        }
    }
}
