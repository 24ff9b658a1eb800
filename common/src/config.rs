// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use config::{Config as ConfigFile, ConfigError, Environment, File};

/// Run mode that switches asset serving to the unbundled frontend sources
pub const DEVELOPMENT: &str = "development";

/// Central configuration for the web server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub web_server_addr: String,
    pub app_env: String,
    /// HMAC key for the signed session cookie. Required.
    pub session_key: String,
    /// Secret for auth tokens; the session key is used when unset
    pub token_secret: Option<String>,
    pub database_url: String,
    pub auth_cookie_name: String,
    pub max_body_bytes: usize,

    // Static file serving configuration
    pub static_files: StaticFilesConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    pub path: String,
    pub dev_path: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            path: "./dist".to_string(),
            dev_path: "./frontend".to_string(),
        }
    }
}

impl Config {
    /// Build a configuration around an explicit session key, everything else defaulted
    pub fn with_session_key(session_key: impl Into<String>) -> Self {
        Self {
            web_server_addr: "127.0.0.1:8090".to_string(),
            app_env: "production".to_string(),
            session_key: session_key.into(),
            token_secret: None,
            database_url: "sqlite://vaev.db?mode=rwc".to_string(),
            auth_cookie_name: "vaev-auth".to_string(),
            max_body_bytes: 8 * 1024 * 1024,
            static_files: StaticFilesConfig::default(),
        }
    }

    /// Load configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        // APP_ENV doubles as the run mode, defaulting to production
        let run_mode = env::var("APP_ENV").unwrap_or_else(|_| "production".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let defaults = Self::with_session_key("");
        let config: Self = ConfigFile::builder()
            // Start with defaults
            .set_default("web_server_addr", defaults.web_server_addr)?
            .set_default("database_url", defaults.database_url)?
            .set_default("auth_cookie_name", defaults.auth_cookie_name)?
            .set_default("max_body_bytes", defaults.max_body_bytes as u64)?
            .set_default("static_files.path", defaults.static_files.path)?
            .set_default("static_files.dev_path", defaults.static_files.dev_path)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add environment specific config
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            // Add a local config file for local overrides
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables with prefix "APP"
            .add_source(Environment::with_prefix("APP").separator("__"))
            // The bare names are part of the deployment contract
            .set_override("app_env", run_mode)?
            .set_override_option("session_key", env::var("SESSION_KEY").ok())?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "SESSION_KEY is required to sign session cookies".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.app_env == DEVELOPMENT
    }

    /// Secret used to sign auth tokens
    pub fn token_secret(&self) -> &[u8] {
        self.token_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .unwrap_or(self.session_key.as_str())
            .as_bytes()
    }
}
