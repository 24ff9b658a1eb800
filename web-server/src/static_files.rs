// web-server/src/static_files.rs
use std::path::{Path, PathBuf};

use actix_files::Files;
use actix_web::web;
use vaev_common::Config;

/// URL prefix the pages load scripts and styles from
pub const ASSET_PREFIX: &str = "/dist";

/// Built bundle in production, unbundled sources in development
pub fn asset_root(config: &Config) -> PathBuf {
    if config.is_development() {
        PathBuf::from(&config.static_files.dev_path)
    } else {
        PathBuf::from(&config.static_files.path)
    }
}

// Configure static asset serving under /dist
pub fn configure(cfg: &mut web::ServiceConfig, root: &Path) {
    if !root.is_dir() {
        tracing::warn!("Static asset directory {} does not exist", root.display());
    }
    tracing::info!("Serving {} from {}", ASSET_PREFIX, root.display());

    cfg.service(
        Files::new(ASSET_PREFIX, root)
            .prefer_utf8(true)
            .use_etag(true)
            .use_last_modified(true),
    );
}
