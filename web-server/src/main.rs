// web-server/src/main.rs
use std::io;
use std::sync::Arc;

use actix_web::HttpServer;
use vaev_common::{setup_tracing, Config};
use vaev_server::{build_app, db, identity::StoreIdentity, state::AppState};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    tracing::error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Setup tracing
    if let Err(e) = setup_tracing() {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }

    // Load configuration; a missing session key stops startup here
    let config = Config::load().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = db::connect(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to open database", e))?;
    db::MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| startup_error("Failed to apply schema migrations", e))?;

    let identity = Arc::new(StoreIdentity::new(pool.clone(), config.token_secret()));
    let server_addr = config.web_server_addr.clone();
    let state = AppState::new(pool, config, identity);

    tracing::info!("Starting Vaev server on {}", server_addr);

    HttpServer::new(move || build_app(state.clone()))
        .bind(&server_addr)?
        .run()
        .await
}
