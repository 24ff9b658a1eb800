// web-server/src/lib.rs
pub mod api;
pub mod db;
pub mod error;
pub mod forms;
pub mod identity;
pub mod middleware;
pub mod sse;
pub mod state;
pub mod static_files;
pub mod utils;
pub mod views;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};
use vaev_common::SignedCookieCodec;

use crate::middleware::{Identity, SessionCsrf};
use crate::state::AppState;

/// Assemble the application. Identity runs first, then the session/CSRF layer.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let codec = SignedCookieCodec::new(state.config.session_key.as_str());
    let identity = Identity::new(
        state.identity.clone(),
        state.config.auth_cookie_name.clone(),
    );
    let asset_root = static_files::asset_root(&state.config);
    let max_body_bytes = state.config.max_body_bytes;

    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::PayloadConfig::new(max_body_bytes))
        .configure(api::configure_auth)
        .configure(api::configure_pages)
        .configure(api::configure_streams)
        .configure(api::configure_graph)
        .configure(|cfg| static_files::configure(cfg, &asset_root))
        .wrap(SessionCsrf::new(codec))
        .wrap(identity)
}
