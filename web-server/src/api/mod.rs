// web-server/src/api/mod.rs
pub mod auth;
pub mod graph;
pub mod pages;
pub mod stream;

use actix_web::web;

use crate::middleware::AuthGuard;

const LOGIN_PATH: &str = "/login";

/// Sign-in pages and the public landing page
pub fn configure_auth(cfg: &mut web::ServiceConfig) {
    tracing::info!("Registering auth routes");
    cfg.service(pages::index)
        .service(auth::login_page)
        .service(auth::validate)
        .service(auth::logout)
        .service(auth::user_card);
}

/// HTML pages that require a signed-in user
pub fn configure_pages(cfg: &mut web::ServiceConfig) {
    tracing::info!("Registering page routes");
    cfg.service(
        web::scope("/dashboard")
            .wrap(AuthGuard::redirect(LOGIN_PATH))
            .service(pages::dashboard),
    )
    .service(
        web::scope("/project")
            .wrap(AuthGuard::redirect(LOGIN_PATH))
            .service(pages::editor),
    );
}

pub fn configure_streams(cfg: &mut web::ServiceConfig) {
    tracing::info!("Registering event-stream routes");
    cfg.service(
        web::scope("/sse/project")
            .wrap(AuthGuard::redirect(LOGIN_PATH))
            .service(stream::create_project)
            .service(stream::snapshot)
            .service(stream::node_select)
            .service(stream::edge_select),
    );
}

pub fn configure_graph(cfg: &mut web::ServiceConfig) {
    tracing::info!("Registering graph API routes");
    cfg.service(
        web::scope("/v-api/project")
            .wrap(AuthGuard::json())
            .service(graph::get_project)
            .service(graph::node_types)
            .service(graph::edge_types)
            .service(graph::nodes)
            .service(graph::edges)
            .service(graph::save)
            .service(graph::update_nodes)
            .service(graph::update_edges)
            .service(graph::delete_nodes)
            .service(graph::delete_edges)
            .service(graph::create_nodes)
            .service(graph::create_edges),
    );
}
