// web-server/tests/common/mod.rs
#![allow(dead_code)]
use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use vaev_common::models::{
    DefaultEdgeType, DefaultNodeType, EdgeType, NodeType, Permissions, Project, SessionData, User,
};
use vaev_common::{Config, SignedCookieCodec};
use vaev_server::db;
use vaev_server::identity::{IdentityProvider, StoreIdentity};
use vaev_server::state::AppState;

pub const SESSION_KEY: &str = "integration-session-key";
pub const CSRF: &str = "integration-csrf-token";
pub const PASSWORD: &str = "correct horse battery staple";
pub const BOUNDARY: &str = "vaev-test-boundary";

pub async fn state() -> AppState {
    let pool = db::connect_in_memory().await.unwrap();
    let config = Config::with_session_key(SESSION_KEY);
    let identity = Arc::new(StoreIdentity::new(pool.clone(), config.token_secret()));
    AppState::new(pool, config, identity)
}

pub async fn user(state: &AppState, email: &str) -> User {
    db::insert_user(&state.pool, email, "Test User", PASSWORD)
        .await
        .unwrap()
}

pub fn auth_cookie(state: &AppState, user: &User) -> Cookie<'static> {
    let token = state.identity.mint_token(user).unwrap();
    Cookie::new(state.config.auth_cookie_name.clone(), token)
}

/// Session cookie whose CSRF token is [`CSRF`]
pub fn session_cookie() -> Cookie<'static> {
    let session = SessionData::with_csrf_token(CSRF.to_string());
    let value = SignedCookieCodec::new(SESSION_KEY).encode(&session).unwrap();
    Cookie::new("app_session", value)
}

pub async fn seed_defaults(state: &AppState, node_names: &[&str], edge_names: &[&str]) {
    for (i, name) in node_names.iter().enumerate() {
        let default = DefaultNodeType {
            id: format!("dnt{}", i),
            name: name.to_string(),
            fill_color: "#ffffff".to_string(),
            stroke_color: "#222222".to_string(),
            stroke_width: 2,
            shape: 1,
            metadata: String::new(),
        };
        db::insert_default_node_type(&state.pool, &default).await.unwrap();
    }
    for (i, name) in edge_names.iter().enumerate() {
        let default = DefaultEdgeType {
            id: format!("det{}", i),
            name: name.to_string(),
            stroke_color: "#444444".to_string(),
            stroke_width: 1,
            metadata: String::new(),
        };
        db::insert_default_edge_type(&state.pool, &default).await.unwrap();
    }
}

/// A project holding one node type and one edge type
pub async fn project(
    state: &AppState,
    owner: &User,
    permissions: Permissions,
) -> (Project, NodeType, EdgeType) {
    let project = db::insert_project(&state.pool, &owner.id, "Graph", permissions)
        .await
        .unwrap();
    let node_type = db::insert_node_type(
        &state.pool,
        &project.id,
        &DefaultNodeType {
            id: String::new(),
            name: "Person".to_string(),
            fill_color: "#ffffff".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 1,
            shape: 0,
            metadata: String::new(),
        },
        "Graph - Person",
    )
    .await
    .unwrap();
    let edge_type = db::insert_edge_type(
        &state.pool,
        &project.id,
        &DefaultEdgeType {
            id: String::new(),
            name: "Knows".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 1,
            metadata: String::new(),
        },
        "Graph - Knows",
    )
    .await
    .unwrap();
    (project, node_type, edge_type)
}

/// `multipart/form-data` content type and body for the given text fields
pub fn multipart(fields: &[(&str, &str)]) -> (String, String) {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

pub fn response_cookie<B: MessageBody>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.into_owned())
}
