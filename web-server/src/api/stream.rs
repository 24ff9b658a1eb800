// web-server/src/api/stream.rs
//! Event-stream endpoints driving the editor and dashboard, mounted at `/sse/project`.
use actix_web::{get, post, web, HttpRequest};
use vaev_common::models::GraphSignals;

use crate::db;
use crate::error::ApiError;
use crate::forms::read_form;
use crate::middleware::{require_project_owner, CurrentUser};
use crate::sse::{MergeMode, SseResponse};
use crate::state::AppState;
use crate::views;

/// Whole graph of the project as one signal merge
#[get("/{id}")]
pub async fn snapshot(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<SseResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;

    let node_types = db::node_types_for_project(&state.pool, &project.id).await?;
    let edge_types = db::edge_types_for_project(&state.pool, &project.id).await?;
    let nodes = db::nodes_for_project(&state.pool, &project.id).await?;
    let edges = db::edges_for_project(&state.pool, &project.id).await?;

    let signals = GraphSignals {
        current_edge_type: edge_types.first().map(|t| t.id.clone()),
        project,
        node_types,
        edge_types,
        nodes,
        edges,
    };

    SseResponse::new()
        .merge_signals(&signals)
        .map_err(|e| ApiError::Internal(e.into()))
}

#[get("/{id}/node-select")]
pub async fn node_select(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<SseResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    let node_types = db::node_types_for_project(&state.pool, &project.id).await?;
    Ok(SseResponse::new().merge_fragments(
        &views::node_type_select(&node_types),
        None,
        MergeMode::Morph,
    ))
}

#[get("/{id}/edge-select")]
pub async fn edge_select(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<SseResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    let edge_types = db::edge_types_for_project(&state.pool, &project.id).await?;
    Ok(SseResponse::new().merge_fragments(
        &views::edge_type_select(&edge_types),
        None,
        MergeMode::Morph,
    ))
}

/// Create a project seeded from the default type catalogs
#[post("/create")]
pub async fn create_project(
    req: HttpRequest,
    payload: web::Payload,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<SseResponse, ApiError> {
    let form = read_form(&req, payload).await?;

    let name = match form.non_empty("project-name") {
        Some(name) => name,
        None => {
            return Ok(SseResponse::new().merge_fragments(
                &views::error_toast("Project name is required"),
                Some("#toaster"),
                MergeMode::Append,
            ))
        }
    };

    let project = db::create_project_with_defaults(&state.pool, &user.0.id, name).await?;

    Ok(SseResponse::new().merge_fragments(
        &views::project_list_item(&project),
        Some("#projects-list"),
        MergeMode::Append,
    ))
}
