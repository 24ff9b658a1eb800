// web-server/src/api/graph.rs
//! JSON CRUD over one project's graph, mounted at `/v-api/project`.
//!
//! Every handler runs the owner check before it looks at the body, so an
//! unauthorised caller learns nothing from body validation errors.
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::de::DeserializeOwned;
use serde_json::json;
use vaev_common::models::{
    CreatedEdge, CreatedNode, EdgeUpdate, NewEdge, NewNode, NodePosition, Permissions, SaveRequest,
};

use crate::db;
use crate::error::ApiError;
use crate::middleware::{require_permission, require_project_owner, CurrentUser};
use crate::state::AppState;

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

fn message(text: String) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": text }))
}

#[get("/{id}")]
pub async fn get_project(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[get("/{id}/node-types")]
pub async fn node_types(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    let node_types = db::node_types_for_project(&state.pool, &project.id).await?;
    Ok(HttpResponse::Ok().json(node_types))
}

#[get("/{id}/edge-types")]
pub async fn edge_types(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    let edge_types = db::edge_types_for_project(&state.pool, &project.id).await?;
    Ok(HttpResponse::Ok().json(edge_types))
}

#[get("/{id}/nodes")]
pub async fn nodes(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    let nodes = db::nodes_for_project(&state.pool, &project.id).await?;
    Ok(HttpResponse::Ok().json(nodes))
}

#[get("/{id}/edges")]
pub async fn edges(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    let edges = db::edges_for_project(&state.pool, &project.id).await?;
    Ok(HttpResponse::Ok().json(edges))
}

/// Persist node positions from a full graph payload; other fields are ignored
#[post("/{id}/save")]
pub async fn save(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    require_permission(&project, Permissions::EDIT_NODES)?;
    let request: SaveRequest = parse_body(&body)?;

    let mut updated = 0;
    for position in &request.nodes {
        updated += db::update_node_position(&state.pool, &project.id, position).await?;
    }

    tracing::info!("Saved {} node positions in project {}", updated, project.id);
    Ok(message(format!("Saved {} nodes", updated)))
}

#[put("/{id}/update-nodes")]
pub async fn update_nodes(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    require_permission(&project, Permissions::EDIT_NODES)?;
    let positions: Vec<NodePosition> = parse_body(&body)?;

    let mut updated = 0;
    for position in &positions {
        updated += db::update_node_position(&state.pool, &project.id, position).await?;
    }

    Ok(message(format!("Updated {} nodes", updated)))
}

#[put("/{id}/update-edges")]
pub async fn update_edges(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    require_permission(&project, Permissions::EDIT_CONNECTION)?;
    let updates: Vec<EdgeUpdate> = parse_body(&body)?;

    let mut updated = 0;
    for update in &updates {
        match db::update_edge(&state.pool, &project.id, update).await? {
            Some(rows) => updated += rows,
            None => {
                return Err(ApiError::bad_request(format!(
                    "Edge {} references a node or type outside this project",
                    update.id
                )))
            }
        }
    }

    Ok(message(format!("Updated {} edges", updated)))
}

#[delete("/{id}/delete-nodes")]
pub async fn delete_nodes(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    require_permission(&project, Permissions::EDIT_NODES)?;
    let ids: Vec<String> = parse_body(&body)?;

    let mut deleted = 0;
    for id in &ids {
        deleted += db::delete_node(&state.pool, &project.id, id).await?;
    }

    Ok(message(format!("Deleted {} nodes", deleted)))
}

#[delete("/{id}/delete-edges")]
pub async fn delete_edges(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    require_permission(&project, Permissions::EDIT_CONNECTION)?;
    let ids: Vec<String> = parse_body(&body)?;

    let mut deleted = 0;
    for id in &ids {
        deleted += db::delete_edge(&state.pool, &project.id, id).await?;
    }

    Ok(message(format!("Deleted {} edges", deleted)))
}

/// Insert nodes in request order, echoing each client placeholder id
#[post("/{id}/create-nodes")]
pub async fn create_nodes(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    require_permission(&project, Permissions::EDIT_NODES)?;
    let requested: Vec<NewNode> = parse_body(&body)?;

    let mut created = Vec::with_capacity(requested.len());
    for new_node in &requested {
        let node = db::insert_node(&state.pool, &project.id, new_node)
            .await?
            .ok_or_else(|| {
                ApiError::bad_request(format!(
                    "Node type {} does not belong to this project",
                    new_node.node_type
                ))
            })?;

        created.push(CreatedNode {
            id: node.id,
            x: node.x,
            y: node.y,
            name: node.name,
            node_type: node.node_type,
            metadata: node.metadata,
            temp_id: new_node.client_ref(),
        });
    }

    Ok(HttpResponse::Ok().json(created))
}

#[post("/{id}/create-edges")]
pub async fn create_edges(
    path: web::Path<String>,
    user: CurrentUser,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let project = require_project_owner(&state.pool, &path, &user.0).await?;
    require_permission(&project, Permissions::EDIT_CONNECTION)?;
    let requested: Vec<NewEdge> = parse_body(&body)?;

    let mut created = Vec::with_capacity(requested.len());
    for new_edge in &requested {
        let edge = db::insert_edge(&state.pool, &project.id, new_edge)
            .await?
            .ok_or_else(|| {
                ApiError::bad_request(format!(
                    "Edge {} -> {} references a node or type outside this project",
                    new_edge.start_id, new_edge.end_id
                ))
            })?;

        created.push(CreatedEdge {
            id: edge.id,
            start_id: edge.start_id,
            end_id: edge.end_id,
            edge_type: edge.edge_type,
            temp_id: new_edge.client_ref(),
        });
    }

    Ok(HttpResponse::Ok().json(created))
}
