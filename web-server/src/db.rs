// web-server/src/db.rs
//! Project-scoped persistence over SQLite.
//!
//! Every statement that takes ids from a client is also filtered by the
//! project id taken from the URL, so a caller can only touch rows of the
//! project the authorization gate admitted.
use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use vaev_common::models::{
    DefaultEdgeType, DefaultNodeType, Edge, EdgeType, EdgeUpdate, NewEdge, NewNode, Node,
    NodePosition, NodeType, Permissions, Project, User,
};
use vaev_common::now_timestamp;

use crate::utils::token::{generate_record_id, hash_password};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const NODE_COLUMNS: &str = r#"id, project, "type", name, x, y, metadata, created, updated"#;
const EDGE_COLUMNS: &str = r#"id, project, "type", start_id, end_id, created, updated"#;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

/// Single-connection in-memory database with the schema applied
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

// Users

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

impl From<UserCredentials> for User {
    fn from(value: UserCredentials) -> Self {
        Self {
            id: value.id,
            email: value.email,
            name: value.name,
        }
    }
}

pub async fn find_user(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, email, name FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_credentials_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    sqlx::query_as::<_, UserCredentials>(
        "SELECT id, email, name, password_hash FROM users WHERE email = ? COLLATE NOCASE",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn insert_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password: &str,
) -> anyhow::Result<User> {
    let password_hash = hash_password(password)?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name, password_hash)
        VALUES (?, ?, ?, ?)
        RETURNING id, email, name
        "#,
    )
    .bind(generate_record_id())
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

// Projects

pub async fn find_project(pool: &SqlitePool, id: &str) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT id, owner, name, created, updated, permissions FROM projects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_projects(pool: &SqlitePool, owner: &str) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        r#"
        SELECT id, owner, name, created, updated, permissions
        FROM projects
        WHERE owner = ?
        ORDER BY created DESC, id
        "#,
    )
    .bind(owner)
    .fetch_all(pool)
    .await
}

pub async fn insert_project(
    pool: &SqlitePool,
    owner: &str,
    name: &str,
    permissions: Permissions,
) -> Result<Project, sqlx::Error> {
    let now = now_timestamp();
    sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (id, owner, name, created, updated, permissions)
        VALUES (?1, ?2, ?3, ?4, ?4, ?5)
        RETURNING id, owner, name, created, updated, permissions
        "#,
    )
    .bind(generate_record_id())
    .bind(owner)
    .bind(name)
    .bind(now)
    .bind(permissions)
    .fetch_one(pool)
    .await
}

/// Create a project and clone the default type catalogs into it.
///
/// Statements run one at a time in catalog order. A failing insert aborts
/// the rest and leaves what was already written in place.
pub async fn create_project_with_defaults(
    pool: &SqlitePool,
    owner: &str,
    name: &str,
) -> Result<Project, sqlx::Error> {
    let project = insert_project(pool, owner, name, Permissions::ALL).await?;

    for default in list_default_node_types(pool).await? {
        insert_node_type(pool, &project.id, &default, &format!("{} - {}", name, default.name))
            .await?;
    }

    for default in list_default_edge_types(pool).await? {
        insert_edge_type(pool, &project.id, &default, &format!("{} - {}", name, default.name))
            .await?;
    }

    tracing::info!("Created project {} for owner {}", project.id, owner);
    Ok(project)
}

// Type catalogs

pub async fn list_default_node_types(pool: &SqlitePool) -> Result<Vec<DefaultNodeType>, sqlx::Error> {
    sqlx::query_as::<_, DefaultNodeType>(
        r#"
        SELECT id, name, fill_color, stroke_color, stroke_width, shape, metadata
        FROM default_node_types
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_default_edge_types(pool: &SqlitePool) -> Result<Vec<DefaultEdgeType>, sqlx::Error> {
    sqlx::query_as::<_, DefaultEdgeType>(
        r#"
        SELECT id, name, stroke_color, stroke_width, metadata
        FROM default_edge_types
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn insert_default_node_type(
    pool: &SqlitePool,
    default: &DefaultNodeType,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO default_node_types (id, name, fill_color, stroke_color, stroke_width, shape, metadata)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&default.id)
    .bind(&default.name)
    .bind(&default.fill_color)
    .bind(&default.stroke_color)
    .bind(default.stroke_width)
    .bind(default.shape)
    .bind(&default.metadata)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_default_edge_type(
    pool: &SqlitePool,
    default: &DefaultEdgeType,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO default_edge_types (id, name, stroke_color, stroke_width, metadata)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&default.id)
    .bind(&default.name)
    .bind(&default.stroke_color)
    .bind(default.stroke_width)
    .bind(&default.metadata)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_node_type(
    pool: &SqlitePool,
    project_id: &str,
    prototype: &DefaultNodeType,
    name: &str,
) -> Result<NodeType, sqlx::Error> {
    sqlx::query_as::<_, NodeType>(
        r#"
        INSERT INTO node_types (id, project, name, fill_color, stroke_color, stroke_width, shape, metadata)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, project, name, fill_color, stroke_color, stroke_width, shape, metadata
        "#,
    )
    .bind(generate_record_id())
    .bind(project_id)
    .bind(name)
    .bind(&prototype.fill_color)
    .bind(&prototype.stroke_color)
    .bind(prototype.stroke_width)
    .bind(prototype.shape)
    .bind(&prototype.metadata)
    .fetch_one(pool)
    .await
}

pub async fn insert_edge_type(
    pool: &SqlitePool,
    project_id: &str,
    prototype: &DefaultEdgeType,
    name: &str,
) -> Result<EdgeType, sqlx::Error> {
    sqlx::query_as::<_, EdgeType>(
        r#"
        INSERT INTO edge_types (id, project, name, stroke_color, stroke_width, line_dash, metadata)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, project, name, stroke_color, stroke_width, line_dash, metadata
        "#,
    )
    .bind(generate_record_id())
    .bind(project_id)
    .bind(name)
    .bind(&prototype.stroke_color)
    .bind(prototype.stroke_width)
    .bind(Vec::<u8>::new())
    .bind(&prototype.metadata)
    .fetch_one(pool)
    .await
}

pub async fn node_types_for_project(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<Vec<NodeType>, sqlx::Error> {
    sqlx::query_as::<_, NodeType>(
        r#"
        SELECT id, project, name, fill_color, stroke_color, stroke_width, shape, metadata
        FROM node_types
        WHERE project = ?
        ORDER BY id
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn edge_types_for_project(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<Vec<EdgeType>, sqlx::Error> {
    sqlx::query_as::<_, EdgeType>(
        r#"
        SELECT id, project, name, stroke_color, stroke_width, line_dash, metadata
        FROM edge_types
        WHERE project = ?
        ORDER BY id
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

// Nodes

pub async fn nodes_for_project(pool: &SqlitePool, project_id: &str) -> Result<Vec<Node>, sqlx::Error> {
    sqlx::query_as::<_, Node>(&format!(
        "SELECT {} FROM nodes WHERE project = ? ORDER BY id",
        NODE_COLUMNS
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Insert a node. Returns `None` when its type is not a node type of the project.
pub async fn insert_node(
    pool: &SqlitePool,
    project_id: &str,
    node: &NewNode,
) -> Result<Option<Node>, sqlx::Error> {
    let now = now_timestamp();
    sqlx::query_as::<_, Node>(&format!(
        r#"
        INSERT INTO nodes ({columns})
        SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8
        WHERE EXISTS (SELECT 1 FROM node_types WHERE id = ?3 AND project = ?2)
        RETURNING {columns}
        "#,
        columns = NODE_COLUMNS
    ))
    .bind(generate_record_id())
    .bind(project_id)
    .bind(&node.node_type)
    .bind(&node.name)
    .bind(node.x)
    .bind(node.y)
    .bind(node.metadata.as_deref().unwrap_or_default())
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Move a node of the project. Returns the number of rows touched.
pub async fn update_node_position(
    pool: &SqlitePool,
    project_id: &str,
    position: &NodePosition,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE nodes SET x = ?, y = ?, updated = ? WHERE id = ? AND project = ?",
    )
    .bind(position.x)
    .bind(position.y)
    .bind(now_timestamp())
    .bind(&position.id)
    .bind(project_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Delete a node of the project; incident edges go with it through the schema
pub async fn delete_node(pool: &SqlitePool, project_id: &str, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM nodes WHERE id = ? AND project = ?")
        .bind(id)
        .bind(project_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// Edges

pub async fn edges_for_project(pool: &SqlitePool, project_id: &str) -> Result<Vec<Edge>, sqlx::Error> {
    sqlx::query_as::<_, Edge>(&format!(
        "SELECT {} FROM edges WHERE project = ? ORDER BY id",
        EDGE_COLUMNS
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await
}

/// Insert an edge. Returns `None` unless both endpoints and the type belong to the project.
pub async fn insert_edge(
    pool: &SqlitePool,
    project_id: &str,
    edge: &NewEdge,
) -> Result<Option<Edge>, sqlx::Error> {
    let now = now_timestamp();
    sqlx::query_as::<_, Edge>(&format!(
        r#"
        INSERT INTO edges ({columns})
        SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?6
        WHERE EXISTS (SELECT 1 FROM edge_types WHERE id = ?3 AND project = ?2)
          AND EXISTS (SELECT 1 FROM nodes WHERE id = ?4 AND project = ?2)
          AND EXISTS (SELECT 1 FROM nodes WHERE id = ?5 AND project = ?2)
        RETURNING {columns}
        "#,
        columns = EDGE_COLUMNS
    ))
    .bind(generate_record_id())
    .bind(project_id)
    .bind(&edge.edge_type)
    .bind(&edge.start_id)
    .bind(&edge.end_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Apply a partial update to an edge of the project.
///
/// Returns `None` when a new endpoint or type does not belong to the
/// project, otherwise the number of rows touched.
pub async fn update_edge(
    pool: &SqlitePool,
    project_id: &str,
    update: &EdgeUpdate,
) -> Result<Option<u64>, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE edges
        SET "type" = COALESCE(?1, "type"),
            start_id = COALESCE(?2, start_id),
            end_id = COALESCE(?3, end_id),
            updated = ?4
        WHERE id = ?5 AND project = ?6
          AND (?1 IS NULL OR EXISTS (SELECT 1 FROM edge_types WHERE id = ?1 AND project = ?6))
          AND (?2 IS NULL OR EXISTS (SELECT 1 FROM nodes WHERE id = ?2 AND project = ?6))
          AND (?3 IS NULL OR EXISTS (SELECT 1 FROM nodes WHERE id = ?3 AND project = ?6))
        "#,
    )
    .bind(&update.edge_type)
    .bind(&update.start_id)
    .bind(&update.end_id)
    .bind(now_timestamp())
    .bind(&update.id)
    .bind(project_id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(Some(result.rows_affected()));
    }

    // Distinguish an unknown edge from a rejected reference
    let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM edges WHERE id = ? AND project = ?")
        .bind(&update.id)
        .bind(project_id)
        .fetch_optional(pool)
        .await?;
    Ok(if exists.is_some() { None } else { Some(0) })
}

pub async fn delete_edge(pool: &SqlitePool, project_id: &str, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM edges WHERE id = ? AND project = ?")
        .bind(id)
        .bind(project_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
