// common/src/models/graph.rs
use serde::{Deserialize, Serialize};

/// A signed-in account, owned by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Capability bits of a project. Bits are independent; a missing bit denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct Permissions(pub u32);

impl Permissions {
    pub const EDIT_CONNECTION: Permissions = Permissions(1);
    pub const EDIT_NODES: Permissions = Permissions(2);
    pub const MANAGE_PROJECT: Permissions = Permissions(4);
    pub const ALL: Permissions = Permissions(1 | 2 | 4);
    pub const NONE: Permissions = Permissions(0);

    pub fn contains(self, other: Permissions) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::ALL
    }
}

/// Top-level tenant aggregate. `owner` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Project {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub created: String,
    pub updated: String,
    pub permissions: Permissions,
}

impl Project {
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.owner == user.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct NodeType {
    pub id: String,
    pub project: String,
    pub name: String,
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width: u8,
    pub shape: u8,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct EdgeType {
    pub id: String,
    pub project: String,
    pub name: String,
    pub stroke_color: String,
    pub stroke_width: u8,
    /// JSON dash pattern bytes; base64 on the wire, `null` when unset
    #[serde(with = "base64_bytes")]
    pub line_dash: Vec<u8>,
    pub metadata: String,
}

/// Byte fields travel as standard base64 strings. Empty bytes map to `null`
/// so clients can skip decoding an unset value.
mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if bytes.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(&base64::encode(bytes))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => base64::decode(encoded).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// Global catalog row cloned into every new project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DefaultNodeType {
    pub id: String,
    pub name: String,
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width: u8,
    pub shape: u8,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DefaultEdgeType {
    pub id: String,
    pub name: String,
    pub stroke_color: String,
    pub stroke_width: u8,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Node {
    pub id: String,
    pub project: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub node_type: String,
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub metadata: String,
    pub created: String,
    pub updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Edge {
    pub id: String,
    pub project: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub edge_type: String,
    pub start_id: String,
    pub end_id: String,
    pub created: String,
    pub updated: String,
}

/// Request element of `create-nodes`.
///
/// `temp_id` is write-only: it is never stored, only echoed back. Older
/// clients send their placeholder as `id` instead.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNode {
    pub x: i64,
    pub y: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub temp_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl NewNode {
    pub fn client_ref(&self) -> Option<String> {
        self.temp_id.clone().or_else(|| self.id.clone())
    }
}

/// Response element of `create-nodes`; `id` is the authoritative server id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedNode {
    pub id: String,
    pub x: i64,
    pub y: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub metadata: String,
    pub temp_id: Option<String>,
}

/// Position-only view of a node, used by `update-nodes` and `save`
#[derive(Debug, Clone, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEdge {
    pub start_id: String,
    pub end_id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    #[serde(default)]
    pub temp_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl NewEdge {
    pub fn client_ref(&self) -> Option<String> {
        self.temp_id.clone().or_else(|| self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEdge {
    pub id: String,
    pub start_id: String,
    pub end_id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub temp_id: Option<String>,
}

/// Partial edge update; absent fields keep their stored value
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeUpdate {
    pub id: String,
    #[serde(rename = "type", default)]
    pub edge_type: Option<String>,
    #[serde(default)]
    pub start_id: Option<String>,
    #[serde(default)]
    pub end_id: Option<String>,
}

/// Whole-graph payload of the snapshot stream
#[derive(Debug, Clone, Serialize)]
pub struct GraphSignals {
    pub project: Project,
    #[serde(rename = "nodeTypes")]
    pub node_types: Vec<NodeType>,
    #[serde(rename = "edgeTypes")]
    pub edge_types: Vec<EdgeType>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(rename = "currentedgetype", skip_serializing_if = "Option::is_none")]
    pub current_edge_type: Option<String>,
}

/// Body of `save`. Only node positions are honoured.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub nodes: Vec<NodePosition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_bits_are_independent() {
        let edit_nodes_only = Permissions(2);
        assert!(edit_nodes_only.contains(Permissions::EDIT_NODES));
        assert!(!edit_nodes_only.contains(Permissions::EDIT_CONNECTION));
        assert!(!edit_nodes_only.contains(Permissions::MANAGE_PROJECT));
        assert!(Permissions::ALL.contains(Permissions::MANAGE_PROJECT));
        assert!(!Permissions::ALL.contains(Permissions::NONE));
    }

    #[test]
    fn test_new_node_prefers_temp_id_over_client_id() {
        let node: NewNode = serde_json::from_str(
            r#"{"x":1,"y":2,"name":"a","type":"nt","temp_id":"t1","id":"client"}"#,
        )
        .unwrap();
        assert_eq!(node.client_ref().as_deref(), Some("t1"));

        let legacy: NewNode =
            serde_json::from_str(r#"{"x":1,"y":2,"name":"a","type":"nt","id":"client"}"#).unwrap();
        assert_eq!(legacy.client_ref().as_deref(), Some("client"));
        assert_eq!(legacy.metadata, None);
    }

    #[test]
    fn test_save_request_ignores_everything_but_positions() {
        let body = r#"{
            "project": {"id": "p"},
            "nodeTypes": [],
            "nodes": [{"id": "n1", "x": 5, "y": -7, "name": "renamed", "type": "other"}]
        }"#;
        let save: SaveRequest = serde_json::from_str(body).unwrap();
        assert_eq!(save.nodes.len(), 1);
        assert_eq!((save.nodes[0].x, save.nodes[0].y), (5, -7));
    }

    #[test]
    fn test_graph_signals_field_names() {
        let signals = GraphSignals {
            project: Project {
                id: "p".into(),
                owner: "u".into(),
                name: "Demo".into(),
                created: String::new(),
                updated: String::new(),
                permissions: Permissions::ALL,
            },
            node_types: vec![],
            edge_types: vec![],
            nodes: vec![],
            edges: vec![],
            current_edge_type: None,
        };
        let value = serde_json::to_value(&signals).unwrap();
        assert!(value.get("nodeTypes").is_some());
        assert!(value.get("edgeTypes").is_some());
        assert!(value.get("currentedgetype").is_none());
        assert_eq!(value["project"]["permissions"], 7);
    }

    fn edge_type(line_dash: &[u8]) -> EdgeType {
        EdgeType {
            id: "et".into(),
            project: "p".into(),
            name: "Knows".into(),
            stroke_color: "#000000".into(),
            stroke_width: 1,
            line_dash: line_dash.to_vec(),
            metadata: String::new(),
        }
    }

    #[test]
    fn test_line_dash_is_base64_text() {
        let value = serde_json::to_value(edge_type(b"[5,5]")).unwrap();
        assert_eq!(value["line_dash"], "WzUsNV0=");

        let parsed: EdgeType = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.line_dash, b"[5,5]");
    }

    #[test]
    fn test_empty_line_dash_is_null() {
        let value = serde_json::to_value(edge_type(b"")).unwrap();
        assert!(value["line_dash"].is_null());

        let parsed: EdgeType = serde_json::from_value(value).unwrap();
        assert!(parsed.line_dash.is_empty());
    }
}
