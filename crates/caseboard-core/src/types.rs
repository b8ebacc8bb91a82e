//! Core domain types for the caseboard investigation graph.
//!
//! These types are the single accepted shape for board entities: the HTTP or
//! CLI layer is responsible for producing them, and the graph client accepts
//! nothing else. Entity ids are canonically strings; the store and older
//! front-ends sometimes emit them as JSON integers, so all id fields
//! normalize at the deserialization boundary.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize an id that may arrive as a JSON string or integer.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// A node on one board version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardNode {
    #[serde(deserialize_with = "id_string")]
    pub node_id: String,
    pub name: String,
    pub pos_x: f64,
    pub pos_y: f64,
    #[serde(default)]
    pub picture_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// An edge between two nodes on one board version.
///
/// Endpoints are referential only: nothing at this layer prevents an edge
/// from naming a node id that does not exist in the same version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEdge {
    #[serde(deserialize_with = "id_string")]
    pub edge_id: String,
    #[serde(deserialize_with = "id_string")]
    pub node1: String,
    #[serde(deserialize_with = "id_string")]
    pub node2: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The full graph of one board version, as aggregated by the store into a
/// single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardGraph {
    pub version: String,
    #[serde(default)]
    pub nodes: Vec<BoardNode>,
    #[serde(default)]
    pub edges: Vec<BoardEdge>,
}

/// Metadata about one board version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Document shape returned by the `get-versions` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionList {
    #[serde(default)]
    pub versions: Vec<VersionInfo>,
}
