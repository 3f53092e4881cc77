//! Stored record types.

use nc_project::SerializedGraph;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of one saved version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: Uuid,
    pub graph_id: String,
    pub name: String,
    /// RFC 3339, UTC.
    pub created_at: String,
    /// Hex SHA-256 of the stored graph.
    pub content_hash: String,
    pub node_count: usize,
    pub edge_count: usize,
}

/// A saved version together with its graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    #[serde(flatten)]
    pub info: VersionInfo,
    pub graph: SerializedGraph,
}
