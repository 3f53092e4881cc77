//! Wire/storage form of an architecture graph.
//!
//! A minimal projection of the live graph: node categories, selection and
//! edge verdicts are not stored and are re-derived on load.

use nc_blocks::Params;
use nc_core::{EdgeId, NodeId, Position};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub nodes: Vec<SerializedNode>,
    pub edges: Vec<SerializedEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,
}

impl SerializedGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedEdge {
    pub id: EdgeId,
    pub source: NodeId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_handle: String,
    pub target: NodeId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_handle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

impl GraphMetadata {
    pub fn for_framework(framework: impl Into<String>) -> Self {
        Self {
            framework: Some(framework.into()),
            ..Self::default()
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
