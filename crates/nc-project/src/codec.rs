//! Conversion between the live graph and its wire form.
//!
//! Loading repairs instead of failing: unknown block types fall back to the
//! `layer` category, and duplicate or dangling records are dropped. Every
//! repair is recorded in a [`LoadReport`] and logged.

use core::fmt;
use std::sync::Arc;

use nc_blocks::{BlockRegistry, PortDirection};
use nc_core::{EdgeId, NodeId};
use nc_graph::{ArchitectureGraph, ConnectionIssue, GraphBuilder, GraphError};
use tracing::{debug, warn};

use crate::schema::{GraphMetadata, SerializedEdge, SerializedGraph, SerializedNode};

/// One repair applied while loading.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadDiagnostic {
    /// Node kept with the `layer` category.
    UnknownBlockType { node: NodeId, block_type: String },
    /// Later node with an already-seen id dropped.
    DuplicateNode { node: NodeId },
    /// Later edge with an already-seen id dropped.
    DuplicateEdge { edge: EdgeId },
    /// Edge dropped because an endpoint node is absent.
    DanglingEdge { edge: EdgeId, missing: NodeId },
    /// Edge dropped because a handle names no declared port.
    UnknownPort {
        edge: EdgeId,
        node: NodeId,
        port: String,
        direction: PortDirection,
    },
    /// Edge kept but tagged invalid by the connection validator.
    InvalidConnection { edge: EdgeId, issue: ConnectionIssue },
}

impl LoadDiagnostic {
    /// Whether the record was removed (as opposed to kept and tagged).
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            LoadDiagnostic::DuplicateNode { .. }
                | LoadDiagnostic::DuplicateEdge { .. }
                | LoadDiagnostic::DanglingEdge { .. }
                | LoadDiagnostic::UnknownPort { .. }
        )
    }
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadDiagnostic::UnknownBlockType { node, block_type } => {
                write!(f, "node {node}: unknown block type '{block_type}', using category layer")
            }
            LoadDiagnostic::DuplicateNode { node } => write!(f, "node {node}: duplicate id dropped"),
            LoadDiagnostic::DuplicateEdge { edge } => write!(f, "edge {edge}: duplicate id dropped"),
            LoadDiagnostic::DanglingEdge { edge, missing } => {
                write!(f, "edge {edge}: references missing node {missing}, dropped")
            }
            LoadDiagnostic::UnknownPort {
                edge,
                node,
                port,
                direction,
            } => {
                let side = match direction {
                    PortDirection::Input => "input",
                    PortDirection::Output => "output",
                };
                write!(f, "edge {edge}: node {node} has no {side} '{port}', dropped")
            }
            LoadDiagnostic::InvalidConnection { edge, issue } => {
                write!(f, "edge {edge}: {issue}")
            }
        }
    }
}

/// Repairs applied by [`deserialize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_drop()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadDiagnostic> {
        self.diagnostics.iter()
    }

    fn record(&mut self, diagnostic: LoadDiagnostic) {
        warn!(%diagnostic, "graph load repair");
        self.diagnostics.push(diagnostic);
    }
}

/// Project the live graph to its wire form.
pub fn serialize(graph: &ArchitectureGraph) -> SerializedGraph {
    let nodes = graph
        .nodes()
        .iter()
        .map(|n| SerializedNode {
            id: n.id.clone(),
            block_type: n.block_type.clone(),
            label: n.label.clone(),
            params: n.params.clone(),
            position: n.position,
        })
        .collect();
    let edges = graph
        .edges()
        .iter()
        .map(|e| SerializedEdge {
            id: e.id.clone(),
            source: e.source.clone(),
            source_handle: e.source_port.clone(),
            target: e.target.clone(),
            target_handle: e.target_port.clone(),
        })
        .collect();
    SerializedGraph {
        nodes,
        edges,
        metadata: None,
    }
}

/// Project the live graph and attach `metadata`.
pub fn serialize_with_metadata(graph: &ArchitectureGraph, metadata: GraphMetadata) -> SerializedGraph {
    SerializedGraph {
        metadata: Some(metadata),
        ..serialize(graph)
    }
}

/// Rebuild a live graph from its wire form, repairing integrity problems.
///
/// Never fails: structural rejection happens earlier, when the document is
/// parsed.
pub fn deserialize(registry: Arc<BlockRegistry>, wire: &SerializedGraph) -> (ArchitectureGraph, LoadReport) {
    let mut builder = GraphBuilder::new(registry);
    let mut report = LoadReport::default();

    for node in &wire.nodes {
        let known = builder.registry().contains(&node.block_type);
        let added = builder.add_node(
            node.id.clone(),
            node.block_type.clone(),
            node.label.clone(),
            node.params.clone(),
            node.position,
        );
        match added {
            Ok(_) if !known => report.record(LoadDiagnostic::UnknownBlockType {
                node: node.id.clone(),
                block_type: node.block_type.clone(),
            }),
            Ok(_) => {}
            Err(GraphError::DuplicateNodeId { id }) => {
                report.record(LoadDiagnostic::DuplicateNode { node: id })
            }
            Err(other) => warn!(node = %node.id, error = %other, "unexpected node load failure"),
        }
    }

    for edge in &wire.edges {
        let added = builder
            .add_edge(
                edge.id.clone(),
                edge.source.clone(),
                edge.source_handle.clone(),
                edge.target.clone(),
                edge.target_handle.clone(),
            )
            .map(|e| e.verdict.issue());
        match added {
            Ok(None) => {}
            Ok(Some(issue)) => report.record(LoadDiagnostic::InvalidConnection {
                edge: edge.id.clone(),
                issue,
            }),
            Err(GraphError::DuplicateEdgeId { id }) => {
                report.record(LoadDiagnostic::DuplicateEdge { edge: id })
            }
            Err(GraphError::NodeNotFound { id }) => report.record(LoadDiagnostic::DanglingEdge {
                edge: edge.id.clone(),
                missing: id,
            }),
            Err(GraphError::UnknownPort {
                node,
                port,
                direction,
            }) => report.record(LoadDiagnostic::UnknownPort {
                edge: edge.id.clone(),
                node,
                port,
                direction,
            }),
            Err(other) => warn!(edge = %edge.id, error = %other, "unexpected edge load failure"),
        }
    }

    let graph = builder.build();
    debug!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        repairs = report.diagnostics.len(),
        "deserialized graph"
    );
    (graph, report)
}
