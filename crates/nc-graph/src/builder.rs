//! Rehydration of a graph from externally supplied ids.
//!
//! Used when loading a stored graph or restoring a history snapshot. Node
//! categories come from the registry, never from the input. Edges are checked
//! structurally (endpoints and declared ports) and then re-validated like a
//! fresh connection.

use std::collections::HashSet;
use std::sync::Arc;

use nc_blocks::{BlockCategory, BlockRegistry, Params, PortDirection};
use nc_core::{EdgeId, NodeId, Position};

use crate::error::{GraphError, GraphResult};
use crate::graph::{ArchitectureGraph, EdgeInstance, NodeInstance};
use crate::validate::validate_connection;

/// Builder for loading nodes and edges with their existing ids.
///
/// Add every node before the edges that reference them, then call `build()`.
#[derive(Debug)]
pub struct GraphBuilder {
    graph: ArchitectureGraph,
    node_ids: HashSet<NodeId>,
    edge_ids: HashSet<EdgeId>,
}

impl GraphBuilder {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self {
            graph: ArchitectureGraph::new(registry),
            node_ids: HashSet::new(),
            edge_ids: HashSet::new(),
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        self.graph.registry()
    }

    /// Add a node with a known id.
    ///
    /// An unregistered `block_type` is kept as-is with the `layer` category.
    pub fn add_node(
        &mut self,
        id: NodeId,
        block_type: impl Into<String>,
        label: impl Into<String>,
        params: Params,
        position: Position,
    ) -> GraphResult<&NodeInstance> {
        if !self.node_ids.insert(id.clone()) {
            return Err(GraphError::DuplicateNodeId { id });
        }
        let block_type = block_type.into();
        let category = self
            .graph
            .registry()
            .lookup(&block_type)
            .map(|b| b.category)
            .unwrap_or(BlockCategory::Layer);
        self.graph.nodes.push(NodeInstance {
            id,
            block_type,
            label: label.into(),
            category,
            params,
            position,
        });
        Ok(&self.graph.nodes[self.graph.nodes.len() - 1])
    }

    /// Add an edge with a known id.
    ///
    /// Both endpoints must already be present. A non-empty handle must name a
    /// declared port of the endpoint's block type; an empty handle passes the
    /// structural check and is judged by the validator instead.
    pub fn add_edge(
        &mut self,
        id: EdgeId,
        source: NodeId,
        source_port: impl Into<String>,
        target: NodeId,
        target_port: impl Into<String>,
    ) -> GraphResult<&EdgeInstance> {
        if self.edge_ids.contains(&id) {
            return Err(GraphError::DuplicateEdgeId { id });
        }
        let source_port = source_port.into();
        let target_port = target_port.into();
        self.check_endpoint(&source, &source_port, PortDirection::Output)?;
        self.check_endpoint(&target, &target_port, PortDirection::Input)?;

        let verdict = validate_connection(
            self.graph.registry(),
            self.graph.node(&source),
            self.graph.node(&target),
            &source_port,
            &target_port,
        );
        self.edge_ids.insert(id.clone());
        self.graph.edges.push(EdgeInstance {
            id,
            source,
            source_port,
            target,
            target_port,
            verdict,
        });
        Ok(&self.graph.edges[self.graph.edges.len() - 1])
    }

    fn check_endpoint(&self, node: &NodeId, port: &str, direction: PortDirection) -> GraphResult<()> {
        let instance = self
            .graph
            .node(node)
            .ok_or_else(|| GraphError::NodeNotFound { id: node.clone() })?;
        if port.is_empty() {
            return Ok(());
        }
        let declared = self
            .graph
            .registry()
            .lookup(&instance.block_type)
            .is_some_and(|block| match direction {
                PortDirection::Input => block.has_input(port),
                PortDirection::Output => block.has_output(port),
            });
        if declared {
            Ok(())
        } else {
            Err(GraphError::UnknownPort {
                node: node.clone(),
                port: port.to_string(),
                direction,
            })
        }
    }

    /// Finish loading; id sequences continue after the largest loaded number.
    pub fn build(self) -> ArchitectureGraph {
        let mut graph = self.graph;
        graph
            .node_ids
            .reseed(graph.nodes.iter().map(|n| n.id.as_str()));
        graph
            .edge_ids
            .reseed(graph.edges.iter().map(|e| e.id.as_str()));
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ConnectionIssue;

    fn builder() -> GraphBuilder {
        GraphBuilder::new(Arc::new(BlockRegistry::standard()))
    }

    fn add(b: &mut GraphBuilder, id: &str, block_type: &str) -> GraphResult<()> {
        b.add_node(NodeId::new(id), block_type, block_type, Params::new(), Position::ORIGIN)
            .map(|_| ())
    }

    #[test]
    fn unknown_type_falls_back_to_layer() {
        let mut b = builder();
        add(&mut b, "node_1", "softmax").unwrap();
        add(&mut b, "node_2", "hyper_layer").unwrap();
        let g = b.build();
        assert_eq!(g.nodes()[0].category, BlockCategory::Activation);
        assert_eq!(g.nodes()[1].category, BlockCategory::Layer);
        assert_eq!(g.nodes()[1].block_type, "hyper_layer");
    }

    #[test]
    fn rejects_duplicates_and_dangling_edges() {
        let mut b = builder();
        add(&mut b, "node_1", "linear").unwrap();
        add(&mut b, "node_2", "relu").unwrap();
        assert!(matches!(
            add(&mut b, "node_1", "relu"),
            Err(GraphError::DuplicateNodeId { .. })
        ));

        b.add_edge("edge_1".into(), "node_1".into(), "out", "node_2".into(), "in")
            .unwrap();
        assert!(matches!(
            b.add_edge("edge_1".into(), "node_1".into(), "out", "node_2".into(), "in"),
            Err(GraphError::DuplicateEdgeId { .. })
        ));
        assert!(matches!(
            b.add_edge("edge_2".into(), "node_1".into(), "out", "node_9".into(), "in"),
            Err(GraphError::NodeNotFound { .. })
        ));
        assert!(matches!(
            b.add_edge("edge_3".into(), "node_1".into(), "logits", "node_2".into(), "in"),
            Err(GraphError::UnknownPort {
                direction: PortDirection::Output,
                ..
            })
        ));
        assert_eq!(b.build().edges().len(), 1);
    }

    #[test]
    fn surviving_edges_are_revalidated() {
        let mut b = builder();
        add(&mut b, "node_1", "linear").unwrap();
        add(&mut b, "node_2", "scale").unwrap();
        let edge = b
            .add_edge("edge_1".into(), "node_1".into(), "out", "node_2".into(), "factor")
            .unwrap();
        assert_eq!(
            edge.verdict.issue(),
            Some(ConnectionIssue::TypeMismatch {
                source: nc_blocks::DataKind::Tensor,
                target: nc_blocks::DataKind::Scalar,
            })
        );
        let edge = b
            .add_edge("edge_2".into(), "node_1".into(), "", "node_2".into(), "x")
            .unwrap();
        assert_eq!(edge.verdict.issue(), Some(ConnectionIssue::InvalidPort));
    }

    #[test]
    fn build_reseeds_sequences() {
        let mut b = builder();
        for i in [3, 7, 1] {
            add(&mut b, &format!("node_{i}"), "relu").unwrap();
        }
        b.add_edge("edge_12".into(), "node_3".into(), "out", "node_7".into(), "in")
            .unwrap();
        let mut g = b.build();
        assert_eq!(g.add_node("relu", Position::ORIGIN).unwrap(), "node_8");
        let a = NodeId::new("node_1");
        let c = NodeId::new("node_8");
        assert_eq!(g.connect(&a, "out", &c, "in").unwrap().id, "edge_13");
    }
}
