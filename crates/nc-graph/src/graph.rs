//! The live architecture graph.
//!
//! Edits are permissive: a connection is always created and carries the
//! validator's verdict, parameter values are never rejected, and cycles or
//! fan-in are allowed. Node ids are `node_<n>` and edge ids `edge_<n>`, both
//! minted from monotonic sequences.

use std::collections::HashMap;
use std::sync::Arc;

use nc_blocks::{BlockCategory, BlockRegistry, BlockType, ParamIssue, Params};
use nc_core::{EdgeId, IdSequence, NodeId, Position};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::validate::{ConnectionVerdict, validate_connection};

/// A placed, configured occurrence of a block type.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInstance {
    pub id: NodeId,
    pub block_type: String,
    /// Display label; seeded from the block type's label.
    pub label: String,
    /// Copy of the block type's category, recomputed from the registry.
    pub category: BlockCategory,
    pub params: Params,
    pub position: Position,
}

/// A connection between an output port and an input port.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInstance {
    pub id: EdgeId,
    pub source: NodeId,
    pub source_port: String,
    pub target: NodeId,
    pub target_port: String,
    pub verdict: ConnectionVerdict,
}

impl EdgeInstance {
    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }

    pub fn error_message(&self) -> Option<String> {
        self.verdict.message()
    }

    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

/// Current selection; node and edge selection are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

/// What [`ArchitectureGraph::delete_selected`] removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Deleted {
    Node {
        node: NodeInstance,
        edges: Vec<EdgeInstance>,
    },
    Edge(EdgeInstance),
}

/// Mutable set of node instances and the connections between their ports.
#[derive(Debug, Clone)]
pub struct ArchitectureGraph {
    registry: Arc<BlockRegistry>,
    pub(crate) nodes: Vec<NodeInstance>,
    pub(crate) edges: Vec<EdgeInstance>,
    selection: Selection,
    pub(crate) node_ids: IdSequence,
    pub(crate) edge_ids: IdSequence,
}

impl Default for ArchitectureGraph {
    fn default() -> Self {
        Self::new(BlockRegistry::shared())
    }
}

impl ArchitectureGraph {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            edges: Vec::new(),
            selection: Selection::None,
            node_ids: IdSequence::nodes(),
            edge_ids: IdSequence::edges(),
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn registry_handle(&self) -> Arc<BlockRegistry> {
        Arc::clone(&self.registry)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[NodeInstance] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeInstance] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&EdgeInstance> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Block type of a node, if the node exists and its type is registered.
    pub fn block_of(&self, id: &NodeId) -> Option<&BlockType> {
        self.node(id).and_then(|n| self.registry.lookup(&n.block_type))
    }

    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &EdgeInstance> {
        let id = id.clone();
        self.edges.iter().filter(move |e| e.target == id)
    }

    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &EdgeInstance> {
        let id = id.clone();
        self.edges.iter().filter(move |e| e.source == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_node(&self) -> Option<&NodeId> {
        match &self.selection {
            Selection::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn selected_edge(&self) -> Option<&EdgeId> {
        match &self.selection {
            Selection::Edge(id) => Some(id),
            _ => None,
        }
    }

    /// Last node number handed out or loaded.
    pub fn last_node_number(&self) -> u64 {
        self.node_ids.last()
    }

    /// Last edge number handed out or loaded.
    pub fn last_edge_number(&self) -> u64 {
        self.edge_ids.last()
    }

    /// Keep minting after `other`'s numbers as well as this graph's own, so
    /// ids retired by a restore are not handed out again.
    pub fn continue_ids_after(&mut self, other: &ArchitectureGraph) {
        self.node_ids.advance_to(other.node_ids.last());
        self.edge_ids.advance_to(other.edge_ids.last());
    }

    /// Advisory schema check for one node's parameters.
    pub fn param_issues(&self, id: &NodeId) -> GraphResult<Vec<ParamIssue>> {
        let node = self.require_node(id)?;
        Ok(self.registry.validate_params(&node.block_type, &node.params))
    }

    // ------------------------------------------------------------------
    // Node edits
    // ------------------------------------------------------------------

    /// Place a new node of `type_name`, seeded with a copy of its defaults.
    pub fn add_node(&mut self, type_name: &str, position: Position) -> GraphResult<NodeId> {
        let block = self
            .registry
            .lookup(type_name)
            .ok_or_else(|| GraphError::UnknownBlockType {
                type_name: type_name.to_string(),
            })?;
        let id: NodeId = self.node_ids.next_id()?;
        let node = NodeInstance {
            id: id.clone(),
            block_type: block.type_name.clone(),
            label: block.label.clone(),
            category: block.category,
            params: block.instantiate_params(),
            position,
        };
        debug!(node = %id, block_type = type_name, "added node");
        self.nodes.push(node);
        Ok(id)
    }

    /// Merge `partial` into the node's parameters. Values are not validated.
    pub fn update_node_params(&mut self, id: &NodeId, partial: Params) -> GraphResult<()> {
        let node = self.require_node_mut(id)?;
        node.params.extend(partial);
        debug!(node = %id, "updated node params");
        Ok(())
    }

    pub fn rename_node(&mut self, id: &NodeId, label: impl Into<String>) -> GraphResult<()> {
        self.require_node_mut(id)?.label = label.into();
        Ok(())
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) -> GraphResult<()> {
        self.require_node_mut(id)?.position = position;
        Ok(())
    }

    /// Remove a node and every edge touching it. Returns the removed edges.
    pub fn delete_node(&mut self, id: &NodeId) -> GraphResult<Vec<EdgeInstance>> {
        self.remove_node(id).map(|(_, edges)| edges)
    }

    fn remove_node(&mut self, id: &NodeId) -> GraphResult<(NodeInstance, Vec<EdgeInstance>)> {
        let index = self
            .nodes
            .iter()
            .position(|n| &n.id == id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.clone() })?;
        let node = self.nodes.remove(index);

        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.edges).into_iter().partition(|e| e.touches(id));
        self.edges = kept;

        let selection_gone = match &self.selection {
            Selection::Node(selected) => selected == id,
            Selection::Edge(selected) => removed.iter().any(|e| &e.id == selected),
            Selection::None => false,
        };
        if selection_gone {
            self.selection = Selection::None;
        }

        debug!(node = %id, edges = removed.len(), "deleted node");
        Ok((node, removed))
    }

    // ------------------------------------------------------------------
    // Edge edits
    // ------------------------------------------------------------------

    /// Connect two ports. Always creates the edge, tagged with its verdict;
    /// fails only when the edge id sequence is exhausted.
    pub fn connect(
        &mut self,
        source: &NodeId,
        source_port: &str,
        target: &NodeId,
        target_port: &str,
    ) -> GraphResult<EdgeInstance> {
        let verdict = validate_connection(
            &self.registry,
            self.node(source),
            self.node(target),
            source_port,
            target_port,
        );
        let edge = EdgeInstance {
            id: self.edge_ids.next_id()?,
            source: source.clone(),
            source_port: source_port.to_string(),
            target: target.clone(),
            target_port: target_port.to_string(),
            verdict,
        };
        match verdict.message() {
            None => debug!(edge = %edge.id, "connected"),
            Some(reason) => debug!(edge = %edge.id, %reason, "connected with invalid verdict"),
        }
        self.edges.push(edge.clone());
        Ok(edge)
    }

    pub fn delete_edge(&mut self, id: &EdgeId) -> GraphResult<EdgeInstance> {
        let index = self
            .edges
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| GraphError::EdgeNotFound { id: id.clone() })?;
        if self.selected_edge() == Some(id) {
            self.selection = Selection::None;
        }
        debug!(edge = %id, "deleted edge");
        Ok(self.edges.remove(index))
    }

    /// Recompute every edge's verdict. Returns the number of invalid edges.
    pub fn revalidate_edges(&mut self) -> usize {
        let verdicts: Vec<ConnectionVerdict> = self
            .edges
            .iter()
            .map(|e| {
                validate_connection(
                    &self.registry,
                    self.node(&e.source),
                    self.node(&e.target),
                    &e.source_port,
                    &e.target_port,
                )
            })
            .collect();
        for (edge, verdict) in self.edges.iter_mut().zip(verdicts) {
            edge.verdict = verdict;
        }
        self.edges.iter().filter(|e| !e.is_valid()).count()
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select a node (clearing any edge selection); `None` clears everything.
    pub fn select_node(&mut self, id: Option<&NodeId>) -> GraphResult<()> {
        self.selection = match id {
            Some(id) => Selection::Node(self.require_node(id)?.id.clone()),
            None => Selection::None,
        };
        Ok(())
    }

    /// Select an edge (clearing any node selection); `None` clears everything.
    pub fn select_edge(&mut self, id: Option<&EdgeId>) -> GraphResult<()> {
        self.selection = match id {
            Some(id) => {
                let edge = self
                    .edge(id)
                    .ok_or_else(|| GraphError::EdgeNotFound { id: id.clone() })?;
                Selection::Edge(edge.id.clone())
            }
            None => Selection::None,
        };
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Delete the selected node or edge; `None` when nothing is selected.
    pub fn delete_selected(&mut self) -> Option<Deleted> {
        match std::mem::take(&mut self.selection) {
            Selection::None => None,
            Selection::Node(id) => self
                .remove_node(&id)
                .ok()
                .map(|(node, edges)| Deleted::Node { node, edges }),
            Selection::Edge(id) => self.delete_edge(&id).ok().map(Deleted::Edge),
        }
    }

    /// Remove every node, edge and the selection. Id sequences keep counting.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.selection = Selection::None;
        debug!("cleared graph");
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    /// Nodes ordered so every edge points forward; `None` if there is a cycle.
    pub fn topological_order(&self) -> Option<Vec<NodeId>> {
        let dag = self.to_petgraph();
        let order = toposort(&dag, None).ok()?;
        Some(order.into_iter().map(|ix| self.nodes[dag[ix]].id.clone()).collect())
    }

    /// Whether the edges form at least one directed cycle. Cycles are allowed.
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.to_petgraph())
    }

    /// Node weights are indices into `self.nodes`.
    fn to_petgraph(&self) -> DiGraph<usize, ()> {
        let mut dag = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut indices: HashMap<&NodeId, NodeIndex> = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            indices.insert(&node.id, dag.add_node(i));
        }
        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (indices.get(&edge.source), indices.get(&edge.target)) {
                dag.add_edge(a, b, ());
            }
        }
        dag
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn require_node(&self, id: &NodeId) -> GraphResult<&NodeInstance> {
        self.node(id).ok_or_else(|| GraphError::NodeNotFound { id: id.clone() })
    }

    fn require_node_mut(&mut self, id: &NodeId) -> GraphResult<&mut NodeInstance> {
        self.nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.clone() })
    }
}
