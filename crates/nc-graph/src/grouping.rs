//! Super-blocks: named labels over sets of node ids.
//!
//! A super-block references its members weakly. Deleting a member node leaves
//! the id in place; [`GroupingManager::live_members`] filters such ids out.
//! Ungrouping removes only the label.

use nc_core::{IdSequence, NodeId, Position, SuperBlockId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GraphError, GraphResult};
use crate::graph::ArchitectureGraph;

/// Horizontal gap between the left-most member and the group frame.
pub const SUPER_BLOCK_MARGIN_X: f64 = 20.0;
/// Vertical gap between the top-most member and the group frame.
pub const SUPER_BLOCK_MARGIN_Y: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperBlock {
    pub id: SuperBlockId,
    pub name: String,
    pub node_ids: Vec<NodeId>,
    pub position: Position,
    pub is_collapsed: bool,
}

#[derive(Debug, Clone)]
pub struct GroupingManager {
    groups: Vec<SuperBlock>,
    ids: IdSequence,
}

impl Default for GroupingManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupingManager {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            ids: IdSequence::super_blocks(),
        }
    }

    pub fn groups(&self) -> &[SuperBlock] {
        &self.groups
    }

    pub fn get(&self, id: &SuperBlockId) -> Option<&SuperBlock> {
        self.groups.iter().find(|g| &g.id == id)
    }

    /// Group at least two existing nodes under `name`.
    ///
    /// Returns `None` (and changes nothing) when fewer than two of the
    /// distinct ids name nodes present in `graph`.
    pub fn create_super_block(
        &mut self,
        graph: &ArchitectureGraph,
        node_ids: &[NodeId],
        name: impl Into<String>,
    ) -> Option<SuperBlockId> {
        let mut members: Vec<NodeId> = Vec::with_capacity(node_ids.len());
        for id in node_ids {
            if !members.contains(id) {
                members.push(id.clone());
            }
        }

        let positions: Vec<Position> = members
            .iter()
            .filter_map(|id| graph.node(id).map(|n| n.position))
            .collect();
        if positions.len() < 2 {
            warn!(requested = node_ids.len(), live = positions.len(), "super-block needs at least two nodes");
            return None;
        }

        let min_x = positions.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = positions.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let id: SuperBlockId = match self.ids.next_id() {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "super-block ids exhausted");
                return None;
            }
        };
        debug!(group = %id, members = members.len(), "created super-block");
        self.groups.push(SuperBlock {
            id: id.clone(),
            name: name.into(),
            node_ids: members,
            position: Position::new(min_x - SUPER_BLOCK_MARGIN_X, min_y - SUPER_BLOCK_MARGIN_Y),
            is_collapsed: false,
        });
        Some(id)
    }

    /// Remove the label; member nodes and edges are untouched.
    pub fn ungroup_super_block(&mut self, id: &SuperBlockId) -> GraphResult<SuperBlock> {
        let index = self.index_of(id)?;
        debug!(group = %id, "ungrouped super-block");
        Ok(self.groups.remove(index))
    }

    pub fn rename(&mut self, id: &SuperBlockId, name: impl Into<String>) -> GraphResult<()> {
        let index = self.index_of(id)?;
        self.groups[index].name = name.into();
        Ok(())
    }

    /// Flip the collapsed flag, returning the new state.
    pub fn toggle_collapsed(&mut self, id: &SuperBlockId) -> GraphResult<bool> {
        let index = self.index_of(id)?;
        let group = &mut self.groups[index];
        group.is_collapsed = !group.is_collapsed;
        Ok(group.is_collapsed)
    }

    /// Members that still exist in `graph`.
    pub fn live_members<'a>(&'a self, graph: &ArchitectureGraph, id: &SuperBlockId) -> Vec<&'a NodeId> {
        self.get(id)
            .map(|g| g.node_ids.iter().filter(|n| graph.contains_node(n)).collect())
            .unwrap_or_default()
    }

    pub fn groups_containing(&self, node: &NodeId) -> Vec<&SuperBlock> {
        self.groups
            .iter()
            .filter(|g| g.node_ids.contains(node))
            .collect()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    fn index_of(&self, id: &SuperBlockId) -> GraphResult<usize> {
        self.groups
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| GraphError::SuperBlockNotFound { id: id.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(n: usize) -> ArchitectureGraph {
        let mut graph = ArchitectureGraph::default();
        for i in 0..n {
            graph
                .add_node("relu", Position::new(100.0 + i as f64 * 50.0, 200.0 - i as f64 * 30.0))
                .unwrap();
        }
        graph
    }

    fn ids(raw: &[&str]) -> Vec<NodeId> {
        raw.iter().map(|s| NodeId::new(*s)).collect()
    }

    #[test]
    fn single_member_is_a_no_op() {
        let graph = graph_with(2);
        let mut groups = GroupingManager::new();
        assert_eq!(groups.create_super_block(&graph, &ids(&["node_1"]), "solo"), None);
        assert!(groups.groups().is_empty());
    }

    #[test]
    fn pair_creates_one_group() {
        let graph = graph_with(2);
        let mut groups = GroupingManager::new();
        let id = groups
            .create_super_block(&graph, &ids(&["node_1", "node_2"]), "pair")
            .unwrap();
        assert_eq!(groups.groups().len(), 1);
        let group = groups.get(&id).unwrap();
        assert_eq!(group.node_ids, ids(&["node_1", "node_2"]));
        assert_eq!(group.name, "pair");
        assert_eq!(group.position, Position::new(80.0, 130.0));
        assert!(!group.is_collapsed);
    }

    #[test]
    fn repeated_or_missing_ids_do_not_count() {
        let graph = graph_with(2);
        let mut groups = GroupingManager::new();
        assert!(groups
            .create_super_block(&graph, &ids(&["node_1", "node_1"]), "dup")
            .is_none());
        assert!(groups
            .create_super_block(&graph, &ids(&["node_1", "node_9"]), "ghost")
            .is_none());
    }

    #[test]
    fn members_are_weak_references() {
        let mut graph = graph_with(3);
        let mut groups = GroupingManager::new();
        let id = groups
            .create_super_block(&graph, &ids(&["node_1", "node_2", "node_3"]), "trio")
            .unwrap();
        graph.delete_node(&NodeId::new("node_2")).unwrap();

        assert_eq!(groups.get(&id).unwrap().node_ids.len(), 3);
        assert_eq!(groups.live_members(&graph, &id).len(), 2);
        assert_eq!(groups.groups_containing(&NodeId::new("node_2")).len(), 1);
    }

    #[test]
    fn ungroup_leaves_nodes() {
        let graph = graph_with(2);
        let mut groups = GroupingManager::new();
        let id = groups
            .create_super_block(&graph, &ids(&["node_1", "node_2"]), "pair")
            .unwrap();
        assert!(groups.toggle_collapsed(&id).unwrap());
        groups.rename(&id, "renamed").unwrap();
        let removed = groups.ungroup_super_block(&id).unwrap();
        assert_eq!(removed.name, "renamed");
        assert!(groups.groups().is_empty());
        assert_eq!(graph.nodes().len(), 2);
        assert!(matches!(
            groups.ungroup_super_block(&id),
            Err(GraphError::SuperBlockNotFound { .. })
        ));
    }
}
