//! Integration tests for nc-graph.

use std::sync::Arc;

use nc_blocks::{BlockRegistry, Params};
use nc_core::{NodeId, Position};
use nc_graph::{ArchitectureGraph, GraphBuilder, GroupingManager};
use proptest::prelude::*;

fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::standard())
}

#[test]
fn cascade_delete_keeps_other_endpoint() {
    // A -> B via E; deleting A removes E, B stays.
    let mut graph = ArchitectureGraph::new(registry());
    let a = graph.add_node("linear", Position::new(0.0, 0.0)).unwrap();
    let b = graph.add_node("relu", Position::new(0.0, 100.0)).unwrap();
    let e = graph.connect(&a, "out", &b, "in").unwrap();

    graph.delete_node(&a).unwrap();

    assert!(graph.node(&a).is_none());
    assert!(graph.edge(&e.id).is_none());
    let b_node = graph.node(&b).unwrap();
    assert_eq!(b_node.block_type, "relu");
    assert_eq!(b_node.position, Position::new(0.0, 100.0));
}

#[test]
fn attention_block_wiring() {
    let mut graph = ArchitectureGraph::new(registry());
    let emb = graph.add_node("embedding", Position::ORIGIN).unwrap();
    let attn = graph.add_node("multihead_attention", Position::ORIGIN).unwrap();
    let norm = graph.add_node("layernorm", Position::ORIGIN).unwrap();

    for port in ["query", "key", "value"] {
        assert!(graph.connect(&emb, "out", &attn, port).unwrap().is_valid());
    }
    assert!(graph.connect(&attn, "out", &norm, "in").unwrap().is_valid());
    assert!(graph.connect(&attn, "weights", &norm, "in").unwrap().is_valid());
    assert!(!graph.connect(&attn, "query", &norm, "in").unwrap().is_valid());

    assert_eq!(graph.incoming(&attn).count(), 3);
    assert_eq!(graph.outgoing(&attn).count(), 3);
}

#[test]
fn loaded_graph_never_reissues_ids() {
    let mut builder = GraphBuilder::new(registry());
    for i in 1..=7 {
        builder
            .add_node(
                NodeId::new(format!("node_{i}")),
                "relu",
                "ReLU",
                Params::new(),
                Position::ORIGIN,
            )
            .unwrap();
    }
    let mut graph = builder.build();
    let next = graph.add_node("relu", Position::ORIGIN).unwrap();
    assert_eq!(next, "node_8");
}

#[test]
fn groups_survive_member_deletion() {
    let mut graph = ArchitectureGraph::new(registry());
    let a = graph.add_node("linear", Position::new(10.0, 10.0)).unwrap();
    let b = graph.add_node("relu", Position::new(40.0, 60.0)).unwrap();
    let mut groups = GroupingManager::new();
    let id = groups
        .create_super_block(&graph, &[a.clone(), b.clone()], "block")
        .unwrap();

    graph.delete_node(&a).unwrap();

    assert!(groups.get(&id).is_some());
    assert_eq!(groups.live_members(&graph, &id), vec![&b]);
}

proptest! {
    #[test]
    fn deleting_any_node_leaves_no_dangling_edges(
        n in 2usize..8,
        wires in proptest::collection::vec((0usize..8, 0usize..8), 0..16),
        victim in 0usize..8,
    ) {
        let mut graph = ArchitectureGraph::new(registry());
        let ids: Vec<NodeId> = (0..n)
            .map(|_| graph.add_node("identity", Position::ORIGIN).unwrap())
            .collect();
        for (s, t) in wires {
            graph.connect(&ids[s % n], "out", &ids[t % n], "in").unwrap();
        }

        let victim = &ids[victim % n];
        graph.delete_node(victim).unwrap();

        prop_assert!(graph.node(victim).is_none());
        for edge in graph.edges() {
            prop_assert!(graph.contains_node(&edge.source));
            prop_assert!(graph.contains_node(&edge.target));
        }
        prop_assert_eq!(graph.nodes().len(), n - 1);
    }
}
