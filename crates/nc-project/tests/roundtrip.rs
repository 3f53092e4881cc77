use std::sync::Arc;

use nc_blocks::{BlockRegistry, Params};
use nc_core::{NodeId, Position};
use nc_graph::ArchitectureGraph;
use nc_project::{
    GraphMetadata, deserialize, load, parse_json, save, serialize, serialize_with_metadata,
    to_json_string,
};
use proptest::prelude::*;
use serde_json::json;

const TYPES: [&str; 8] = [
    "linear",
    "relu",
    "add",
    "lstm",
    "multihead_attention",
    "scale",
    "identity",
    "mse_loss",
];

fn registry() -> Arc<BlockRegistry> {
    BlockRegistry::shared()
}

/// Build a graph whose edges are all well-formed (declared ports, live endpoints).
fn build_graph(
    nodes: &[(usize, i32, i32, i64)],
    wires: &[(usize, usize, usize, usize)],
) -> ArchitectureGraph {
    let mut graph = ArchitectureGraph::new(registry());
    let mut ids = Vec::new();
    for &(kind, x, y, knob) in nodes {
        let type_name = TYPES[kind % TYPES.len()];
        let id = graph
            .add_node(type_name, Position::new(x as f64 / 4.0, y as f64 / 4.0))
            .unwrap();
        let mut edit = Params::new();
        edit.insert("knob".into(), json!(knob));
        graph.update_node_params(&id, edit).unwrap();
        ids.push(id);
    }
    for &(s, sp, t, tp) in wires {
        let source = &ids[s % ids.len()];
        let target = &ids[t % ids.len()];
        let outputs = graph.block_of(source).unwrap().outputs.clone();
        let inputs = graph.block_of(target).unwrap().inputs.clone();
        if outputs.is_empty() || inputs.is_empty() {
            continue;
        }
        let out = outputs[sp % outputs.len()].id.clone();
        let inp = inputs[tp % inputs.len()].id.clone();
        graph.connect(source, &out, target, &inp).unwrap();
    }
    graph
}

fn same_graph(a: &ArchitectureGraph, b: &ArchitectureGraph) {
    assert_eq!(a.nodes().len(), b.nodes().len());
    for (x, y) in a.nodes().iter().zip(b.nodes()) {
        assert_eq!(x.id, y.id);
        assert_eq!(x.block_type, y.block_type);
        assert_eq!(x.category, y.category);
        assert_eq!(x.params, y.params);
        assert_eq!(x.position, y.position);
        assert_eq!(x.label, y.label);
    }
    let endpoints = |g: &ArchitectureGraph| {
        g.edges()
            .iter()
            .map(|e| {
                (
                    e.id.clone(),
                    e.source.clone(),
                    e.source_port.clone(),
                    e.target.clone(),
                    e.target_port.clone(),
                    e.is_valid(),
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(endpoints(a), endpoints(b));
}

#[test]
fn roundtrip_json_file() {
    let graph = build_graph(
        &[(0, 0, 0, 1), (1, 0, 400, 2), (4, 100, 800, 3)],
        &[(0, 0, 1, 0), (1, 0, 2, 0), (1, 0, 2, 1), (1, 0, 2, 2)],
    );
    let wire = serialize_with_metadata(
        &graph,
        GraphMetadata {
            name: Some("demo".into()),
            description: None,
            framework: Some("jax".into()),
        },
    );

    let path = std::env::temp_dir().join("nc_project_roundtrip.json");
    save(&path, &wire).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(loaded, wire);
    assert_eq!(loaded.metadata.as_ref().unwrap().framework.as_deref(), Some("jax"));

    let (restored, report) = deserialize(registry(), &loaded);
    assert!(report.is_clean());
    same_graph(&graph, &restored);
}

#[test]
fn roundtrip_yaml_file() {
    let graph = build_graph(&[(5, 4, 8, 0), (6, 12, 16, -3)], &[(1, 0, 0, 0)]);
    let wire = serialize(&graph);
    let path = std::env::temp_dir().join("nc_project_roundtrip.yaml");
    save(&path, &wire).unwrap();
    assert_eq!(load(&path).unwrap(), wire);
}

#[test]
fn wire_form_has_no_derived_fields() {
    let graph = build_graph(&[(0, 0, 0, 1), (1, 0, 0, 1)], &[(0, 0, 1, 0)]);
    let text = to_json_string(&serialize(&graph)).unwrap();
    assert!(!text.contains("category"));
    assert!(!text.contains("isValid"));
    assert!(!text.contains("verdict"));
}

proptest! {
    #[test]
    fn deserialize_inverts_serialize(
        nodes in proptest::collection::vec((0usize..8, -4000i32..4000, -4000i32..4000, -50i64..50), 1..10),
        wires in proptest::collection::vec((0usize..10, 0usize..3, 0usize..10, 0usize..3), 0..20),
    ) {
        let graph = build_graph(&nodes, &wires);
        let wire = serialize(&graph);
        let (restored, report) = deserialize(registry(), &wire);
        prop_assert_eq!(report.dropped(), 0);
        same_graph(&graph, &restored);

        let reparsed = parse_json(&to_json_string(&wire).unwrap()).unwrap();
        prop_assert_eq!(reparsed, wire);
    }

    #[test]
    fn next_node_never_collides_after_load(count in 1u64..40, gap in 0u64..5) {
        let mut graph = ArchitectureGraph::new(registry());
        for _ in 0..count {
            graph.add_node("relu", Position::ORIGIN).unwrap();
        }
        // Punch holes so the largest id is not the count.
        for i in 1..=gap.min(count - 1) {
            graph.delete_node(&NodeId::new(format!("node_{i}"))).unwrap();
        }
        let (mut restored, _) = deserialize(registry(), &serialize(&graph));
        let fresh = restored.add_node("relu", Position::ORIGIN).unwrap();
        prop_assert!(graph.node(&fresh).is_none());
        prop_assert_eq!(fresh.to_string(), format!("node_{}", count + 1));
    }
}
