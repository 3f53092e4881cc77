use nc_project::{GraphMetadata, parse_json};
use nc_store::*;

fn sample() -> nc_project::SerializedGraph {
    let mut graph = parse_json(
        r#"{"nodes": [
            {"id": "node_1", "type": "linear", "label": "Linear", "params": {"inFeatures": 4}, "position": {"x": 0, "y": 0}},
            {"id": "node_2", "type": "relu", "label": "ReLU", "params": {}, "position": {"x": 0, "y": 100}}
        ], "edges": [
            {"id": "edge_1", "source": "node_1", "sourceHandle": "out", "target": "node_2", "targetHandle": "in"}
        ]}"#,
    )
    .unwrap();
    graph.metadata = Some(GraphMetadata::for_framework("pytorch"));
    graph
}

fn fresh_store(name: &str) -> GraphStore {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    GraphStore::new(dir).unwrap()
}

#[test]
fn save_load_delete_graph() {
    let store = fresh_store("nc_store_smoke_graph");
    let graph = sample();

    assert!(!store.has_graph("mlp"));
    store.save_graph("mlp", &graph).unwrap();
    assert!(store.has_graph("mlp"));
    assert_eq!(store.load_graph("mlp").unwrap(), graph);
    assert_eq!(store.list_graphs().unwrap(), ["mlp"]);

    store.delete_graph("mlp").unwrap();
    assert!(!store.has_graph("mlp"));
    assert!(matches!(
        store.load_graph("mlp"),
        Err(StoreError::GraphNotFound { .. })
    ));
}

#[test]
fn rejects_path_like_ids() {
    let store = fresh_store("nc_store_smoke_ids");
    assert!(matches!(
        store.save_graph("../escape", &sample()),
        Err(StoreError::InvalidGraphId { .. })
    ));
    assert!(!store.has_graph(""));
}

#[test]
fn versions_are_listed_oldest_first() {
    let store = fresh_store("nc_store_smoke_versions");
    let mut graph = sample();

    let first = store.save_version("mlp", "initial", &graph).unwrap();
    graph.nodes.pop();
    graph.edges.clear();
    let second = store.save_version("mlp", "trimmed", &graph).unwrap();

    assert_ne!(first.content_hash, second.content_hash);
    assert_eq!(first.node_count, 2);
    assert_eq!(second.edge_count, 0);
    assert!(chrono::DateTime::parse_from_rfc3339(&first.created_at).is_ok());

    let listed = store.list_versions("mlp").unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at <= listed[1].created_at);

    let loaded = store.load_version("mlp", &second.id).unwrap();
    assert_eq!(loaded.graph, graph);
    assert_eq!(loaded.info, second);

    assert!(store.list_versions("other").unwrap().is_empty());
}
