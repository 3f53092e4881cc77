//! Document round trips and version snapshots on disk.

use std::path::PathBuf;

use nc_app::{
    SessionConfig, list_document_versions, open_document, save_document, snapshot_document, summarize,
};
use nc_core::Position;
use nc_project::find_template;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nc_app_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn template_opens_saves_and_snapshots() {
    let dir = temp_dir("documents");
    let path = dir.join("mlp.json");
    let template = find_template("simple-mlp").unwrap().unwrap();
    nc_project::save(&path, &template.graph).unwrap();

    let (mut session, report) = open_document(&path, SessionConfig::default()).unwrap();
    assert!(report.is_clean());
    let summary = summarize(&session);
    assert_eq!(summary.node_count, template.graph.nodes.len());
    assert_eq!(summary.invalid_edges, 0);
    assert!(!summary.has_cycle);

    session.add_node("dropout", Position::ORIGIN).unwrap();
    save_document(&path, &session).unwrap();

    assert!(list_document_versions(&path).unwrap().is_empty());
    let first = snapshot_document(&path, "baseline").unwrap();
    assert_eq!(first.node_count, template.graph.nodes.len() + 1);
    snapshot_document(&path, "again").unwrap();

    let versions = list_document_versions(&path).unwrap();
    assert_eq!(versions.len(), 2);
    assert!(versions.iter().all(|v| v.content_hash == first.content_hash));
}

#[test]
fn yaml_documents_open_too() {
    let dir = temp_dir("yaml");
    let path = dir.join("graph.yaml");
    std::fs::write(
        &path,
        "nodes:\n  - id: node_1\n    type: relu\n    position: {x: 0, y: 0}\nedges: []\n",
    )
    .unwrap();
    let (session, _) = open_document(&path, SessionConfig::default()).unwrap();
    assert_eq!(session.graph().nodes().len(), 1);
}

#[test]
fn structurally_invalid_document_is_rejected() {
    let dir = temp_dir("invalid");
    let path = dir.join("broken.json");
    std::fs::write(&path, r#"{"nodes": []}"#).unwrap();
    assert!(open_document(&path, SessionConfig::default()).is_err());
}
