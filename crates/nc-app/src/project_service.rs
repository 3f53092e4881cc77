//! Document loading, saving and version snapshots.

use std::path::Path;

use nc_project::{LoadReport, SerializedGraph};
use nc_store::{GraphStore, VersionInfo};

use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};
use crate::session::Session;

/// Counts reported by `validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub invalid_edges: usize,
    pub has_cycle: bool,
}

/// Open a document into a fresh session.
pub fn open_document(path: &Path, config: SessionConfig) -> AppResult<(Session, LoadReport)> {
    let wire = nc_project::load(path)?;
    let mut session = Session::new(config);
    let report = session.load_graph(&wire);
    Ok((session, report))
}

pub fn save_document(path: &Path, session: &Session) -> AppResult<()> {
    nc_project::save(path, &session.serialize_graph())?;
    Ok(())
}

pub fn summarize(session: &Session) -> GraphSummary {
    let graph = session.graph();
    GraphSummary {
        node_count: graph.nodes().len(),
        edge_count: graph.edges().len(),
        invalid_edges: graph.edges().iter().filter(|e| !e.is_valid()).count(),
        has_cycle: graph.has_cycle(),
    }
}

/// Store key for a document: its file stem with unsupported characters
/// replaced by `_`.
pub fn graph_id_for(path: &Path) -> AppResult<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Project(format!("no file name in {}", path.display())))?;
    Ok(stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect())
}

/// Record a named version of the document in the store beside it.
pub fn snapshot_document(path: &Path, name: &str) -> AppResult<VersionInfo> {
    let wire = nc_project::load(path)?;
    snapshot_graph(path, name, &wire)
}

pub fn snapshot_graph(path: &Path, name: &str, graph: &SerializedGraph) -> AppResult<VersionInfo> {
    let store = GraphStore::for_document(path)?;
    let graph_id = graph_id_for(path)?;
    store.save_graph(&graph_id, graph)?;
    Ok(store.save_version(&graph_id, name, graph)?)
}

pub fn list_document_versions(path: &Path) -> AppResult<Vec<VersionInfo>> {
    let store = GraphStore::for_document(path)?;
    let graph_id = graph_id_for(path)?;
    if !store.has_graph(&graph_id) {
        return Ok(Vec::new());
    }
    Ok(store.list_versions(&graph_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_id_sanitizes_stem() {
        assert_eq!(graph_id_for(Path::new("/tmp/my model.v2.json")).unwrap(), "my_model_v2");
        assert!(graph_id_for(Path::new("/")).is_err());
    }
}
