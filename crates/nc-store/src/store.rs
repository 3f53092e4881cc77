//! Graph storage API.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<graph_id>/graph.json
//! <root>/<graph_id>/versions/<uuid>.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use nc_project::SerializedGraph;
use uuid::Uuid;

use crate::hash::content_hash;
use crate::types::{VersionInfo, VersionSnapshot};
use crate::{StoreError, StoreResult};

const GRAPH_FILE: &str = "graph.json";
const VERSIONS_DIR: &str = "versions";

#[derive(Debug, Clone)]
pub struct GraphStore {
    root_dir: PathBuf,
}

impl GraphStore {
    pub fn new(root_dir: PathBuf) -> StoreResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store kept next to a graph document, in `.neurocanvas/graphs`.
    pub fn for_document(document_path: &Path) -> StoreResult<Self> {
        let dir = document_path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath {
                message: "document path has no parent directory".to_string(),
            })?;
        Self::new(dir.join(".neurocanvas").join("graphs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn graph_dir(&self, graph_id: &str) -> StoreResult<PathBuf> {
        let valid = !graph_id.is_empty()
            && graph_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidGraphId {
                graph_id: graph_id.to_string(),
            });
        }
        Ok(self.root_dir.join(graph_id))
    }

    pub fn has_graph(&self, graph_id: &str) -> bool {
        self.graph_dir(graph_id)
            .map(|dir| dir.join(GRAPH_FILE).exists())
            .unwrap_or(false)
    }

    pub fn save_graph(&self, graph_id: &str, graph: &SerializedGraph) -> StoreResult<()> {
        let dir = self.graph_dir(graph_id)?;
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(GRAPH_FILE), serde_json::to_string_pretty(graph)?)?;
        Ok(())
    }

    /// Load a stored graph; the file is structurally re-checked.
    pub fn load_graph(&self, graph_id: &str) -> StoreResult<SerializedGraph> {
        let path = self.graph_dir(graph_id)?.join(GRAPH_FILE);
        if !path.exists() {
            return Err(StoreError::GraphNotFound {
                graph_id: graph_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        let document: serde_json::Value = serde_json::from_str(&content)?;
        if let Err(err) = nc_project::check_structure(&document) {
            return Err(StoreError::Corrupt {
                graph_id: graph_id.to_string(),
                reason: err.to_string(),
            });
        }
        Ok(serde_json::from_value(document)?)
    }

    /// Remove a graph and all its versions. Missing graphs are not an error.
    pub fn delete_graph(&self, graph_id: &str) -> StoreResult<()> {
        let dir = self.graph_dir(graph_id)?;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    /// Ids of graphs with a saved `graph.json`, sorted.
    pub fn list_graphs(&self) -> StoreResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().join(GRAPH_FILE).exists() {
                ids.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Record an immutable named snapshot of `graph`.
    pub fn save_version(
        &self,
        graph_id: &str,
        name: &str,
        graph: &SerializedGraph,
    ) -> StoreResult<VersionInfo> {
        let versions = self.graph_dir(graph_id)?.join(VERSIONS_DIR);
        fs::create_dir_all(&versions)?;

        let info = VersionInfo {
            id: Uuid::new_v4(),
            graph_id: graph_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            content_hash: content_hash(graph)?,
            node_count: graph.nodes.len(),
            edge_count: graph.edges.len(),
        };
        let snapshot = VersionSnapshot {
            info: info.clone(),
            graph: graph.clone(),
        };
        let path = versions.join(format!("{}.json", info.id));
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(info)
    }

    pub fn load_version(&self, graph_id: &str, version_id: &Uuid) -> StoreResult<VersionSnapshot> {
        let path = self
            .graph_dir(graph_id)?
            .join(VERSIONS_DIR)
            .join(format!("{version_id}.json"));
        if !path.exists() {
            return Err(StoreError::VersionNotFound {
                graph_id: graph_id.to_string(),
                version_id: version_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Versions of a graph, oldest first.
    pub fn list_versions(&self, graph_id: &str) -> StoreResult<Vec<VersionInfo>> {
        let dir = self.graph_dir(graph_id)?.join(VERSIONS_DIR);
        let mut versions = Vec::new();
        if !dir.exists() {
            return Ok(versions);
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            if let Ok(snapshot) = serde_json::from_str::<VersionSnapshot>(&content) {
                versions.push(snapshot.info);
            }
        }
        versions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(versions)
    }
}
