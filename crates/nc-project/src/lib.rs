//! nc-project: the graph file format, codec and template library.
//!
//! Documents are checked structurally (top-level `nodes` and `edges` arrays)
//! before decoding, so a malformed file never reaches the graph. Integrity
//! problems inside a well-formed document are repaired by the codec.

pub mod codec;
pub mod schema;
pub mod templates;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use nc_blocks::BlockRegistry;
use nc_graph::ArchitectureGraph;
use serde_json::Value;

pub use codec::{LoadDiagnostic, LoadReport, deserialize, serialize, serialize_with_metadata};
pub use schema::*;
pub use templates::{ArchitectureTemplate, builtin_templates, find_template, template_categories};
pub use validate::{StructuralError, check_structure};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Structurally invalid graph: {0}")]
    Structural(#[from] StructuralError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encodings of a graph document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml`/`.yml` are YAML; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

pub fn parse_json(text: &str) -> ProjectResult<SerializedGraph> {
    let document: Value = serde_json::from_str(text)?;
    decode(document)
}

pub fn parse_yaml(text: &str) -> ProjectResult<SerializedGraph> {
    let document: Value = serde_yaml::from_str(text)?;
    decode(document)
}

fn decode(document: Value) -> ProjectResult<SerializedGraph> {
    check_structure(&document)?;
    Ok(serde_json::from_value(document)?)
}

pub fn to_json_string(graph: &SerializedGraph) -> ProjectResult<String> {
    Ok(serde_json::to_string_pretty(graph)?)
}

pub fn to_yaml_string(graph: &SerializedGraph) -> ProjectResult<String> {
    Ok(serde_yaml::to_string(graph)?)
}

pub fn load_json(path: &Path) -> ProjectResult<SerializedGraph> {
    let content = std::fs::read_to_string(path)?;
    parse_json(&content)
}

pub fn save_json(path: &Path, graph: &SerializedGraph) -> ProjectResult<()> {
    std::fs::write(path, to_json_string(graph)?)?;
    Ok(())
}

pub fn load_yaml(path: &Path) -> ProjectResult<SerializedGraph> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content)
}

pub fn save_yaml(path: &Path, graph: &SerializedGraph) -> ProjectResult<()> {
    std::fs::write(path, to_yaml_string(graph)?)?;
    Ok(())
}

/// Load a document, picking the encoding from the file extension.
pub fn load(path: &Path) -> ProjectResult<SerializedGraph> {
    match DocumentFormat::from_path(path) {
        DocumentFormat::Json => load_json(path),
        DocumentFormat::Yaml => load_yaml(path),
    }
}

/// Save a document, picking the encoding from the file extension.
pub fn save(path: &Path, graph: &SerializedGraph) -> ProjectResult<()> {
    match DocumentFormat::from_path(path) {
        DocumentFormat::Json => save_json(path, graph),
        DocumentFormat::Yaml => save_yaml(path, graph),
    }
}

/// Load a document straight into a live graph.
pub fn load_graph(
    path: &Path,
    registry: Arc<BlockRegistry>,
) -> ProjectResult<(ArchitectureGraph, LoadReport)> {
    let wire = load(path)?;
    Ok(deserialize(registry, &wire))
}
