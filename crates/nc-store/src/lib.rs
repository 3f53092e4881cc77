//! nc-store: file-backed graph persistence and version snapshots.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::content_hash;
pub use store::GraphStore;
pub use types::*;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Graph not found: {graph_id}")]
    GraphNotFound { graph_id: String },

    #[error("Version not found: {version_id} of {graph_id}")]
    VersionNotFound { graph_id: String, version_id: String },

    #[error("Stored graph {graph_id} is corrupt: {reason}")]
    Corrupt { graph_id: String, reason: String },

    #[error("Invalid graph id {graph_id:?}: use letters, digits, '-' or '_'")]
    InvalidGraphId { graph_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
