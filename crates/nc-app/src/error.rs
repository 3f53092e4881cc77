//! Error types for the nc-app service layer.

use std::path::PathBuf;

use nc_graph::GraphError;

/// Application error type shared by every front end.
///
/// Collaborator failures (generation, export, storage) never touch graph
/// state; the session is left exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Project error: {0}")]
    Project(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("No code provided")]
    NoCode,

    #[error("Code generation failed: {message}")]
    Generation { message: String },

    #[error(
        "{variable} environment variable is not set. Please add your {provider} API key to use {provider} provider."
    )]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("Format not yet implemented: {format}")]
    ExportFormatNotImplemented { format: String },

    #[error("Invalid export file name: {filename}")]
    InvalidFilename { filename: String },

    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Unknown {what}: {value}")]
    UnknownOption { what: &'static str, value: String },

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for nc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<nc_project::ProjectError> for AppError {
    fn from(err: nc_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<nc_store::StoreError> for AppError {
    fn from(err: nc_store::StoreError) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
