//! Application service layer for neurocanvas.
//!
//! Owns the editing [`Session`] (graph, history, super-blocks, generated code)
//! and the boundaries to the code-generation, export and persistence
//! collaborators. Front ends (the CLI, a future canvas UI) talk only to this
//! crate.

pub mod codegen;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod history;
pub mod project_service;
pub mod service;
pub mod session;
pub mod skeleton;

// Re-export key types for convenience
pub use codegen::{
    CodeGenerator, Framework, GenerateRequest, GenerateResponse, LineRange, NodeMapping, Provider,
    build_prompt, clean_code_fences, infer_node_mapping, system_message,
};
pub use config::{DEFAULT_EXPORT_FILENAME, DEFAULT_HISTORY_DEPTH, SessionConfig, credential_for, env_lookup};
pub use error::{AppError, AppResult};
pub use events::{Listener, SessionEvent, SubscriptionId};
pub use export::{ExportFormat, ExportedFile, export, notebook};
pub use history::HistoryManager;
pub use project_service::{
    GraphSummary, graph_id_for, list_document_versions, open_document, save_document, snapshot_document,
    snapshot_graph, summarize,
};
pub use service::{ServiceCall, ServiceGenerator};
pub use session::Session;
pub use skeleton::SkeletonGenerator;
