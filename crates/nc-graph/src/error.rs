//! Graph error types.

use nc_core::{CoreError, EdgeId, NodeId, SuperBlockId};
use nc_blocks::PortDirection;
use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Rejected graph operations.
///
/// Incompatible connections are not errors; they are stored on the edge as a
/// [`crate::ConnectionVerdict`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown block type: {type_name}")]
    UnknownBlockType { type_name: String },

    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("Edge not found: {id}")]
    EdgeNotFound { id: EdgeId },

    #[error("Duplicate node id: {id}")]
    DuplicateNodeId { id: NodeId },

    #[error("Duplicate edge id: {id}")]
    DuplicateEdgeId { id: EdgeId },

    /// An edge handle does not name a declared port of the node's block type.
    #[error("Node {node} has no {direction:?} port '{port}'")]
    UnknownPort {
        node: NodeId,
        port: String,
        direction: PortDirection,
    },

    #[error("Super-block not found: {id}")]
    SuperBlockNotFound { id: SuperBlockId },

    #[error(transparent)]
    Core(#[from] CoreError),
}
