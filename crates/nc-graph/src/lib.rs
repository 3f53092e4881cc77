//! nc-graph: the architecture graph model for neurocanvas.
//!
//! Provides:
//! - Node and edge instances over registry-defined block types
//! - The permissive editing model (invalid edges are created and tagged)
//! - The connection validator
//! - A rehydration builder that enforces id uniqueness and reseeds id sequences
//! - Super-block grouping layered over node ids
//!
//! # Example
//!
//! ```
//! use nc_core::Position;
//! use nc_graph::ArchitectureGraph;
//!
//! let mut graph = ArchitectureGraph::default();
//! let a = graph.add_node("linear", Position::new(0.0, 0.0)).unwrap();
//! let b = graph.add_node("relu", Position::new(0.0, 120.0)).unwrap();
//! let edge = graph.connect(&a, "out", &b, "in").unwrap();
//!
//! assert!(edge.is_valid());
//! assert_eq!(graph.edges().len(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod grouping;
pub mod validate;

pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{ArchitectureGraph, Deleted, EdgeInstance, NodeInstance, Selection};
pub use grouping::{GroupingManager, SUPER_BLOCK_MARGIN_X, SUPER_BLOCK_MARGIN_Y, SuperBlock};
pub use validate::{ConnectionIssue, ConnectionVerdict, validate_connection};
