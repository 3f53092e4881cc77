//! nc-blocks: the block-type registry for neurocanvas.
//!
//! Provides:
//! - Block types with their port contracts and parameter schemas
//! - Port data kinds and their compatibility rule
//! - The standard catalog of layers, activations, operations and attention blocks
//!
//! # Example
//!
//! ```
//! use nc_blocks::{BlockCategory, BlockRegistry, DataKind};
//!
//! let registry = BlockRegistry::standard();
//! let linear = registry.lookup("linear").unwrap();
//! assert_eq!(linear.category, BlockCategory::Layer);
//! assert_eq!(linear.input("in").unwrap().kind, DataKind::Tensor);
//! ```

pub mod block;
pub mod catalog;
pub mod error;
pub mod params;
pub mod port;
pub mod registry;

pub use block::{BlockCategory, BlockType};
pub use error::{RegistryError, RegistryResult};
pub use params::{ParamIssue, ParamKind, ParamSchema, ParamSpec, ParamValue, Params};
pub use port::{DataKind, EdgePosition, Port, PortDirection};
pub use registry::BlockRegistry;
