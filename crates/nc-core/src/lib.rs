//! nc-core: stable foundation for neurocanvas.
//!
//! Contains:
//! - ids (string identifiers for nodes, edges and super-blocks, plus the
//!   monotonic sequences that mint them)
//! - geometry (canvas positions)
//! - error (shared error types)

pub mod error;
pub mod geometry;
pub mod ids;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use geometry::Position;
pub use ids::*;
