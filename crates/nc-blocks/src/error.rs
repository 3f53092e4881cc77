//! Registry error types.

use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A block type with this key is already registered.
    #[error("Block type '{type_name}' is already registered")]
    DuplicateType { type_name: String },

    /// Two ports on the same side of a block share an id.
    #[error("Block type '{type_name}' declares port '{port}' twice")]
    DuplicatePort { type_name: String, port: String },

    #[error("Unknown block category: {name}")]
    UnknownCategory { name: String },
}
