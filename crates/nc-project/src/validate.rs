//! Structural checks run on raw documents before any decoding.

use serde_json::Value;

/// Required top-level arrays of a graph document.
const REQUIRED_ARRAYS: [&str; 2] = ["nodes", "edges"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Graph document must be an object")]
    NotAnObject,

    #[error("Graph document is missing '{field}'")]
    MissingField { field: &'static str },

    #[error("Graph document field '{field}' must be an array")]
    NotAnArray { field: &'static str },
}

/// Reject documents that lack the `nodes`/`edges` arrays.
pub fn check_structure(document: &Value) -> Result<(), StructuralError> {
    let object = document.as_object().ok_or(StructuralError::NotAnObject)?;
    for field in REQUIRED_ARRAYS {
        match object.get(field) {
            None | Some(Value::Null) => return Err(StructuralError::MissingField { field }),
            Some(Value::Array(_)) => {}
            Some(_) => return Err(StructuralError::NotAnArray { field }),
        }
    }
    Ok(())
}
