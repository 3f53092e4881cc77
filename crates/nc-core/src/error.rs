use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid identifier: {id:?}")]
    InvalidId { id: String },

    #[error("Identifier sequence '{prefix}' is exhausted")]
    IdExhausted { prefix: &'static str },
}
