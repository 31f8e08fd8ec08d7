use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Constraint error: {0}")]
    Constraint(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
