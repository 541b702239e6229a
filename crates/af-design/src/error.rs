//! Error types for design lookups.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesignError {
    #[error("Unknown design parameter: {name}")]
    UnknownField { name: String },

    #[error("Unknown rule: {id}")]
    UnknownRule { id: String },
}

pub type DesignResult<T> = Result<T, DesignError>;
