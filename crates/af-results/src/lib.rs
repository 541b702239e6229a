//! af-results: result records, content-hashed ids and on-disk storage.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::{ResultKey, compute_result_id};
pub use store::ResultStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Result not found: {result_id}")]
    ResultNotFound { result_id: String },

    #[error("Invalid result id: {0}")]
    InvalidId(String),
}
