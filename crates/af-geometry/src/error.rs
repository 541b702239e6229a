//! Error types for geometry ingestion.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Failed to read geometry file: {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type GeometryResult<T> = Result<T, GeometryError>;
