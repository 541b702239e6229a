//! Error types for artifact synthesis.

use thiserror::Error;

/// Errors from invalid synthesis options. Out-of-range synthesized values are clamped,
/// never reported.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error(transparent)]
    Core(#[from] af_core::CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
