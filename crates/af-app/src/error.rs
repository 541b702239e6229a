//! Error types for the af-app service layer.

/// Application error type that wraps errors from the backend crates and gives the
/// CLI and embedding front ends one error surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Design error: {0}")]
    Design(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Result not found: {0}")]
    ResultNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid task transition for {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: String,
        to: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure during synthesis, including a panic in a worker.
    #[error("Engine fault: {message}")]
    EngineFault { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for af-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<af_config::ConfigError> for AppError {
    fn from(err: af_config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<af_config::ValidationError> for AppError {
    fn from(err: af_config::ValidationError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<af_geometry::GeometryError> for AppError {
    fn from(err: af_geometry::GeometryError) -> Self {
        AppError::Geometry(err.to_string())
    }
}

impl From<af_design::DesignError> for AppError {
    fn from(err: af_design::DesignError) -> Self {
        AppError::Design(err.to_string())
    }
}

impl From<af_sim::SimError> for AppError {
    fn from(err: af_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<af_results::ResultsError> for AppError {
    fn from(err: af_results::ResultsError) -> Self {
        match err {
            af_results::ResultsError::ResultNotFound { result_id } => {
                AppError::ResultNotFound(result_id)
            }
            other => AppError::Results(other.to_string()),
        }
    }
}
