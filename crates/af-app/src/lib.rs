//! Shared application service layer for aeroforge.
//!
//! Centralizes engine assembly, result caching, background task tracking and result
//! queries so the CLI and any embedding front end drive the engine the same way.

pub mod engine;
pub mod error;
pub mod ledger;
pub mod progress;
pub mod query;
pub mod run_service;
pub mod service;
pub mod task;

pub use engine::{ENGINE_VERSION, EngineInput, EngineOutput, run_engine};
pub use error::{AppError, AppResult};
pub use ledger::ResultLedger;
pub use progress::{RunProgressEvent, RunStage};
pub use query::{
    ParameterRow, ResultSummary, SERIES_NAMES, SliceAxis, extract_series, flow_field_slice,
    parameter_table, summarize,
};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
};
pub use service::{RunHandle, SimulationService, SubmitRequest};
pub use task::{BackgroundTask, TaskId, TaskRegistry, TaskStatus};
