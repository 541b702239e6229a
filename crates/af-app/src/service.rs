//! Background run submission and task/result queries.
//!
//! Each submitted run gets a task record and its own worker thread. The worker drives
//! [`ensure_run_with_progress`] and moves the task to `completed` or `error`; a panic
//! inside the engine is caught and reported as [`AppError::EngineFault`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use af_config::{EngineConfig, Tier};
use af_results::{AeroResult, ResultStore};

use crate::error::{AppError, AppResult};
use crate::ledger::ResultLedger;
use crate::progress::{RunProgressEvent, RunStage};
use crate::run_service::{RunOptions, RunRequest, RunResponse, ensure_run, ensure_run_with_progress};
use crate::task::{BackgroundTask, TaskId, TaskRegistry};

/// Owned input for a background run.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub tier: Tier,
    pub car_class: String,
    pub thrust_model: String,
}

/// Handle to a submitted run. Dropping it detaches the worker.
#[derive(Debug)]
pub struct RunHandle {
    pub id: TaskId,
    handle: JoinHandle<()>,
}

impl RunHandle {
    /// Wait for the worker to finish. The outcome itself is on the task record.
    pub fn join(self) -> AppResult<TaskId> {
        self.handle.join().map_err(|payload| AppError::EngineFault {
            message: panic_message(payload.as_ref()),
        })?;
        Ok(self.id)
    }
}

pub struct SimulationService {
    config: Arc<EngineConfig>,
    store: Option<ResultStore>,
    options: RunOptions,
    tasks: Arc<TaskRegistry>,
    ledger: Arc<ResultLedger>,
}

impl SimulationService {
    /// The config is validated per run, so a bad config fails its tasks rather than
    /// the service.
    pub fn new(config: EngineConfig, store: Option<ResultStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            options: RunOptions::default(),
            tasks: Arc::new(TaskRegistry::new()),
            ledger: Arc::new(ResultLedger::new()),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&ResultStore> {
        self.store.as_ref()
    }

    pub fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Queue a run and start it on a worker thread.
    pub fn submit(&self, request: SubmitRequest) -> AppResult<RunHandle> {
        let id = self.tasks.enqueue(&request.filename);
        let worker = Worker {
            id,
            config: Arc::clone(&self.config),
            store: self.store.clone(),
            options: self.options.clone(),
            tasks: Arc::clone(&self.tasks),
            ledger: Arc::clone(&self.ledger),
        };

        let spawned = thread::Builder::new()
            .name(format!("af-run-{id}"))
            .spawn(move || worker.run(request));

        match spawned {
            Ok(handle) => Ok(RunHandle { id, handle }),
            Err(err) => {
                // The task never left the queue; start it so it can be failed.
                self.tasks.start(id)?;
                self.tasks.fail(id, &err.to_string())?;
                Err(AppError::Io(err))
            }
        }
    }

    /// Run on the calling thread without a task record.
    pub fn run_blocking(&self, request: &SubmitRequest) -> AppResult<RunResponse> {
        ensure_run(&RunRequest {
            bytes: &request.bytes,
            filename: &request.filename,
            tier: request.tier,
            car_class: &request.car_class,
            thrust_model: &request.thrust_model,
            config: &self.config,
            store: self.store.as_ref(),
            ledger: Some(&self.ledger),
            options: self.options.clone(),
        })
    }

    pub fn task(&self, id: TaskId) -> AppResult<BackgroundTask> {
        self.tasks
            .get(id)
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
    }

    pub fn tasks(&self) -> Vec<BackgroundTask> {
        self.tasks.list()
    }

    /// Look up a result in this process first, then on disk.
    pub fn result(&self, id: &str) -> AppResult<Arc<AeroResult>> {
        if let Some(result) = self.ledger.get(id) {
            return Ok(result);
        }
        match &self.store {
            Some(store) => Ok(Arc::new(store.load_result(id)?)),
            None => Err(AppError::ResultNotFound(id.to_string())),
        }
    }

    /// Results completed in this process, oldest first.
    pub fn results(&self) -> Vec<Arc<AeroResult>> {
        self.ledger.snapshot()
    }
}

struct Worker {
    id: TaskId,
    config: Arc<EngineConfig>,
    store: Option<ResultStore>,
    options: RunOptions,
    tasks: Arc<TaskRegistry>,
    ledger: Arc<ResultLedger>,
}

impl Worker {
    fn run(self, request: SubmitRequest) {
        let id = self.id;
        if let Err(err) = self.tasks.start(id) {
            tracing::warn!(task = %id, error = %err, "task could not start");
            return;
        }

        let outcome = guarded(|| {
            let run_request = RunRequest {
                bytes: &request.bytes,
                filename: &request.filename,
                tier: request.tier,
                car_class: &request.car_class,
                thrust_model: &request.thrust_model,
                config: &self.config,
                store: self.store.as_ref(),
                ledger: Some(&self.ledger),
                options: self.options.clone(),
            };
            let mut on_progress = |event: RunProgressEvent| {
                if event.stage == RunStage::Completed {
                    return;
                }
                if let Err(err) = self.tasks.update_progress(id, event.stage) {
                    tracing::debug!(task = %id, error = %err, "progress update dropped");
                }
            };
            ensure_run_with_progress(&run_request, Some(&mut on_progress))
        });

        let recorded = match outcome {
            Ok(response) => {
                tracing::info!(
                    task = %id,
                    result = %response.result_id,
                    cached = response.loaded_from_cache,
                    "task completed"
                );
                self.tasks.complete(id, &response.result_id)
            }
            Err(err) => self.tasks.fail(id, &err.to_string()),
        };
        if let Err(err) = recorded {
            tracing::warn!(task = %id, error = %err, "task outcome not recorded");
        }
    }
}

/// Run `f`, turning a panic into an engine fault.
fn guarded<T>(f: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(AppError::EngineFault {
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: unknown payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_becomes_engine_fault() {
        let out: AppResult<()> = guarded(|| panic!("synthesis blew up"));
        match out {
            Err(AppError::EngineFault { message }) => {
                assert!(message.contains("synthesis blew up"), "{message}")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn guarded_passes_errors_through() {
        let out: AppResult<()> = guarded(|| Err(AppError::InvalidInput("bad".into())));
        assert!(matches!(out, Err(AppError::InvalidInput(_))));
        assert_eq!(guarded(|| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn unknown_result_without_store() {
        let service = SimulationService::new(EngineConfig::default(), None);
        let id = "0".repeat(64);
        assert!(matches!(
            service.result(&id),
            Err(AppError::ResultNotFound(_))
        ));
        assert!(service.results().is_empty());
    }
}
