//! Background task records and their state machine.
//!
//! `Queued -> Running -> Completed` or `Running -> Error`. Both end states are terminal;
//! there is no retry.

use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::progress::RunStage;

pub type TaskId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Queued, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Error)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTask {
    pub id: TaskId,
    pub filename: String,
    pub status: TaskStatus,
    pub progress_pct: u8,
    pub stage: String,
    pub result_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertion-ordered task records shared between workers and readers.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<Vec<BackgroundTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Writers only assign whole fields, so a poisoned lock still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, Vec<BackgroundTask>> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<BackgroundTask>> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }

    fn with_task<T>(
        &self,
        id: TaskId,
        f: impl FnOnce(&mut BackgroundTask) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut tasks = self.write();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))?;
        let out = f(&mut *task)?;
        task.updated_at = Utc::now();
        Ok(out)
    }

    fn transition(task: &mut BackgroundTask, next: TaskStatus) -> AppResult<()> {
        if !task.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                task_id: task.id.to_string(),
                from: task.status.to_string(),
                to: next.to_string(),
            });
        }
        task.status = next;
        Ok(())
    }

    pub fn enqueue(&self, filename: &str) -> TaskId {
        let now = Utc::now();
        let task = BackgroundTask {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            status: TaskStatus::Queued,
            progress_pct: 0,
            stage: "Queued".to_string(),
            result_id: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        let id = task.id;
        self.write().push(task);
        tracing::debug!(task = %id, filename, "task queued");
        id
    }

    pub fn start(&self, id: TaskId) -> AppResult<()> {
        self.with_task(id, |task| {
            Self::transition(task, TaskStatus::Running)?;
            task.stage = "Starting".to_string();
            Ok(())
        })
    }

    /// Record a finished stage. Progress never moves backwards.
    pub fn update_progress(&self, id: TaskId, stage: RunStage) -> AppResult<()> {
        self.with_task(id, |task| {
            if task.status != TaskStatus::Running {
                return Err(AppError::InvalidTransition {
                    task_id: task.id.to_string(),
                    from: task.status.to_string(),
                    to: "progress".to_string(),
                });
            }
            task.progress_pct = task.progress_pct.max(stage.percent());
            task.stage = stage.label().to_string();
            Ok(())
        })
    }

    pub fn complete(&self, id: TaskId, result_id: &str) -> AppResult<()> {
        self.with_task(id, |task| {
            Self::transition(task, TaskStatus::Completed)?;
            task.progress_pct = 100;
            task.stage = RunStage::Completed.label().to_string();
            task.result_id = Some(result_id.to_string());
            Ok(())
        })
    }

    pub fn fail(&self, id: TaskId, message: &str) -> AppResult<()> {
        self.with_task(id, |task| {
            Self::transition(task, TaskStatus::Error)?;
            task.stage = "Failed".to_string();
            task.error = Some(message.to_string());
            Ok(())
        })?;
        tracing::warn!(task = %id, error = message, "task failed");
        Ok(())
    }

    pub fn get(&self, id: TaskId) -> Option<BackgroundTask> {
        self.read().iter().find(|t| t.id == id).cloned()
    }

    pub fn list(&self) -> Vec<BackgroundTask> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let reg = TaskRegistry::new();
        let id = reg.enqueue("car.step");
        assert_eq!(reg.get(id).unwrap().status, TaskStatus::Queued);

        reg.start(id).unwrap();
        reg.update_progress(id, RunStage::SimulatingRaces).unwrap();
        reg.update_progress(id, RunStage::SynthesizingParameters).unwrap();
        let t = reg.get(id).unwrap();
        assert_eq!(t.progress_pct, RunStage::SimulatingRaces.percent());
        assert_eq!(t.stage, RunStage::SynthesizingParameters.label());

        reg.complete(id, "abc").unwrap();
        let t = reg.get(id).unwrap();
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.result_id.as_deref(), Some("abc"));
        assert_eq!(t.progress_pct, 100);
    }

    #[test]
    fn error_is_terminal() {
        let reg = TaskRegistry::new();
        let id = reg.enqueue("car.step");
        reg.start(id).unwrap();
        reg.fail(id, "boom").unwrap();
        let t = reg.get(id).unwrap();
        assert_eq!(t.status, TaskStatus::Error);
        assert_eq!(t.error.as_deref(), Some("boom"));
        assert!(t.result_id.is_none());

        assert!(reg.start(id).is_err());
        assert!(reg.complete(id, "abc").is_err());
        assert!(reg.fail(id, "again").is_err());
        assert!(reg.update_progress(id, RunStage::Completed).is_err());
    }

    #[test]
    fn illegal_transitions_rejected() {
        let reg = TaskRegistry::new();
        let id = reg.enqueue("car.step");
        assert!(matches!(
            reg.complete(id, "abc"),
            Err(AppError::InvalidTransition { .. })
        ));
        assert!(reg.fail(id, "early").is_err());
        assert!(reg.update_progress(id, RunStage::ExtractingFeatures).is_err());
        reg.start(id).unwrap();
        assert!(reg.start(id).is_err());
        reg.complete(id, "abc").unwrap();
        assert!(reg.fail(id, "late").is_err());
    }

    #[test]
    fn unknown_task() {
        let reg = TaskRegistry::new();
        assert!(matches!(
            reg.start(Uuid::new_v4()),
            Err(AppError::TaskNotFound(_))
        ));
    }

    #[test]
    fn transition_table() {
        use TaskStatus::*;
        for from in [Queued, Running, Completed, Error] {
            for to in [Queued, Running, Completed, Error] {
                let allowed = matches!(
                    (from, to),
                    (Queued, Running) | (Running, Completed) | (Running, Error)
                );
                assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
            }
        }
        assert!(Completed.is_terminal() && Error.is_terminal());
        assert!(!Running.is_terminal());
    }

    #[test]
    fn insertion_order_kept() {
        let reg = TaskRegistry::new();
        let a = reg.enqueue("a.step");
        let b = reg.enqueue("b.step");
        let ids: Vec<_> = reg.list().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(reg.len(), 2);
    }
}
