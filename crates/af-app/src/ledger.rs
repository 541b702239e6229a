//! Append-only record of completed results for this process.

use std::sync::{Arc, RwLock};

use af_results::AeroResult;

#[derive(Debug, Default)]
pub struct ResultLedger {
    entries: RwLock<Vec<Arc<AeroResult>>>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, result: Arc<AeroResult>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(result);
    }

    /// Latest entry with `id`; a re-run supersedes earlier entries with the same id.
    pub fn get(&self, id: &str) -> Option<Arc<AeroResult>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().rev().find(|r| r.id() == id).cloned()
    }

    /// Snapshot in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<AeroResult>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn latest(&self) -> Option<Arc<AeroResult>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
