//! Archive of completed analysis runs
//!
//! Runs are keyed by their id, which sorts chronologically. The archive also
//! tracks which run is "latest"; clearing that pointer leaves the archived
//! run itself in place.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::models::AnalysisRun;

/// Runs kept before the oldest are pruned
pub const DEFAULT_ARCHIVE_LIMIT: usize = 20;

pub trait RunArchive: Send + Sync {
    /// Store a run and make it the latest, pruning beyond the limit
    fn put(&self, run: &AnalysisRun) -> Result<(), StoreError>;

    fn get(&self, run_id: &str) -> Option<AnalysisRun>;

    fn latest(&self) -> Option<AnalysisRun>;

    /// Archived run ids, newest first
    fn list(&self) -> Vec<String>;

    /// Forget which run is current
    fn clear_latest(&self) -> Result<(), StoreError>;

    /// Remove every archived run and the latest pointer
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Default)]
struct ArchiveState {
    runs: BTreeMap<String, AnalysisRun>,
    latest: Option<String>,
}

/// In-process archive
pub struct MemoryRunArchive {
    limit: usize,
    state: RwLock<ArchiveState>,
}

impl MemoryRunArchive {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            state: RwLock::new(ArchiveState::default()),
        }
    }
}

impl Default for MemoryRunArchive {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_LIMIT)
    }
}

impl RunArchive for MemoryRunArchive {
    fn put(&self, run: &AnalysisRun) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state.runs.insert(run.id.clone(), run.clone());
        state.latest = Some(run.id.clone());

        while state.runs.len() > self.limit {
            let Some(oldest) = state.runs.keys().next().cloned() else {
                break;
            };
            state.runs.remove(&oldest);
            if state.latest.as_deref() == Some(oldest.as_str()) {
                state.latest = None;
            }
        }
        Ok(())
    }

    fn get(&self, run_id: &str) -> Option<AnalysisRun> {
        self.state.read().ok()?.runs.get(run_id).cloned()
    }

    fn latest(&self) -> Option<AnalysisRun> {
        let state = self.state.read().ok()?;
        let id = state.latest.as_ref()?;
        state.runs.get(id).cloned()
    }

    fn list(&self) -> Vec<String> {
        match self.state.read() {
            Ok(state) => state.runs.keys().rev().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn clear_latest(&self) -> Result<(), StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)?.latest = None;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state.runs.clear();
        state.latest = None;
        Ok(())
    }
}
