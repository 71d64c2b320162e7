//! File-backed stock history (`history.json`)

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shared::error::StoreError;
use shared::history::{CappedLog, HistorySnapshot, HistoryStore, HISTORY_CAPACITY};
use shared::models::HistoricalObservation;

use super::storage::{read_json_or_default, write_json};

pub const HISTORY_FILE: &str = "history.json";

/// Observation log persisted as a JSON array, oldest first
pub struct JsonHistoryStore {
    path: PathBuf,
    capacity: usize,
    lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(HISTORY_FILE),
            capacity: HISTORY_CAPACITY,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> CappedLog<HistoricalObservation> {
        let entries: Vec<HistoricalObservation> = read_json_or_default(&self.path);
        CappedLog::from_entries(self.capacity, entries)
    }

    fn save(&self, log: &CappedLog<HistoricalObservation>) -> Result<(), StoreError> {
        write_json(&self.path, &log.to_vec())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn snapshot(&self) -> HistorySnapshot {
        let _guard = self.lock.lock();
        HistorySnapshot::new(self.load().to_vec())
    }

    fn append(&self, observation: HistoricalObservation) -> Result<(), StoreError> {
        self.append_all(vec![observation])
    }

    fn append_all(&self, observations: Vec<HistoricalObservation>) -> Result<(), StoreError> {
        if observations.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut log = self.load();
        let mut evicted = 0;
        for observation in observations {
            evicted += log.push(observation);
        }
        if evicted > 0 {
            tracing::debug!(evicted, "Trimmed stock history to capacity");
        }
        self.save(&log)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.save(&CappedLog::new(self.capacity))
    }
}
