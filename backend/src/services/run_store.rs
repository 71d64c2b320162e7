//! File-backed run archive
//!
//! One `runs/<run_id>.json` per run plus `latest_run.txt` naming the current
//! one. Run ids sort chronologically, so pruning removes the smallest ids.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shared::archive::RunArchive;
use shared::error::StoreError;
use shared::models::AnalysisRun;

use super::storage::{atomic_write, read_text, remove_if_exists, write_json};

pub const RUNS_DIR: &str = "runs";
pub const LATEST_FILE: &str = "latest_run.txt";

pub struct JsonRunArchive {
    runs_dir: PathBuf,
    latest_path: PathBuf,
    limit: usize,
    lock: Mutex<()>,
}

impl JsonRunArchive {
    pub fn new(data_dir: &Path, limit: usize) -> Self {
        Self {
            runs_dir: data_dir.join(RUNS_DIR),
            latest_path: data_dir.join(LATEST_FILE),
            limit: limit.max(1),
            lock: Mutex::new(()),
        }
    }

    fn run_path(&self, run_id: &str) -> Option<PathBuf> {
        // ids are timestamps; anything else could escape the directory
        if run_id.is_empty() || !run_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(self.runs_dir.join(format!("{}.json", run_id)))
    }

    /// Stored ids, oldest first
    fn ids(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.runs_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    return None;
                }
                path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string)
            })
            .collect();
        ids.sort();
        ids
    }

    fn read_run(&self, run_id: &str) -> Option<AnalysisRun> {
        let path = self.run_path(run_id)?;
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(run) => Some(run),
            Err(e) => {
                tracing::warn!(run_id, error = %e, "Corrupt archived run");
                None
            }
        }
    }
}

impl RunArchive for JsonRunArchive {
    fn put(&self, run: &AnalysisRun) -> Result<(), StoreError> {
        let path = self.run_path(&run.id).ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid run id '{}'", run.id),
            ))
        })?;

        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        write_json(&path, run)?;
        atomic_write(&self.latest_path, run.id.as_bytes())?;

        let ids = self.ids();
        if ids.len() > self.limit {
            for old in &ids[..ids.len() - self.limit] {
                if let Some(old_path) = self.run_path(old) {
                    remove_if_exists(&old_path)?;
                    tracing::debug!(run_id = %old, "Pruned archived run");
                }
            }
        }
        Ok(())
    }

    fn get(&self, run_id: &str) -> Option<AnalysisRun> {
        let _guard = self.lock.lock().ok()?;
        self.read_run(run_id)
    }

    fn latest(&self) -> Option<AnalysisRun> {
        let _guard = self.lock.lock().ok()?;
        let id = read_text(&self.latest_path)?;
        self.read_run(&id)
    }

    fn list(&self) -> Vec<String> {
        let Ok(_guard) = self.lock.lock() else {
            return Vec::new();
        };
        let mut ids = self.ids();
        ids.reverse();
        ids
    }

    fn clear_latest(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        remove_if_exists(&self.latest_path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        for id in self.ids() {
            if let Some(path) = self.run_path(&id) {
                remove_if_exists(&path)?;
            }
        }
        remove_if_exists(&self.latest_path)?;
        Ok(())
    }
}
