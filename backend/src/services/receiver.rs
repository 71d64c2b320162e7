//! Alert receiver address persisted in `receiver.txt`

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shared::error::StoreError;

use super::storage::{atomic_write, read_text, remove_if_exists};

pub const RECEIVER_FILE: &str = "receiver.txt";

pub struct ReceiverStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReceiverStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(RECEIVER_FILE),
            lock: Mutex::new(()),
        }
    }

    /// Saved receiver, read fresh from disk
    pub fn get(&self) -> Option<String> {
        let _guard = self.lock.lock().ok()?;
        read_text(&self.path)
    }

    pub fn set(&self, address: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        atomic_write(&self.path, address.trim().as_bytes())?;
        tracing::info!(receiver = address.trim(), "Alert receiver updated");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        remove_if_exists(&self.path)?;
        Ok(())
    }
}
