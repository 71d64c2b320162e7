//! Duplicate upload detection
//!
//! Uploads are fingerprinted by the SHA-256 of their raw bytes. A content
//! hash appears at most once in the registry; a second upload with the same
//! bytes is routed to the run produced the first time.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::models::FileFingerprint;

/// Lowercase hex SHA-256 of the raw file bytes
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Persistence seam for fingerprints keyed by content hash
pub trait FingerprintRegistry: Send + Sync {
    fn get(&self, content_hash: &str) -> Option<FileFingerprint>;

    /// Insert unless the hash is already known; returns the existing entry
    /// in that case. Lookup and insert must be atomic.
    fn insert_if_absent(&self, fingerprint: FileFingerprint) -> Result<Option<FileFingerprint>, StoreError>;

    /// Link a fingerprint to the run produced from its file
    fn attach_run(&self, content_hash: &str, run_id: &str) -> Result<(), StoreError>;

    /// Forget one fingerprint, e.g. when its analysis never finished
    fn remove(&self, content_hash: &str) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a duplicate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadCheck {
    /// Same bytes were seen before
    Duplicate(FileFingerprint),
    /// First sighting; the fingerprint has been registered
    Fresh(FileFingerprint),
}

impl UploadCheck {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, UploadCheck::Duplicate(_))
    }

    pub fn fingerprint(&self) -> &FileFingerprint {
        match self {
            UploadCheck::Duplicate(fp) | UploadCheck::Fresh(fp) => fp,
        }
    }
}

/// Detects repeated uploads against a registry
pub struct DuplicateDetector<'a> {
    registry: &'a dyn FingerprintRegistry,
}

impl<'a> DuplicateDetector<'a> {
    pub fn new(registry: &'a dyn FingerprintRegistry) -> Self {
        Self { registry }
    }

    /// Hash the bytes, then either report the earlier entry or register this one
    pub fn check_and_register(
        &self,
        bytes: &[u8],
        filename: &str,
        now: DateTime<Utc>,
    ) -> Result<UploadCheck, StoreError> {
        let fingerprint = FileFingerprint {
            content_hash: content_hash(bytes),
            filename: filename.to_string(),
            first_seen_at: now,
            run_id: None,
        };

        match self.registry.insert_if_absent(fingerprint.clone())? {
            Some(existing) => {
                tracing::info!(
                    hash = %existing.content_hash,
                    original = %existing.filename,
                    "Duplicate upload detected"
                );
                Ok(UploadCheck::Duplicate(existing))
            }
            None => Ok(UploadCheck::Fresh(fingerprint)),
        }
    }
}

/// In-process registry
#[derive(Default)]
pub struct MemoryFingerprintRegistry {
    entries: Mutex<BTreeMap<String, FileFingerprint>>,
}

impl MemoryFingerprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FingerprintRegistry for MemoryFingerprintRegistry {
    fn get(&self, content_hash: &str) -> Option<FileFingerprint> {
        self.entries.lock().ok()?.get(content_hash).cloned()
    }

    fn insert_if_absent(&self, fingerprint: FileFingerprint) -> Result<Option<FileFingerprint>, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(existing) = entries.get(&fingerprint.content_hash) {
            return Ok(Some(existing.clone()));
        }
        entries.insert(fingerprint.content_hash.clone(), fingerprint);
        Ok(None)
    }

    fn attach_run(&self, content_hash: &str, run_id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(entry) = entries.get_mut(content_hash) {
            entry.run_id = Some(run_id.to_string());
        }
        Ok(())
    }

    fn remove(&self, content_hash: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .remove(content_hash);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)?.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}
