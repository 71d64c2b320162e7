//! File-backed fingerprint registry (`file_hashes.json`)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::error::StoreError;
use shared::fingerprint::FingerprintRegistry;
use shared::models::FileFingerprint;

use super::storage::{read_json_or_default, write_json};

pub const FINGERPRINT_FILE: &str = "file_hashes.json";

/// On-disk value; the hash is the map key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FingerprintRecord {
    filename: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
}

type RecordMap = BTreeMap<String, FingerprintRecord>;

fn to_fingerprint(hash: &str, record: &FingerprintRecord) -> FileFingerprint {
    FileFingerprint {
        content_hash: hash.to_string(),
        filename: record.filename.clone(),
        first_seen_at: record.timestamp,
        run_id: record.run_id.clone(),
    }
}

pub struct JsonFingerprintRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFingerprintRegistry {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(FINGERPRINT_FILE),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> RecordMap {
        read_json_or_default(&self.path)
    }
}

impl FingerprintRegistry for JsonFingerprintRegistry {
    fn get(&self, content_hash: &str) -> Option<FileFingerprint> {
        let _guard = self.lock.lock().ok()?;
        self.load()
            .get(content_hash)
            .map(|record| to_fingerprint(content_hash, record))
    }

    fn insert_if_absent(&self, fingerprint: FileFingerprint) -> Result<Option<FileFingerprint>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.load();
        if let Some(existing) = records.get(&fingerprint.content_hash) {
            return Ok(Some(to_fingerprint(&fingerprint.content_hash, existing)));
        }

        records.insert(
            fingerprint.content_hash,
            FingerprintRecord {
                filename: fingerprint.filename,
                timestamp: fingerprint.first_seen_at,
                run_id: fingerprint.run_id,
            },
        );
        write_json(&self.path, &records)?;
        Ok(None)
    }

    fn attach_run(&self, content_hash: &str, run_id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.load();
        match records.get_mut(content_hash) {
            Some(record) => {
                record.run_id = Some(run_id.to_string());
                write_json(&self.path, &records)
            }
            None => Ok(()),
        }
    }

    fn remove(&self, content_hash: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.load();
        if records.remove(content_hash).is_some() {
            write_json(&self.path, &records)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        write_json(&self.path, &RecordMap::new())
    }

    fn len(&self) -> usize {
        match self.lock.lock() {
            Ok(_guard) => self.load().len(),
            Err(_) => 0,
        }
    }
}
