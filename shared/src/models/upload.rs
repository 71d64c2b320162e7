//! Uploaded file fingerprints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry entry for a previously analyzed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    /// SHA-256 of the raw bytes, lowercase hex
    pub content_hash: String,
    pub filename: String,
    #[serde(rename = "timestamp")]
    pub first_seen_at: DateTime<Utc>,
    /// Run produced from this file, once analysis finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}
