//! Duplicate upload detection tests
//!
//! - A byte-identical second upload returns the stored run
//! - A duplicate never produces a second run or new history
//! - Any single byte change makes the upload fresh
//! - A failed analysis does not block retrying the same file

use std::sync::Arc;

use chrono::Utc;
use ims_backend::config::Config;
use ims_backend::error::AppError;
use ims_backend::services::email::{EmailFailure, Mailer};
use ims_backend::services::AnalysisService;
use ims_backend::AppState;
use proptest::prelude::*;
use shared::archive::RunArchive;
use shared::fingerprint::{
    content_hash, DuplicateDetector, FingerprintRegistry, MemoryFingerprintRegistry, UploadCheck,
};
use shared::history::HistoryStore;
use shared::models::AlertMessage;
use tokio::sync::RwLock;

const INVENTORY: &str = "product_id,product_name,current_stock,ideal_stock_level\n\
P001,Whole Milk,10,100\n\
P002,Basmati Rice,150,100\n\
P003,Paper Towels,100,100\n";

struct NullMailer;

#[async_trait::async_trait]
impl Mailer for NullMailer {
    async fn send(&self, _message: &AlertMessage) -> Result<(), EmailFailure> {
        Ok(())
    }
}

fn test_state(dir: &tempfile::TempDir) -> AppState {
    let config = Config::with_data_dir(dir.path());
    let smtp = Arc::new(RwLock::new(config.smtp.clone()));
    AppState::with_mailer(config, smtp, Arc::new(NullMailer)).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_second_identical_upload_returns_stored_run() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let service = AnalysisService::new(state.clone());

        let first = service
            .analyze_upload("inventory.csv".to_string(), INVENTORY.as_bytes().to_vec())
            .await
            .unwrap();
        assert!(!first.duplicate);
        assert_eq!(first.run.recommendations.len(), 3);
        let history_after_first = state.history.len();

        let second = service
            .analyze_upload("renamed.csv".to_string(), INVENTORY.as_bytes().to_vec())
            .await
            .unwrap();
        assert!(second.duplicate);
        assert_eq!(second.run.id, first.run.id);
        assert!(second.message.contains("inventory.csv"));
        assert!(second.notifications.job_ids.is_empty());

        assert_eq!(state.runs.list().len(), 1);
        assert_eq!(state.history.len(), history_after_first);
    }

    #[tokio::test]
    async fn test_changed_file_is_analyzed_again() {
        let dir = tempfile::tempdir().unwrap();
        let service = AnalysisService::new(test_state(&dir));

        service
            .analyze_upload("a.csv".to_string(), INVENTORY.as_bytes().to_vec())
            .await
            .unwrap();
        let changed = INVENTORY.replace("P003,Paper Towels,100", "P003,Paper Towels,90");
        let response = service
            .analyze_upload("a.csv".to_string(), changed.into_bytes())
            .await
            .unwrap();
        assert!(!response.duplicate);
    }

    #[tokio::test]
    async fn test_invalid_file_does_not_register() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let service = AnalysisService::new(state.clone());

        let bad = b"product_id,name\nP1,Thing\n".to_vec();
        let err = service
            .analyze_upload("bad.csv".to_string(), bad.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingColumns(_)));
        assert!(state.fingerprints.is_empty());

        // the same bytes fail the same way instead of turning into a duplicate
        let err = service
            .analyze_upload("bad.csv".to_string(), bad)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingColumns(_)));
    }

    #[tokio::test]
    async fn test_duplicate_after_runs_cleared_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let service = AnalysisService::new(state.clone());

        service
            .analyze_upload("inventory.csv".to_string(), INVENTORY.as_bytes().to_vec())
            .await
            .unwrap();
        state.runs.clear().unwrap();

        let err = service
            .analyze_upload("inventory.csv".to_string(), INVENTORY.as_bytes().to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_failed_analysis_allows_retry() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let service = AnalysisService::new(state.clone());

        // a plain file where the run archive directory belongs makes archiving fail
        let blocker = dir.path().join("runs");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = service
            .analyze_upload("inventory.csv".to_string(), INVENTORY.as_bytes().to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(state.fingerprints.is_empty());

        std::fs::remove_file(&blocker).unwrap();
        let retry = service
            .analyze_upload("inventory.csv".to_string(), INVENTORY.as_bytes().to_vec())
            .await
            .unwrap();
        assert!(!retry.duplicate);
        assert_eq!(state.runs.list(), vec![retry.run.id.clone()]);
    }

    #[tokio::test]
    async fn test_sample_run_skips_duplicate_detection() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let service = AnalysisService::new(state.clone());

        let first = service.analyze_sample().await.unwrap();
        let second = service.analyze_sample().await.unwrap();
        assert!(!first.duplicate);
        assert!(!second.duplicate);
        assert!(state.fingerprints.is_empty());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The first sighting is fresh and every later sighting is a duplicate of it
        #[test]
        fn prop_first_sighting_wins(bytes in prop::collection::vec(any::<u8>(), 0..256), repeats in 1usize..5) {
            let registry = MemoryFingerprintRegistry::default();
            let detector = DuplicateDetector::new(&registry);

            let first = detector.check_and_register(&bytes, "first.csv", Utc::now()).unwrap();
            prop_assert!(!first.is_duplicate());

            for i in 0..repeats {
                let check = detector
                    .check_and_register(&bytes, &format!("copy{}.csv", i), Utc::now())
                    .unwrap();
                match check {
                    UploadCheck::Duplicate(existing) => {
                        prop_assert_eq!(existing.filename, "first.csv");
                        prop_assert_eq!(existing.content_hash, content_hash(&bytes));
                    }
                    UploadCheck::Fresh(_) => prop_assert!(false, "repeat upload was fresh"),
                }
            }
        }

        /// Flipping one byte changes the fingerprint
        #[test]
        fn prop_single_byte_change_is_fresh(
            bytes in prop::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let mut changed = bytes.clone();
            let i = index.index(changed.len());
            changed[i] ^= flip;

            let registry = MemoryFingerprintRegistry::default();
            let detector = DuplicateDetector::new(&registry);
            detector.check_and_register(&bytes, "a.csv", Utc::now()).unwrap();
            let check = detector.check_and_register(&changed, "a.csv", Utc::now()).unwrap();
            prop_assert!(!check.is_duplicate());
        }
    }
}
