//! Upload analysis workflow
//!
//! upload → duplicate check → orchestrator → archive → alert dispatch.
//! The CPU and file work runs on the blocking pool.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use shared::alerts::decide_dispatch;
use shared::analysis::AnalysisOrchestrator;
use shared::fingerprint::{DuplicateDetector, UploadCheck};
use shared::models::{AnalysisRun, MessageKind, RawProductRow, RunState};
use shared::sample::{sample_rows, SAMPLE_SOURCE_NAME};
use uuid::Uuid;

use super::csv_io::parse_inventory;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// What was queued for delivery after a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationSummary {
    pub recipients: Vec<String>,
    pub kinds: Vec<MessageKind>,
    pub job_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    /// True when the same file was analyzed before and its stored run is returned
    pub duplicate: bool,
    pub state: RunState,
    pub message: String,
    pub run: AnalysisRun,
    pub notifications: NotificationSummary,
}

pub struct AnalysisService {
    state: AppState,
}

impl AnalysisService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Analyze an uploaded CSV, or return the earlier run for a repeated file
    pub async fn analyze_upload(&self, filename: String, bytes: Vec<u8>) -> AppResult<AnalysisResponse> {
        let rows = parse_inventory(&bytes)?;
        let now = Utc::now();

        let registry = self.state.fingerprints.clone();
        let registry_filename = filename.clone();
        let check = tokio::task::spawn_blocking(move || {
            DuplicateDetector::new(registry.as_ref()).check_and_register(&bytes, &registry_filename, now)
        })
        .await??;

        match check {
            UploadCheck::Duplicate(existing) => {
                let run = self.stored_run(existing.run_id.as_deref()).await?;
                Ok(AnalysisResponse {
                    duplicate: true,
                    state: run.state(),
                    message: format!(
                        "This file was already analyzed as '{}'; showing the stored results",
                        existing.filename
                    ),
                    run,
                    notifications: NotificationSummary::default(),
                })
            }
            UploadCheck::Fresh(fingerprint) => {
                let hash = fingerprint.content_hash;
                match self.analyze_rows(rows, filename, Some(hash.clone()), now).await {
                    Ok(run) => Ok(self.finish(run).await),
                    Err(err) => {
                        self.forget_fingerprint(hash).await;
                        Err(err)
                    }
                }
            }
        }
    }

    /// Analyze the built-in sample dataset; never subject to duplicate detection
    pub async fn analyze_sample(&self) -> AppResult<AnalysisResponse> {
        let now = Utc::now();
        let rows = sample_rows(today());
        let run = self
            .analyze_rows(rows, SAMPLE_SOURCE_NAME.to_string(), None, now)
            .await?;
        Ok(self.finish(run).await)
    }

    /// Unregister an upload whose analysis failed so the same file can be retried
    async fn forget_fingerprint(&self, hash: String) {
        let registry = self.state.fingerprints.clone();
        let lookup = hash.clone();
        match tokio::task::spawn_blocking(move || registry.remove(&lookup)).await {
            Ok(Ok(())) => tracing::info!(hash = %hash, "Analysis failed, upload fingerprint released"),
            Ok(Err(e)) => tracing::error!(hash = %hash, error = %e, "Could not release upload fingerprint"),
            Err(e) => tracing::error!(hash = %hash, error = %e, "Could not release upload fingerprint"),
        }
    }

    async fn stored_run(&self, run_id: Option<&str>) -> AppResult<AnalysisRun> {
        let conflict = || AppError::Conflict {
            resource: "run".to_string(),
            message: "This file is still being analyzed, or its results are no longer stored. \
                      Clear all data to analyze it again."
                .to_string(),
        };
        let run_id = run_id.ok_or_else(conflict)?.to_string();
        let runs = self.state.runs.clone();
        tokio::task::spawn_blocking(move || runs.get(&run_id))
            .await?
            .ok_or_else(conflict)
    }

    async fn analyze_rows(
        &self,
        rows: Vec<RawProductRow>,
        source_filename: String,
        content_hash: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<AnalysisRun> {
        let windows = self.state.config.read().await.alerts.expiry_windows();
        let history = self.state.history.clone();
        let runs = self.state.runs.clone();
        let registry = self.state.fingerprints.clone();
        let today = today();

        let run = tokio::task::spawn_blocking(move || -> AppResult<AnalysisRun> {
            let run = AnalysisOrchestrator::new(history.as_ref(), windows).run(&rows, &source_filename, today, now)?;
            runs.put(&run)?;
            if let Some(hash) = content_hash {
                registry.attach_run(&hash, &run.id)?;
            }
            Ok(run)
        })
        .await??;

        tracing::info!(run_id = %run.id, state = ?run.state(), "Run archived");
        Ok(run)
    }

    /// Decide and queue notifications for a fresh run
    async fn finish(&self, run: AnalysisRun) -> AnalysisResponse {
        let recipient = self.state.current_receiver().await;
        let manifest = decide_dispatch(&run, recipient.as_deref());
        let job_ids = self.state.dispatch.enqueue(&manifest);

        let state = run.state();
        let mut message = match state {
            RunState::Completed => format!("Analyzed {} products", run.recommendations.len()),
            RunState::CompletedWithWarnings => format!(
                "Analyzed {} products with {} warning(s)",
                run.recommendations.len(),
                run.warnings.len()
            ),
            RunState::Failed => "No rows could be analyzed".to_string(),
        };
        if !manifest.is_empty() {
            let kinds: Vec<String> = manifest.kinds().iter().map(ToString::to_string).collect();
            message.push_str(&format!(
                "; {} alert(s) queued for {}",
                kinds.join(" and "),
                manifest.recipients.join(", ")
            ));
        }

        AnalysisResponse {
            duplicate: false,
            state,
            message,
            notifications: NotificationSummary {
                recipients: manifest.recipients.clone(),
                kinds: manifest.kinds().into_iter().collect(),
                job_ids,
            },
            run,
        }
    }
}

/// Local calendar date used for expiration math
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
