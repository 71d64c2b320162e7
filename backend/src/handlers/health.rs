//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub history_entries: usize,
    pub archived_runs: usize,
    pub pending_alerts: usize,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let data_dir = state.config.read().await.storage.data_dir.clone();
    let storage = match tokio::fs::metadata(&data_dir).await {
        Ok(meta) if meta.is_dir() => "available",
        _ => "unavailable",
    };

    let history = state.history.clone();
    let runs = state.runs.clone();
    let (history_entries, archived_runs) =
        tokio::task::spawn_blocking(move || (history.len(), runs.list().len()))
            .await
            .unwrap_or((0, 0));

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: storage.to_string(),
        history_entries,
        archived_runs,
        pending_alerts: state.dispatch.log().pending(),
    })
}
