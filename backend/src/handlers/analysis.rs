//! HTTP handlers for uploads, runs and exports

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use shared::models::{AnalysisRun, ChartSeries};
use shared::validation::CsvValidationReport;

use crate::error::{AppError, AppResult};
use crate::services::analysis::{today, AnalysisResponse};
use crate::services::csv_io::{export_run, template_csv, validate_upload};
use crate::services::AnalysisService;
use crate::AppState;

/// Pull the `file` part out of a multipart body
async fn read_csv_upload(mut multipart: Multipart) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().trim().to_string();
        if filename.is_empty() {
            return Err(AppError::validation("file", "No file selected"));
        }
        if !filename.to_lowercase().ends_with(".csv") {
            return Err(AppError::validation("file", "Only CSV files are accepted"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Could not read upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::validation("file", "Uploaded file is empty"));
        }
        return Ok((filename, bytes.to_vec()));
    }

    Err(AppError::validation("file", "No file part in the request"))
}

/// Upload a CSV and analyze it
pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<AnalysisResponse>> {
    let (filename, bytes) = read_csv_upload(multipart).await?;
    tracing::info!(filename = %filename, bytes = bytes.len(), "Upload received");

    let service = AnalysisService::new(state);
    let response = service.analyze_upload(filename, bytes).await?;
    Ok(Json(response))
}

/// Analyze the built-in sample dataset
pub async fn analyze_sample(State(state): State<AppState>) -> AppResult<Json<AnalysisResponse>> {
    let service = AnalysisService::new(state);
    Ok(Json(service.analyze_sample().await?))
}

/// Latest run
pub async fn get_latest(State(state): State<AppState>) -> AppResult<Json<AnalysisRun>> {
    let runs = state.runs.clone();
    tokio::task::spawn_blocking(move || runs.latest())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Latest run".to_string()))
}

#[derive(Serialize)]
pub struct RunList {
    pub runs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

/// Archived run ids, newest first
pub async fn list_runs(State(state): State<AppState>) -> AppResult<Json<RunList>> {
    let runs = state.runs.clone();
    let (ids, latest) = tokio::task::spawn_blocking(move || (runs.list(), runs.latest().map(|run| run.id))).await?;
    Ok(Json(RunList { runs: ids, latest }))
}

async fn load_run(state: &AppState, run_id: String) -> AppResult<AnalysisRun> {
    let runs = state.runs.clone();
    let lookup = run_id.clone();
    tokio::task::spawn_blocking(move || runs.get(&lookup))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Run {}", run_id)))
}

/// One archived run
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> AppResult<Json<AnalysisRun>> {
    Ok(Json(load_run(&state, run_id).await?))
}

/// Recommendations of a run as CSV
pub async fn export_run_csv(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let run = load_run(&state, run_id).await?;
    let csv = export_run(&run)?;
    let disposition = format!("attachment; filename=\"recommendations_{}.csv\"", run.id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Current vs ideal chart series of a run
pub async fn get_chart(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> AppResult<Json<ChartSeries>> {
    Ok(Json(load_run(&state, run_id).await?.chart))
}

/// Check an upload's layout without analyzing it
pub async fn validate(multipart: Multipart) -> AppResult<Json<CsvValidationReport>> {
    let (_, bytes) = read_csv_upload(multipart).await?;
    Ok(Json(validate_upload(&bytes)?))
}

/// Download a CSV template
pub async fn template() -> AppResult<impl IntoResponse> {
    let csv = template_csv(today())?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"inventory_template.csv\""),
        ],
        csv,
    ))
}
