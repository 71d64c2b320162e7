//! Dispatch status handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::services::dispatch::DispatchRecord;
use crate::AppState;

#[derive(Serialize)]
pub struct AlertStatusResponse {
    pub pending: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub recent: Vec<DispatchRecord>,
}

/// Recent dispatch outcomes, newest first
pub async fn get_status(State(state): State<AppState>) -> Json<AlertStatusResponse> {
    Json(AlertStatusResponse {
        pending: state.dispatch.log().pending(),
        receiver: state.current_receiver().await,
        recent: state.dispatch.log().recent(),
    })
}
