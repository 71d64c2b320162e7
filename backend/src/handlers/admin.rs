//! Administrative handlers: test email and data clearing

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::alerts::parse_recipients;
use shared::models::{AlertKind, AlertLine, AlertMessage, MessageKind, StatusSummary};
use shared::validation::validate_email;

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TestEmailInput {
    /// Overrides the saved receiver for this send only
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestEmailResponse {
    pub sent: bool,
    pub recipients: Vec<String>,
    pub subject: String,
}

fn test_message(recipients: Vec<String>) -> AlertMessage {
    AlertMessage {
        kind: MessageKind::Inventory,
        alert_kind: AlertKind::Critical,
        subject: format!("[TEST] {}", AlertKind::Critical.subject()),
        recipients,
        run_id: None,
        lines: vec![AlertLine {
            product_id: "TEST001".to_string(),
            product_name: "Test Product".to_string(),
            current_stock: Decimal::from(5),
            ideal_stock: Some(Decimal::from(100)),
            stock_ratio: Some(Decimal::new(5, 2)),
            order_quantity: Some(95),
            expiration_date: None,
            detail: "URGENT RESTOCK: order 95 units now".to_string(),
        }],
        summary: Some(StatusSummary {
            total_products: 1,
            critical_understock: 1,
            ..Default::default()
        }),
    }
}

/// Send a synthetic critical alert right away and report the outcome
pub async fn send_test_email(
    State(state): State<AppState>,
    input: Option<Json<TestEmailInput>>,
) -> AppResult<Json<TestEmailResponse>> {
    let input = input.map(|Json(input)| input).unwrap_or_default();
    let raw = match input.recipient.filter(|r| !r.trim().is_empty()) {
        Some(recipient) => Some(recipient),
        None => state.current_receiver().await,
    };
    let recipients = raw.as_deref().map(parse_recipients).unwrap_or_default();
    if recipients.is_empty() {
        return Err(AppError::validation("recipient", "No receiver email is set"));
    }
    for recipient in &recipients {
        validate_email(recipient).map_err(|e| AppError::validation("recipient", e))?;
    }

    let message = test_message(recipients.clone());
    state.mailer.send(&message).await.map_err(AppError::Email)?;

    Ok(Json(TestEmailResponse {
        sent: true,
        recipients,
        subject: message.subject,
    }))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: Vec<&'static str>,
}

/// Forget the current run; archived runs stay
pub async fn clear_latest_run(State(state): State<AppState>) -> AppResult<Json<ClearResponse>> {
    let runs = state.runs.clone();
    tokio::task::spawn_blocking(move || runs.clear_latest()).await??;
    tracing::info!("Latest run pointer cleared");
    Ok(Json(ClearResponse {
        cleared: vec!["latest_run"],
    }))
}

/// Delete every archived run
pub async fn clear_runs(State(state): State<AppState>) -> AppResult<Json<ClearResponse>> {
    let runs = state.runs.clone();
    tokio::task::spawn_blocking(move || runs.clear()).await??;
    tracing::info!("Archived runs cleared");
    Ok(Json(ClearResponse { cleared: vec!["runs"] }))
}

/// Delete history, the upload registry and all archived runs
pub async fn clear_all_data(State(state): State<AppState>) -> AppResult<Json<ClearResponse>> {
    let history = state.history.clone();
    let fingerprints = state.fingerprints.clone();
    let runs = state.runs.clone();
    tokio::task::spawn_blocking(move || -> AppResult<()> {
        history.clear()?;
        fingerprints.clear()?;
        runs.clear()?;
        Ok(())
    })
    .await??;

    tracing::info!("All stored data cleared");
    Ok(Json(ClearResponse {
        cleared: vec!["history", "file_hashes", "runs"],
    }))
}
