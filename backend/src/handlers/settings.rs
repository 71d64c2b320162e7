//! Receiver, SMTP and configuration reload handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared::alerts::parse_recipients;
use shared::validation::validate_email;
use validator::Validate;

use crate::config::{Config, SmtpTls};
use crate::error::{AppError, AppResult};
use crate::AppState;

fn validation_error(errors: validator::ValidationErrors) -> AppError {
    let field = errors
        .field_errors()
        .keys()
        .next()
        .map(|field| field.to_string())
        .unwrap_or_default();
    AppError::Validation {
        field,
        message: errors.to_string(),
    }
}

// ============================================================================
// Receiver
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ReceiverResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// True when the address was saved through the API rather than configured
    pub saved: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReceiverInput {
    #[validate(email)]
    pub email: String,
}

pub async fn get_receiver(State(state): State<AppState>) -> AppResult<Json<ReceiverResponse>> {
    let saved = state.receiver.get();
    let email = match &saved {
        Some(address) => Some(address.clone()),
        None => state.current_receiver().await,
    };
    Ok(Json(ReceiverResponse {
        email,
        saved: saved.is_some(),
    }))
}

pub async fn put_receiver(
    State(state): State<AppState>,
    Json(input): Json<ReceiverInput>,
) -> AppResult<Json<ReceiverResponse>> {
    input.validate().map_err(validation_error)?;

    let receiver = state.receiver.clone();
    let email = input.email.trim().to_string();
    let stored = email.clone();
    tokio::task::spawn_blocking(move || receiver.set(&stored)).await??;

    Ok(Json(ReceiverResponse {
        email: Some(email),
        saved: true,
    }))
}

// ============================================================================
// SMTP
// ============================================================================

/// SMTP settings as shown to clients; the password is never echoed
#[derive(Debug, Serialize)]
pub struct EmailSettingsView {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password_set: bool,
    pub sender: String,
    pub recipients: Vec<String>,
    pub tls: SmtpTls,
    pub configured: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailSettingsInput {
    #[validate(length(min = 1, message = "SMTP host is required"))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u32,
    #[serde(default)]
    pub username: String,
    /// Omit to keep the current password
    #[serde(default)]
    pub password: Option<String>,
    #[validate(email)]
    pub sender: String,
    #[serde(default)]
    pub recipients: String,
    #[serde(default)]
    pub tls: Option<SmtpTls>,
}

async fn email_view(state: &AppState) -> EmailSettingsView {
    let smtp = state.smtp.read().await;
    EmailSettingsView {
        host: smtp.host.clone(),
        port: smtp.port,
        username: smtp.username.clone(),
        password_set: !smtp.password.is_empty(),
        sender: smtp.sender.clone(),
        recipients: parse_recipients(&smtp.recipients),
        tls: smtp.tls,
        configured: smtp.is_configured(),
    }
}

pub async fn get_email_settings(State(state): State<AppState>) -> AppResult<Json<EmailSettingsView>> {
    Ok(Json(email_view(&state).await))
}

pub async fn put_email_settings(
    State(state): State<AppState>,
    Json(input): Json<EmailSettingsInput>,
) -> AppResult<Json<EmailSettingsView>> {
    input.validate().map_err(validation_error)?;
    for recipient in parse_recipients(&input.recipients) {
        validate_email(&recipient)
            .map_err(|e| AppError::validation("recipients", format!("{}: {}", e, recipient)))?;
    }
    let port = u16::try_from(input.port).map_err(|_| AppError::validation("port", "Port out of range"))?;

    {
        let mut smtp = state.smtp.write().await;
        smtp.host = input.host.trim().to_string();
        smtp.port = port;
        smtp.username = input.username.trim().to_string();
        if let Some(password) = input.password {
            smtp.password = password;
        }
        smtp.sender = input.sender.trim().to_string();
        smtp.recipients = input.recipients.trim().to_string();
        if let Some(tls) = input.tls {
            smtp.tls = tls;
        }
    }
    tracing::info!("SMTP settings updated");

    Ok(Json(email_view(&state).await))
}

// ============================================================================
// Reload
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub environment: String,
    pub urgent_days: u32,
    pub alert_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub smtp_configured: bool,
}

/// Re-read config files and environment; runtime SMTP edits are replaced
pub async fn reload(State(state): State<AppState>) -> AppResult<Json<ReloadResponse>> {
    let fresh = tokio::task::spawn_blocking(Config::load).await??;

    *state.smtp.write().await = fresh.smtp.clone();
    let response = {
        let mut config = state.config.write().await;
        // storage location is fixed for the lifetime of the process
        let data_dir = config.storage.data_dir.clone();
        *config = fresh;
        config.storage.data_dir = data_dir;
        ReloadResponse {
            environment: config.environment.clone(),
            urgent_days: config.alerts.urgent_days,
            alert_days: config.alerts.alert_days,
            receiver: None,
            smtp_configured: config.smtp.is_configured(),
        }
    };

    tracing::info!("Configuration reloaded");
    Ok(Json(ReloadResponse {
        receiver: state.current_receiver().await,
        ..response
    }))
}
