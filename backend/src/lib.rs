//! Inventory Analysis & Alerting Service - HTTP layer
//!
//! Wraps the `shared` analysis engine with file-backed stores, CSV
//! import/export, SMTP alert dispatch and an axum router.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use shared::archive::RunArchive;
use shared::fingerprint::FingerprintRegistry;
use shared::history::HistoryStore;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use config::SmtpSettings;
use services::dispatch::DispatchQueue;
use services::email::{Mailer, SmtpMailer};
use services::fingerprint_store::JsonFingerprintRegistry;
use services::history_store::JsonHistoryStore;
use services::receiver::ReceiverStore;
use services::run_store::JsonRunArchive;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub smtp: Arc<RwLock<SmtpSettings>>,
    pub history: Arc<dyn HistoryStore>,
    pub fingerprints: Arc<dyn FingerprintRegistry>,
    pub runs: Arc<dyn RunArchive>,
    pub receiver: Arc<ReceiverStore>,
    pub mailer: Arc<dyn Mailer>,
    pub dispatch: DispatchQueue,
}

impl AppState {
    /// Build state with SMTP delivery; must run inside a tokio runtime
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let smtp = Arc::new(RwLock::new(config.smtp.clone()));
        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(Arc::clone(&smtp)));
        Self::with_mailer(config, smtp, mailer)
    }

    /// Build state around any mailer
    pub fn with_mailer(
        config: Config,
        smtp: Arc<RwLock<SmtpSettings>>,
        mailer: Arc<dyn Mailer>,
    ) -> anyhow::Result<Self> {
        let data_dir = config.storage.data_dir.clone();
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!(data_dir = %data_dir.display(), "Using data directory");

        let dispatch = DispatchQueue::start(
            Arc::clone(&mailer),
            config.alerts.queue_capacity,
            config.alerts.log_capacity,
        );

        Ok(Self {
            history: Arc::new(JsonHistoryStore::new(&data_dir)),
            fingerprints: Arc::new(JsonFingerprintRegistry::new(&data_dir)),
            runs: Arc::new(JsonRunArchive::new(&data_dir, config.storage.archive_limit)),
            receiver: Arc::new(ReceiverStore::new(&data_dir)),
            config: Arc::new(RwLock::new(config)),
            smtp,
            mailer,
            dispatch,
        })
    }

    /// Saved receiver, else the configured default, else the SMTP fallback list
    pub async fn current_receiver(&self) -> Option<String> {
        if let Some(saved) = self.receiver.get() {
            return Some(saved);
        }
        if let Some(default) = self
            .config
            .read()
            .await
            .alerts
            .default_receiver
            .clone()
            .filter(|r| !r.trim().is_empty())
        {
            return Some(default);
        }
        Some(self.smtp.read().await.recipients.clone()).filter(|r| !r.trim().is_empty())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Inventory Analysis & Alerting Service API v1"
}
