//! Route definitions for the inventory analysis API

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/analysis", analysis_routes())
        .nest("/settings", settings_routes())
        .nest("/alerts", alert_routes())
        .nest("/admin", admin_routes())
}

/// Upload, run and export routes
fn analysis_routes() -> Router<AppState> {
    use handlers::analysis;

    Router::new()
        .route("/upload", post(analysis::upload))
        .route("/sample", post(analysis::analyze_sample))
        .route("/validate", post(analysis::validate))
        .route("/template", get(analysis::template))
        .route("/latest", get(analysis::get_latest))
        .route("/runs", get(analysis::list_runs))
        .route("/runs/:run_id", get(analysis::get_run))
        .route("/runs/:run_id/export", get(analysis::export_run_csv))
        .route("/runs/:run_id/chart", get(analysis::get_chart))
}

/// Receiver and SMTP settings routes
fn settings_routes() -> Router<AppState> {
    use handlers::settings;

    Router::new()
        .route(
            "/receiver",
            get(settings::get_receiver).put(settings::put_receiver),
        )
        .route(
            "/email",
            get(settings::get_email_settings).put(settings::put_email_settings),
        )
        .route("/reload", post(settings::reload))
}

/// Dispatch status routes
fn alert_routes() -> Router<AppState> {
    Router::new().route("/status", get(handlers::alerts::get_status))
}

/// Test email and data clearing routes
fn admin_routes() -> Router<AppState> {
    use handlers::admin;

    Router::new()
        .route("/test-email", post(admin::send_test_email))
        .route("/runs/latest", delete(admin::clear_latest_run))
        .route("/runs", delete(admin::clear_runs))
        .route("/data", delete(admin::clear_all_data))
}
