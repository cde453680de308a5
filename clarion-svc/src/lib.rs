//! clarion-svc library interface
//!
//! Exposes the batch enhancement orchestrator (transfer client, per-file
//! worker, batch scheduler, job ledger) and the HTTP surface built on top
//! of it.

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use clarion_common::TomlConfig;
use services::JobLedger;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved service configuration
    pub config: Arc<TomlConfig>,
    /// In-memory job ledger
    pub ledger: JobLedger,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: TomlConfig) -> Self {
        let ledger = JobLedger::new(config.max_jobs);
        Self {
            config: Arc::new(config),
            ledger,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::root_page))
        .merge(api::job_routes())
        .merge(api::health_routes())
        .with_state(state)
}
