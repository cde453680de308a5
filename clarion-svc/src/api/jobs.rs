//! Batch job API handlers
//!
//! POST /jobs submits a batch and returns a job handle; GET /jobs/{id}
//! polls its status. The batch itself runs in a background task so the
//! submit call returns immediately.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{output_file_name, EnhancementModel, FileOutcome, FileTask, JobConfig, JobStatus};
use crate::services::{run_batch, ApiTransferClient, WorkerPolicy};
use crate::AppState;

/// POST /jobs request
#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    /// Local paths of the files to enhance
    pub files: Vec<PathBuf>,
    /// Directory the enhanced files are written to
    pub output_folder: PathBuf,
    #[serde(default)]
    pub enhancement_model: EnhancementModel,
    /// Enhancement mix level, 0-100 percent
    #[serde(default = "default_enhancement_level")]
    pub enhancement_level: u8,
    /// Overrides the configured API key for this batch
    pub api_key: Option<String>,
}

fn default_enhancement_level() -> u8 {
    100
}

/// POST /jobs response
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub expected_outputs: Vec<PathBuf>,
}

/// GET /jobs/{id} response
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<String>,
}

/// POST /jobs
///
/// Validate the batch, record it in the ledger, and start it in the
/// background. Individual file failures never fail this call; callers
/// poll GET /jobs/{id} for the per-file failure list.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<SubmitJobRequest>,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    if request.files.is_empty() {
        return Err(ApiError::BadRequest("No input files given".to_string()));
    }
    if request.enhancement_level > 100 {
        return Err(ApiError::BadRequest(format!(
            "enhancement_level must be 0-100, got {}",
            request.enhancement_level
        )));
    }

    let api_key = request
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| state.config.api_key.clone())
        .ok_or_else(|| {
            ApiError::BadRequest(
                "API key not configured. Provide it in the request, via \
                 CLARION_API_KEY, or in the TOML config (api_key = \"...\")"
                    .to_string(),
            )
        })?;

    // Idempotent, safe if two batches target the same folder
    std::fs::create_dir_all(&request.output_folder)?;

    let config = JobConfig {
        model: request.enhancement_model,
        enhancement_level: request.enhancement_level,
        ..JobConfig::default()
    };

    let tasks: Vec<FileTask> = request
        .files
        .iter()
        .map(|input| FileTask {
            input: input.clone(),
            output: request
                .output_folder
                .join(output_file_name(input, config.model)),
            config,
        })
        .collect();
    let expected_outputs: Vec<PathBuf> = tasks.iter().map(|t| t.output.clone()).collect();

    let client = ApiTransferClient::new(&state.config.api_base_url, api_key)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let job_id = state.ledger.create(expected_outputs.clone()).await;

    tracing::info!(
        job_id = %job_id,
        files = tasks.len(),
        model = config.model.wire_name(),
        "Enhancement job started"
    );

    let ledger = state.ledger.clone();
    let max_concurrency = state.config.max_concurrency;
    tokio::spawn(async move {
        let outcomes =
            run_batch(Arc::new(client), tasks, WorkerPolicy::default(), max_concurrency).await;

        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Success { output } => outputs.push(output),
                FileOutcome::Failure { input, reason } => {
                    failures.push(format!("{}: {}", input.display(), reason));
                }
            }
        }

        if let Err(e) = ledger.complete(job_id, outputs, failures).await {
            tracing::error!(job_id = %job_id, error = %e, "Failed to record job completion");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitJobResponse {
            job_id,
            status: JobStatus::Processing,
            expected_outputs,
        }),
    ))
}

/// GET /jobs/{job_id}
///
/// Poll batch progress. Unknown handles return 404, never a fault.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state
        .ledger
        .get(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", job_id)))?;

    tracing::debug!(job_id = %job_id, status = ?job.status, "Job status query");

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        status: job.status,
        outputs: job.outputs,
        failures: job.failures,
    }))
}

/// Build job routes
pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(submit_job))
        .route("/jobs/:job_id", get(get_job))
}
