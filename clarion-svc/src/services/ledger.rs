//! In-memory job ledger
//!
//! Tracks batch jobs by opaque handle so callers can poll progress.
//! Concurrent readers during `Processing` see consistent snapshots; the
//! transition to `Done` happens exactly once per handle. Completed jobs
//! are evicted oldest-first once the ledger reaches its cap, so the map
//! cannot grow without bound.

use crate::models::{Job, JobStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Job ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Unknown job handle
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    /// `complete` called twice for the same handle
    #[error("Job already completed: {0}")]
    AlreadyCompleted(Uuid),
}

/// Thread-safe ledger of batch jobs
#[derive(Clone)]
pub struct JobLedger {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
    max_jobs: usize,
}

impl JobLedger {
    pub fn new(max_jobs: usize) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            max_jobs: max_jobs.max(1),
        }
    }

    /// Create a job in the `Processing` state and return its handle
    pub async fn create(&self, expected_outputs: Vec<PathBuf>) -> Uuid {
        let job = Job::new(expected_outputs);
        let id = job.id;

        let mut jobs = self.jobs.write().await;
        Self::evict_done(&mut jobs, self.max_jobs);
        jobs.insert(id, job);

        tracing::debug!(job_id = %id, "Job created");
        id
    }

    /// Transition a job to `Done` with its final outputs and failures.
    ///
    /// Allowed exactly once per handle; a second call is rejected and the
    /// original result is never overwritten.
    pub async fn complete(
        &self,
        id: Uuid,
        outputs: Vec<PathBuf>,
        failures: Vec<String>,
    ) -> Result<(), LedgerError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        if job.status == JobStatus::Done {
            return Err(LedgerError::AlreadyCompleted(id));
        }

        job.status = JobStatus::Done;
        job.outputs = outputs;
        job.failures = failures;
        job.ended_at = Some(Utc::now());

        tracing::info!(
            job_id = %id,
            outputs = job.outputs.len(),
            failures = job.failures.len(),
            "Job completed"
        );
        Ok(())
    }

    /// Snapshot of a job, if the handle is known
    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Number of jobs currently retained
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Evict oldest `Done` jobs until the map is below its cap.
    /// `Processing` jobs are never evicted.
    fn evict_done(jobs: &mut HashMap<Uuid, Job>, max_jobs: usize) {
        while jobs.len() >= max_jobs {
            let oldest_done = jobs
                .values()
                .filter(|j| j.status == JobStatus::Done)
                .min_by_key(|j| j.created_at)
                .map(|j| j.id);

            match oldest_done {
                Some(id) => {
                    jobs.remove(&id);
                    tracing::debug!(job_id = %id, "Evicted completed job from ledger");
                }
                None => break,
            }
        }
    }
}
