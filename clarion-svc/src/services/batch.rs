//! Batch scheduler
//!
//! Runs the per-file worker for every task in a batch under a bounded
//! concurrency limit. Outcomes are returned through the `JoinSet` and
//! merged after join; workers never share a mutable result list.

use crate::models::{FileOutcome, FileTask};
use crate::services::transfer::Transfer;
use crate::services::worker::{self, WorkerPolicy};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run every task to a terminal state, at most `max_concurrency` at a time.
///
/// Returns exactly one outcome per task, in completion order. A single
/// task's failure or timeout never cancels its siblings; even a panicked
/// worker task is recorded as a failure for its input rather than
/// propagated.
pub async fn run_batch<T: Transfer>(
    client: Arc<T>,
    tasks: Vec<FileTask>,
    policy: WorkerPolicy,
    max_concurrency: usize,
) -> Vec<FileOutcome> {
    let total = tasks.len();
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let policy = Arc::new(policy);

    let mut join_set = JoinSet::new();
    let mut inputs_by_task: HashMap<tokio::task::Id, PathBuf> = HashMap::new();

    for task in tasks {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let policy = Arc::clone(&policy);
        let input = task.input.clone();

        let handle = join_set.spawn(async move {
            // Holding the permit for the whole submit/poll/download cycle
            // is what bounds in-flight work.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            worker::process_file(client.as_ref(), &task, &policy).await
        });
        inputs_by_task.insert(handle.id(), input);
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((id, outcome)) => {
                inputs_by_task.remove(&id);
                outcomes.push(outcome);
            }
            Err(join_err) => {
                // Keep the one-outcome-per-task invariant even if a worker
                // task itself fails to run.
                let input = inputs_by_task.remove(&join_err.id()).unwrap_or_default();
                tracing::error!(
                    input = %input.display(),
                    error = %join_err,
                    "Enhancement worker task failed"
                );
                outcomes.push(FileOutcome::Failure {
                    input,
                    reason: format!("Worker task failed: {}", join_err),
                });
            }
        }
    }

    let failures = outcomes.iter().filter(|o| !o.is_success()).count();
    tracing::info!(
        total = total,
        succeeded = total - failures,
        failed = failures,
        "Batch complete"
    );

    outcomes
}
