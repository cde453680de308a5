//! Per-file enhancement worker
//!
//! Drives one file through submit -> poll-until-ready -> download and
//! converts every failure into a `FileOutcome` at its boundary, so a bad
//! file can never abort its siblings.
//!
//! The polling deadline is computed once from the input's byte size:
//! compressed formats take disproportionally longer to process than their
//! size suggests relative to PCM, so they get a larger seconds-per-MB
//! factor.

use crate::models::{FileOutcome, FileTask};
use crate::services::transfer::{PollOutcome, Transfer, TransferError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Input extensions accepted for submission
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["wav", "aac", "opus", "ogg", "mp3", "flac", "pcm", "mp4"];

/// Lossy/compressed extensions whose byte size underestimates processing time
pub const COMPRESSED_EXTENSIONS: [&str; 6] = ["aac", "opus", "ogg", "mp3", "flac", "mp4"];

/// Per-file worker errors
#[derive(Debug, Error)]
pub enum EnhanceError {
    /// Rejected locally, before any network call
    #[error("Unsupported file extension '{extension}' for {input}; supported extensions are: {}", SUPPORTED_EXTENSIONS.join(", "))]
    UnsupportedFormat { input: String, extension: String },

    /// Remote rejected the upload; not transient, never retried
    #[error("Submission rejected ({status}): {body}")]
    Submission { status: u16, body: String },

    /// Poll returned an unexpected terminal status
    #[error("Enhancement failed ({status}): {reason}")]
    Remote { status: u16, reason: String },

    /// Remote never returned ready within the computed deadline
    #[error("Enhancement timed out after {elapsed_s:.0} seconds (timeout: {timeout_s:.0} seconds, file size: {size_mb:.2} MB). Please try again.")]
    PollTimeout {
        elapsed_s: f64,
        timeout_s: f64,
        size_mb: f64,
    },

    /// Network/TLS failure at any stage
    #[error("Transport error: {0}")]
    Transport(String),

    /// Local file I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransferError> for EnhanceError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Transport(msg) => EnhanceError::Transport(msg),
            TransferError::Io(e) => EnhanceError::Io(e),
            TransferError::Submission { status, body } => {
                EnhanceError::Submission { status, body }
            }
            TransferError::Protocol(msg) => EnhanceError::Transport(msg),
        }
    }
}

/// Timeout and retry policy for one worker
#[derive(Debug, Clone)]
pub struct WorkerPolicy {
    /// Fixed delay between poll attempts
    pub poll_interval: Duration,
    /// Timeout factor for raw/PCM inputs, seconds per MB
    pub raw_factor_s_per_mb: f64,
    /// Timeout factor for compressed inputs, seconds per MB
    pub compressed_factor_s_per_mb: f64,
    /// Report a pre-existing output file as success without resubmitting
    pub skip_existing: bool,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            raw_factor_s_per_mb: 60.0,
            compressed_factor_s_per_mb: 600.0,
            skip_existing: true,
        }
    }
}

/// Lowercased extension of `path`, if any
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Validate the input extension, returning it lowercased
fn validate_extension(input: &Path) -> Result<String, EnhanceError> {
    let extension = extension_of(input).unwrap_or_default();
    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(EnhanceError::UnsupportedFormat {
            input: input.display().to_string(),
            extension,
        })
    }
}

/// Polling deadline for a file of `size_bytes` with extension `extension`
pub fn poll_timeout(size_bytes: u64, extension: &str, policy: &WorkerPolicy) -> Duration {
    let size_mb = size_bytes as f64 / (1024.0 * 1024.0);
    let factor = if COMPRESSED_EXTENSIONS.contains(&extension) {
        policy.compressed_factor_s_per_mb
    } else {
        policy.raw_factor_s_per_mb
    };
    Duration::from_secs_f64(size_mb * factor)
}

/// Run one file to a terminal state, converting every error into a
/// `FileOutcome::Failure` with the input path and a readable reason.
pub async fn process_file<T: Transfer>(
    client: &T,
    task: &FileTask,
    policy: &WorkerPolicy,
) -> FileOutcome {
    match enhance_file(client, task, policy).await {
        Ok(output) => {
            tracing::info!(
                input = %task.input.display(),
                output = %output.display(),
                "File enhanced"
            );
            FileOutcome::Success { output }
        }
        Err(e) => {
            tracing::warn!(
                input = %task.input.display(),
                error = %e,
                "File enhancement failed"
            );
            FileOutcome::Failure {
                input: task.input.clone(),
                reason: e.to_string(),
            }
        }
    }
}

/// Submit, poll until ready, download. States: Submitting -> Polling ->
/// Succeeded/Failed/TimedOut; download happens inside the successful poll.
async fn enhance_file<T: Transfer>(
    client: &T,
    task: &FileTask,
    policy: &WorkerPolicy,
) -> Result<PathBuf, EnhanceError> {
    let extension = validate_extension(&task.input)?;

    if policy.skip_existing && task.output.exists() {
        tracing::info!(
            input = %task.input.display(),
            output = %task.output.display(),
            "Output already exists, skipping submission"
        );
        return Ok(task.output.clone());
    }

    let file_name = task
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("media")
        .to_string();

    // Submitting: a rejection here is final, the remote's accept-or-reject
    // decision is not transient.
    let uid = client.submit(&task.input, &task.config, &file_name).await?;

    let size_bytes = tokio::fs::metadata(&task.input).await?.len();
    let size_mb = size_bytes as f64 / (1024.0 * 1024.0);
    let timeout = poll_timeout(size_bytes, &extension, policy);

    tracing::debug!(
        input = %task.input.display(),
        uid = %uid,
        size_mb = format!("{:.2}", size_mb),
        timeout_s = timeout.as_secs_f64(),
        "Polling for enhanced media"
    );

    // Polling: deadline computed once, never refreshed
    let started = Instant::now();
    let deadline = started + timeout;
    while Instant::now() < deadline {
        tokio::time::sleep(policy.poll_interval).await;

        match client.poll_and_download(&uid, &task.output).await? {
            PollOutcome::NotReady => continue,
            PollOutcome::Ready => return Ok(task.output.clone()),
            PollOutcome::Failed { status, reason } => {
                return Err(EnhanceError::Remote { status, reason });
            }
        }
    }

    Err(EnhanceError::PollTimeout {
        elapsed_s: started.elapsed().as_secs_f64(),
        timeout_s: timeout.as_secs_f64(),
        size_mb,
    })
}
