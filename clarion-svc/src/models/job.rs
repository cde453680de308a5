//! Job and per-file task types
//!
//! A batch submission creates one `Job` (tracked by the ledger) and one
//! `FileTask` per input file. Every task resolves to exactly one
//! `FileOutcome`; once the job is `Done`, outputs plus failures account
//! for every submitted task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Remote enhancement model variant, selected per batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnhancementModel {
    #[default]
    LarkV2,
    Finch,
}

impl EnhancementModel {
    /// Wire-level model identifier as the remote API expects it
    pub fn wire_name(&self) -> &'static str {
        match self {
            EnhancementModel::LarkV2 => "LARK_V2",
            EnhancementModel::Finch => "FINCH",
        }
    }
}

/// Enhancement parameters, immutable once a batch starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Which remote model variant to apply
    pub model: EnhancementModel,
    /// Enhancement mix level, 0-100 percent
    pub enhancement_level: u8,
    /// Target loudness in LUFS
    pub loudness_target_level: i32,
    /// True-peak ceiling in dBTP
    pub true_peak: i32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            model: EnhancementModel::default(),
            enhancement_level: 100,
            loudness_target_level: -14,
            true_peak: -1,
        }
    }
}

/// One file to enhance: local input, target output, parameters.
/// Never shared between concurrent workers.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: JobConfig,
}

/// Terminal result of one `FileTask`, produced exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Success { output: PathBuf },
    Failure { input: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success { .. })
    }
}

/// Batch job status exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done,
}

/// Batch job record, owned exclusively by the ledger.
///
/// Created `Processing`; transitions to `Done` exactly once when every
/// task has a recorded outcome, and is immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Opaque handle callers use to query progress
    pub id: Uuid,
    pub status: JobStatus,
    /// Output paths the batch will produce if every file succeeds
    pub expected_outputs: Vec<PathBuf>,
    /// Outputs actually produced (populated at completion)
    pub outputs: Vec<PathBuf>,
    /// Per-file failure diagnostics (populated at completion)
    pub failures: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new job in the `Processing` state
    pub fn new(expected_outputs: Vec<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Processing,
            expected_outputs,
            outputs: Vec::new(),
            failures: Vec::new(),
            created_at: Utc::now(),
            ended_at: None,
        }
    }
}
