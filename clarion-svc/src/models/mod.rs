//! Data model for batch enhancement jobs

pub mod job;
pub mod naming;

pub use job::{EnhancementModel, FileOutcome, FileTask, Job, JobConfig, JobStatus};
pub use naming::output_file_name;
