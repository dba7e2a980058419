//! Batch processing: job state, chunked execution, progress reporting.

mod executor;
mod reporter;
mod types;

pub use executor::BatchExecutor;
pub use reporter::{ConsoleReporter, ProgressReporter};
pub use types::{ChunkResult, Job, JobConfig, JobProgress, JobStatus, WorkItem, WorkResult};
