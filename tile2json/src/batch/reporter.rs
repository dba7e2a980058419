//! Progress reporting.
//!
//! Reporters are called from the executor thread only and must not block;
//! the console reporter draws through the shared progress line, which
//! rate-limits itself to at most one redraw per second.

use super::types::{ChunkResult, Job};
use std::io::{Write, stderr};
use std::time::Duration;
use tile2json_core::utils::ProgressLine;

/// Receives job progress events.
pub trait ProgressReporter: Send {
	fn report_progress(&mut self, job: &Job);
	fn report_chunk_complete(&mut self, job: &Job, chunk: &ChunkResult);
	fn report_job_complete(&mut self, job: &Job);
	fn report_job_failed(&mut self, job: &Job, error: &anyhow::Error);
}

/// Writes a `\r`-rewriting progress line to stderr.
pub struct ConsoleReporter {
	line: ProgressLine,
}

impl ConsoleReporter {
	pub fn new() -> ConsoleReporter {
		ConsoleReporter {
			line: ProgressLine::new("Progress", 0),
		}
	}

	/// Updates are drawn at most every `interval` (floor 1 s).
	pub fn with_interval(interval: Duration) -> ConsoleReporter {
		let reporter = ConsoleReporter::new();
		reporter.line.set_redraw_interval(interval);
		reporter
	}

	fn sync(&mut self, job: &Job) {
		self.line.set_total(job.progress.total_tiles);
		self.line.set_position(job.progress.processed);
	}
}

impl Default for ConsoleReporter {
	fn default() -> Self {
		ConsoleReporter::new()
	}
}

impl ProgressReporter for ConsoleReporter {
	fn report_progress(&mut self, job: &Job) {
		self.sync(job);
	}

	fn report_chunk_complete(&mut self, job: &Job, _chunk: &ChunkResult) {
		self.sync(job);
	}

	fn report_job_complete(&mut self, job: &Job) {
		self.sync(job);
		self.line.finish();
	}

	fn report_job_failed(&mut self, job: &Job, error: &anyhow::Error) {
		self.sync(job);
		self.line.finish();
		let _ = writeln!(stderr(), "Failed: {error:#}");
	}
}
