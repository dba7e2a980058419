//! Job, progress and work-item types.

use crate::types::{ProcessedTile, TileRequest};
use std::fmt::{self, Display};
use std::time::{Duration, Instant, SystemTime};
use tile2json_core::{TileCoord, TileRange};

/// Settings of one batch job.
#[derive(Clone, Debug)]
pub struct JobConfig {
	pub concurrency: usize,
	pub chunk_size: usize,
	/// Whole-job deadline.
	pub timeout: Duration,
	pub fail_on_error: bool,
}

impl Default for JobConfig {
	fn default() -> Self {
		JobConfig {
			concurrency: 10,
			chunk_size: 100,
			timeout: Duration::from_secs(300),
			fail_on_error: false,
		}
	}
}

/// Lifecycle states. `Completed`, `Failed` and `Canceled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
	Pending,
	Running,
	Completed,
	Failed,
	Canceled,
	Paused,
}

impl JobStatus {
	#[must_use]
	pub fn is_terminal(&self) -> bool {
		matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled)
	}
}

impl Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			JobStatus::Pending => "pending",
			JobStatus::Running => "running",
			JobStatus::Completed => "completed",
			JobStatus::Failed => "failed",
			JobStatus::Canceled => "canceled",
			JobStatus::Paused => "paused",
		};
		f.write_str(name)
	}
}

/// Counters and derived rates, updated by the executor after every chunk.
///
/// `processed == success + failed` holds at every chunk boundary.
#[derive(Clone, Debug, Default)]
pub struct JobProgress {
	pub total_tiles: u64,
	pub processed: u64,
	pub success: u64,
	pub failed: u64,
	pub current_chunk: usize,
	pub total_chunks: usize,
	pub start_time: Option<Instant>,
	pub estimated_end: Option<Instant>,
	/// Tiles per second since the job started.
	pub throughput: f64,
	pub bytes_written: u64,
}

impl JobProgress {
	/// Completion percentage in `0..=100`; zero when nothing is planned.
	#[must_use]
	pub fn progress_pct(&self) -> f64 {
		if self.total_tiles == 0 {
			0.0
		} else {
			(self.processed as f64 / self.total_tiles as f64 * 100.0).min(100.0)
		}
	}

	/// Recomputes throughput and linearly extrapolates the end time.
	pub fn update_rates(&mut self) {
		let Some(start) = self.start_time else { return };
		let elapsed = start.elapsed().as_secs_f64();
		if elapsed > 0.0 && self.processed > 0 {
			self.throughput = self.processed as f64 / elapsed;
		}

		self.estimated_end = if self.throughput > 0.0 && self.processed < self.total_tiles {
			let remaining = (self.total_tiles - self.processed) as f64 / self.throughput;
			Some(Instant::now() + Duration::from_secs_f64(remaining))
		} else {
			None
		};
	}
}

/// A batch job: what to process and how far it has come.
#[derive(Debug)]
pub struct Job {
	pub id: String,
	pub ranges: Vec<TileRange>,
	pub config: JobConfig,
	pub status: JobStatus,
	pub progress: JobProgress,
	pub created_at: SystemTime,
	pub started_at: Option<Instant>,
	pub completed_at: Option<Instant>,
	pub error: Option<String>,
}

impl Job {
	pub fn new(id: String, ranges: Vec<TileRange>, config: JobConfig) -> Job {
		Job {
			id,
			ranges,
			config,
			status: JobStatus::Pending,
			progress: JobProgress::default(),
			created_at: SystemTime::now(),
			started_at: None,
			completed_at: None,
			error: None,
		}
	}

	/// Total tiles across all ranges.
	#[must_use]
	pub fn total_tiles(&self) -> u64 {
		self.ranges.iter().map(TileRange::count).sum()
	}
}

/// One unit of work: a tile request with its position in the schedule.
#[derive(Clone, Debug)]
pub struct WorkItem {
	pub request: TileRequest,
	pub chunk_id: usize,
	pub item_id: usize,
}

/// Outcome of one work item.
#[derive(Debug)]
pub struct WorkResult {
	pub coord: TileCoord,
	pub chunk_id: usize,
	pub attempts: u32,
	pub duration: Duration,
	pub result: anyhow::Result<ProcessedTile>,
}

/// Aggregated outcome of one chunk.
#[derive(Debug)]
pub struct ChunkResult {
	pub chunk_id: usize,
	pub success_count: usize,
	pub failure_count: usize,
	pub duration: Duration,
}
