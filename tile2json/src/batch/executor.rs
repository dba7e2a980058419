//! The chunked batch executor.
//!
//! Ranges are expanded into a flat, deterministically ordered work list,
//! cut into chunks, and processed chunk by chunk: workers run concurrently
//! inside a chunk (`min(chunk_size, concurrency)`), chunks run
//! sequentially. Successful tiles of a chunk are written in one
//! `write_batch` call; counters, throughput and ETA are updated at every
//! chunk boundary. Cancellation is cooperative and checked at the top of
//! each chunk, at the top of each worker iteration, and before every
//! in-worker retry.

use super::reporter::ProgressReporter;
use super::types::{ChunkResult, Job, JobStatus, WorkItem, WorkResult};
use crate::fetch::{Fetcher, FetcherFactory};
use crate::output::Writer;
use crate::processor::TileProcessor;
use anyhow::{Context, Result, anyhow};
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Attempts per work item inside a worker (the fetcher retries
/// independently per attempt).
const WORKER_ATTEMPTS: u32 = 3;

pub struct BatchExecutor {
	factory: FetcherFactory,
	fetcher: Arc<dyn Fetcher>,
	processor: Arc<TileProcessor>,
	writer: Box<dyn Writer>,
	reporter: Option<Box<dyn ProgressReporter>>,
	cancel: CancellationToken,
}

impl BatchExecutor {
	pub fn new(
		factory: FetcherFactory,
		fetcher: Arc<dyn Fetcher>,
		processor: Arc<TileProcessor>,
		writer: Box<dyn Writer>,
		reporter: Option<Box<dyn ProgressReporter>>,
	) -> BatchExecutor {
		BatchExecutor {
			factory,
			fetcher,
			processor,
			writer,
			reporter,
			cancel: CancellationToken::new(),
		}
	}

	/// Token to cancel the running job from outside (e.g. Ctrl-C).
	#[must_use]
	pub fn cancellation_token(&self) -> CancellationToken {
		self.cancel.clone()
	}

	/// Runs the job to a terminal status. Returns an error when the job
	/// ends `Failed` or `Canceled`.
	pub async fn process(&mut self, job: &mut Job) -> Result<()> {
		let started = Instant::now();
		job.status = JobStatus::Running;
		job.started_at = Some(started);
		job.progress.start_time = Some(started);

		if let Some(reporter) = self.reporter.as_mut() {
			reporter.report_progress(job);
		}

		let items = self.generate_work_items(job);
		job.progress.total_tiles = items.len() as u64;
		job.progress.total_chunks = items.len().div_ceil(job.config.chunk_size);

		let deadline = started + job.config.timeout;
		let chunk_size = job.config.chunk_size;
		let workers = job.config.concurrency;

		let mut chunks: Vec<Vec<WorkItem>> = Vec::with_capacity(job.progress.total_chunks);
		let mut iter = items.into_iter().peekable();
		while iter.peek().is_some() {
			chunks.push(iter.by_ref().take(chunk_size).collect());
		}

		for chunk in chunks {
			if self.cancel.is_cancelled() {
				return self.finish_with_error(job, JobStatus::Canceled, anyhow!("job canceled"));
			}
			if Instant::now() >= deadline {
				self.cancel.cancel();
				return self.finish_with_error(
					job,
					JobStatus::Failed,
					anyhow!("job timed out after {:?}", job.config.timeout),
				);
			}

			let chunk_id = chunk[0].chunk_id;
			job.progress.current_chunk = chunk_id + 1;

			let chunk_result = match self.process_chunk(chunk, workers, job.config.fail_on_error).await {
				Ok(result) => result,
				Err(error) => {
					self.cancel.cancel();
					return self.finish_with_error(
						job,
						JobStatus::Failed,
						error.context(format!("chunk {chunk_id} failed")),
					);
				}
			};

			job.progress.processed += (chunk_result.success_count + chunk_result.failure_count) as u64;
			job.progress.success += chunk_result.success_count as u64;
			job.progress.failed += chunk_result.failure_count as u64;
			job.progress.bytes_written = self.writer.bytes_written();
			job.progress.update_rates();

			if let Some(reporter) = self.reporter.as_mut() {
				reporter.report_chunk_complete(job, &chunk_result);
			}

			if job.config.fail_on_error && chunk_result.failure_count > 0 {
				self.cancel.cancel();
				return self.finish_with_error(
					job,
					JobStatus::Failed,
					anyhow!("chunk {chunk_id} had {} failed tiles", chunk_result.failure_count),
				);
			}
		}

		if let Err(error) = self.writer.close().context("failed to close output writer") {
			return self.finish_with_error(job, JobStatus::Failed, error);
		}
		job.status = JobStatus::Completed;
		job.completed_at = Some(Instant::now());
		if let Some(reporter) = self.reporter.as_mut() {
			reporter.report_job_complete(job);
		}
		Ok(())
	}

	/// Expands ranges into the flat, z-major ordered work list.
	fn generate_work_items(&self, job: &Job) -> Vec<WorkItem> {
		let chunk_size = job.config.chunk_size;
		job
			.ranges
			.iter()
			.flat_map(|range| range.iter_coords())
			.enumerate()
			.map(|(item_id, coord)| WorkItem {
				request: self.factory.request_for(coord),
				chunk_id: item_id / chunk_size,
				item_id,
			})
			.collect()
	}

	/// Dispatches one chunk to the worker pool and writes the successes.
	///
	/// Returns `Err` only when a writer failure has to abort the job; tile
	/// failures are reported through the counters.
	async fn process_chunk(&mut self, chunk: Vec<WorkItem>, workers: usize, fail_on_error: bool) -> Result<ChunkResult> {
		let start = Instant::now();
		let chunk_id = chunk[0].chunk_id;
		let pool = workers.clamp(1, chunk.len().max(1));

		let mut results: Vec<WorkResult> = stream::iter(chunk.into_iter().map(|item| {
			let fetcher = Arc::clone(&self.fetcher);
			let processor = Arc::clone(&self.processor);
			let cancel = self.cancel.clone();
			run_item(fetcher, processor, cancel, item)
		}))
		.buffer_unordered(pool)
		.collect()
		.await;

		let mut tiles = Vec::new();
		let mut failure_count = 0usize;
		for result in results.drain(..) {
			match result.result {
				Ok(tile) => tiles.push(tile),
				Err(error) => {
					failure_count += 1;
					log::warn!(
						"tile {} failed after {} attempts: {error:#}",
						result.coord,
						result.attempts
					);
				}
			}
		}
		let success_count = tiles.len();

		if !tiles.is_empty() {
			if let Err(error) = self.writer.write_batch(&tiles) {
				if fail_on_error {
					return Err(error.context("failed to write batch"));
				}
				log::error!("failed to write batch for chunk {chunk_id}: {error:#}");
			}
		}

		Ok(ChunkResult {
			chunk_id,
			success_count,
			failure_count,
			duration: start.elapsed(),
		})
	}

	fn finish_with_error(&mut self, job: &mut Job, status: JobStatus, error: anyhow::Error) -> Result<()> {
		// Close so partially written output (gzip trailers included) is intact.
		if let Err(close_error) = self.writer.close() {
			log::error!("failed to close output writer: {close_error:#}");
		}
		job.status = status;
		job.completed_at = Some(Instant::now());
		job.error = Some(format!("{error:#}"));
		if let Some(reporter) = self.reporter.as_mut() {
			reporter.report_job_failed(job, &error);
		}
		Err(error)
	}
}

/// Processes one work item: up to [`WORKER_ATTEMPTS`] rounds of
/// fetch-with-retry plus conversion, sleeping `attempt` seconds between
/// rounds. A non-retryable fetch failure ends the rounds early.
async fn run_item(
	fetcher: Arc<dyn Fetcher>,
	processor: Arc<TileProcessor>,
	cancel: CancellationToken,
	item: WorkItem,
) -> WorkResult {
	let start = Instant::now();
	let coord = item.request.coord;
	let mut attempts = 0u32;
	let mut last_error: Option<anyhow::Error> = None;

	for attempt in 0..WORKER_ATTEMPTS {
		if cancel.is_cancelled() {
			return WorkResult {
				coord,
				chunk_id: item.chunk_id,
				attempts,
				duration: start.elapsed(),
				result: Err(last_error.unwrap_or_else(|| anyhow!("job canceled"))),
			};
		}
		if attempt > 0 {
			sleep(Duration::from_secs(attempt as u64)).await;
		}
		attempts += 1;

		match fetcher.fetch_with_retry(&item.request).await {
			Ok(response) => match processor.process(&response) {
				Ok(tile) => {
					return WorkResult {
						coord,
						chunk_id: item.chunk_id,
						attempts,
						duration: start.elapsed(),
						result: Ok(tile),
					};
				}
				Err(error) => last_error = Some(error.context("conversion failed")),
			},
			Err(error) => {
				let retryable = error.is_retryable();
				last_error = Some(anyhow::Error::new(error).context("fetch failed"));
				if !retryable {
					break;
				}
			}
		}
	}

	WorkResult {
		coord,
		chunk_id: item.chunk_id,
		attempts,
		duration: start.elapsed(),
		result: Err(last_error.expect("at least one attempt was made")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::batch::types::JobConfig;
	use crate::config::Config;
	use crate::fetch::FetchError;
	use crate::types::{ProcessedTile, TileRequest, TileResponse};
	use async_trait::async_trait;
	use std::collections::HashMap;
	use std::sync::Mutex;
	use tile2json_core::io::ValueWriter;
	use tile2json_core::{Blob, TileCoord, TileRange};

	/// Minimal MVT payload: one layer, one point feature.
	fn tile_bytes() -> Blob {
		let mut geometry = ValueWriter::new();
		geometry.write_varint((1 << 3) | 1);
		geometry.write_svarint(100);
		geometry.write_svarint(200);

		let mut feature = ValueWriter::new();
		feature.write_pbf_key(3, 0);
		feature.write_varint(1);
		feature.write_pbf_key(4, 2);
		feature.write_pbf_blob(&geometry.into_blob());

		let mut layer = ValueWriter::new();
		layer.write_pbf_key(1, 2);
		layer.write_pbf_string("places");
		layer.write_pbf_key(2, 2);
		layer.write_pbf_blob(&feature.into_blob());

		let mut tile = ValueWriter::new();
		tile.write_pbf_key(3, 2);
		tile.write_pbf_blob(&layer.into_blob());
		tile.into_blob()
	}

	/// What the mock returns for one coordinate.
	enum Behavior {
		Success,
		ServerError,
		NotFound,
	}

	struct MockFetcher {
		behaviors: HashMap<String, Behavior>,
		fetch_calls: Mutex<HashMap<String, u32>>,
	}

	impl MockFetcher {
		fn new(behaviors: Vec<(TileCoord, Behavior)>) -> MockFetcher {
			MockFetcher {
				behaviors: behaviors.into_iter().map(|(c, b)| (c.to_string(), b)).collect(),
				fetch_calls: Mutex::new(HashMap::new()),
			}
		}

		fn calls_for(&self, coord: &TileCoord) -> u32 {
			*self.fetch_calls.lock().unwrap().get(&coord.to_string()).unwrap_or(&0)
		}
	}

	#[async_trait]
	impl Fetcher for MockFetcher {
		async fn fetch(&self, request: &TileRequest) -> Result<TileResponse, FetchError> {
			let key = request.coord.to_string();
			*self.fetch_calls.lock().unwrap().entry(key.clone()).or_insert(0) += 1;

			match self.behaviors.get(&key) {
				Some(Behavior::Success) | None => Ok(TileResponse {
					coord: request.coord,
					data: tile_bytes(),
					status: 200,
					headers: vec![],
					fetch_time: Duration::ZERO,
				}),
				Some(Behavior::ServerError) => Err(FetchError::ServerError {
					status: 500,
					message: String::from("boom"),
				}),
				Some(Behavior::NotFound) => Err(FetchError::NotFound(key)),
			}
		}

		async fn fetch_with_retry(&self, request: &TileRequest) -> Result<TileResponse, FetchError> {
			// The mock performs a single attempt so tests can count calls.
			self.fetch(request).await
		}
	}

	/// Records written tiles; shared handle lets tests inspect them.
	#[derive(Clone)]
	struct CollectingWriter {
		batches: Arc<Mutex<Vec<Vec<TileCoord>>>>,
		closed: Arc<Mutex<bool>>,
	}

	impl CollectingWriter {
		fn new() -> CollectingWriter {
			CollectingWriter {
				batches: Arc::new(Mutex::new(Vec::new())),
				closed: Arc::new(Mutex::new(false)),
			}
		}

		fn written(&self) -> Vec<TileCoord> {
			self.batches.lock().unwrap().iter().flatten().copied().collect()
		}

		fn batch_count(&self) -> usize {
			self.batches.lock().unwrap().len()
		}
	}

	impl Writer for CollectingWriter {
		fn write(&mut self, tile: &ProcessedTile) -> Result<()> {
			self.batches.lock().unwrap().push(vec![tile.coord]);
			Ok(())
		}

		fn write_batch(&mut self, tiles: &[ProcessedTile]) -> Result<()> {
			self
				.batches
				.lock()
				.unwrap()
				.push(tiles.iter().map(|t| t.coord).collect());
			Ok(())
		}

		fn close(&mut self) -> Result<()> {
			*self.closed.lock().unwrap() = true;
			Ok(())
		}

		fn bytes_written(&self) -> u64 {
			self.written().len() as u64
		}
	}

	fn executor_with(
		fetcher: MockFetcher,
		writer: CollectingWriter,
	) -> (BatchExecutor, Arc<MockFetcher>) {
		let mut config = Config::default();
		config.server.base_url = String::from("https://ex/tiles");
		let factory = FetcherFactory::new(config.clone());
		let fetcher = Arc::new(fetcher);
		let processor = Arc::new(TileProcessor::from_config(&config).unwrap());
		let executor = BatchExecutor::new(
			factory,
			fetcher.clone(),
			processor,
			Box::new(writer),
			None,
		);
		(executor, fetcher)
	}

	fn job_with(ranges: Vec<TileRange>, config: JobConfig) -> Job {
		Job::new(String::from("job-test"), ranges, config)
	}

	#[tokio::test]
	async fn successful_job_completes_with_counters() {
		let writer = CollectingWriter::new();
		let (mut executor, _) = executor_with(MockFetcher::new(vec![]), writer.clone());
		let mut job = job_with(
			vec![TileRange::new(3, 3, 0, 1, 0, 1).unwrap()],
			JobConfig::default(),
		);

		executor.process(&mut job).await.unwrap();

		assert_eq!(job.status, JobStatus::Completed);
		assert_eq!(job.progress.total_tiles, 4);
		assert_eq!(job.progress.processed, 4);
		assert_eq!(job.progress.success, 4);
		assert_eq!(job.progress.failed, 0);
		assert_eq!(job.progress.processed, job.progress.success + job.progress.failed);
		assert_eq!(writer.written().len(), 4);
		assert!(*writer.closed.lock().unwrap());
	}

	#[tokio::test(start_paused = true)]
	async fn tile_failures_are_counted_not_fatal() {
		let bad = TileCoord::new(3, 0, 0).unwrap();
		let writer = CollectingWriter::new();
		let (mut executor, _) = executor_with(
			MockFetcher::new(vec![(bad, Behavior::ServerError)]),
			writer.clone(),
		);
		let mut job = job_with(
			vec![TileRange::new(3, 3, 0, 0, 0, 1).unwrap()],
			JobConfig::default(),
		);

		executor.process(&mut job).await.unwrap();

		assert_eq!(job.status, JobStatus::Completed);
		assert_eq!(job.progress.success, 1);
		assert_eq!(job.progress.failed, 1);
		assert_eq!(job.progress.processed, 2);
		assert_eq!(writer.written(), vec![TileCoord::new(3, 0, 1).unwrap()]);
	}

	#[tokio::test(start_paused = true)]
	async fn fail_on_error_aborts_the_job() {
		let bad = TileCoord::new(3, 0, 0).unwrap();
		let writer = CollectingWriter::new();
		let (mut executor, _) = executor_with(
			MockFetcher::new(vec![(bad, Behavior::ServerError)]),
			writer.clone(),
		);
		let mut job = job_with(
			vec![TileRange::new(3, 3, 0, 0, 0, 1).unwrap()],
			JobConfig {
				fail_on_error: true,
				..JobConfig::default()
			},
		);

		let error = executor.process(&mut job).await.err().unwrap();
		assert_eq!(job.status, JobStatus::Failed);
		assert!(job.error.is_some());
		assert!(format!("{error:#}").contains("failed tiles"));
		assert!(job.progress.failed >= 1);
	}

	#[tokio::test]
	async fn cancellation_before_start_cancels_the_job() {
		let writer = CollectingWriter::new();
		let (mut executor, _) = executor_with(MockFetcher::new(vec![]), writer.clone());
		executor.cancellation_token().cancel();

		let mut job = job_with(
			vec![TileRange::new(3, 3, 0, 1, 0, 1).unwrap()],
			JobConfig::default(),
		);

		assert!(executor.process(&mut job).await.is_err());
		assert_eq!(job.status, JobStatus::Canceled);
		assert!(writer.written().is_empty());
	}

	#[tokio::test]
	async fn chunks_are_sequential_and_sized() {
		let writer = CollectingWriter::new();
		let (mut executor, _) = executor_with(MockFetcher::new(vec![]), writer.clone());
		let mut job = job_with(
			vec![TileRange::new(4, 4, 0, 4, 0, 0).unwrap()],
			JobConfig {
				chunk_size: 2,
				..JobConfig::default()
			},
		);

		executor.process(&mut job).await.unwrap();

		assert_eq!(job.progress.total_chunks, 3);
		assert_eq!(job.progress.current_chunk, 3);
		// one write_batch per chunk, chunk order follows enumeration
		assert_eq!(writer.batch_count(), 3);
		let batches = writer.batches.lock().unwrap();
		assert_eq!(batches[0].len(), 2);
		assert_eq!(batches[1].len(), 2);
		assert_eq!(batches[2].len(), 1);
		let mut flattened: Vec<u32> = batches.iter().flatten().map(|c| c.x).collect();
		// within a chunk order is nondeterministic; across chunks it follows
		// the enumeration
		flattened[0..2].sort_unstable();
		flattened[2..4].sort_unstable();
		assert_eq!(flattened, vec![0, 1, 2, 3, 4]);
	}

	#[tokio::test]
	async fn non_retryable_failures_make_a_single_attempt() {
		let missing = TileCoord::new(3, 0, 0).unwrap();
		let writer = CollectingWriter::new();
		let (mut executor, fetcher) = executor_with(
			MockFetcher::new(vec![(missing, Behavior::NotFound)]),
			writer.clone(),
		);
		let mut job = job_with(
			vec![TileRange::new(3, 3, 0, 0, 0, 0).unwrap()],
			JobConfig::default(),
		);

		executor.process(&mut job).await.unwrap();

		assert_eq!(job.progress.failed, 1);
		assert_eq!(fetcher.calls_for(&missing), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn retryable_failures_use_all_worker_attempts() {
		let flaky = TileCoord::new(3, 0, 0).unwrap();
		let writer = CollectingWriter::new();
		let (mut executor, fetcher) = executor_with(
			MockFetcher::new(vec![(flaky, Behavior::ServerError)]),
			writer.clone(),
		);
		let mut job = job_with(
			vec![TileRange::new(3, 3, 0, 0, 0, 0).unwrap()],
			JobConfig::default(),
		);

		executor.process(&mut job).await.unwrap();

		assert_eq!(job.progress.failed, 1);
		assert_eq!(fetcher.calls_for(&flaky), WORKER_ATTEMPTS);
	}

	#[tokio::test]
	async fn empty_range_list_completes_immediately() {
		let writer = CollectingWriter::new();
		let (mut executor, _) = executor_with(MockFetcher::new(vec![]), writer.clone());
		let mut job = job_with(vec![], JobConfig::default());

		executor.process(&mut job).await.unwrap();
		assert_eq!(job.status, JobStatus::Completed);
		assert_eq!(job.progress.total_tiles, 0);
		assert_eq!(job.progress.progress_pct(), 0.0);
	}
}
