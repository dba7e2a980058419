//! The `batch` subcommand: ranges of tiles through the chunked executor.

use crate::batch::{BatchExecutor, ConsoleReporter, Job, JobConfig, JobStatus, ProgressReporter};
use crate::config::{self, Config};
use crate::fetch::FetcherFactory;
use crate::output::{Format, Formatter, new_writer};
use crate::processor::TileProcessor;
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tile2json_core::{GeoBBox, TileCoord, TileRange};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true)]
pub struct Subcommand {
	/// Single zoom level to process
	#[arg(long, conflicts_with_all = ["min_zoom", "max_zoom"])]
	zoom: Option<u8>,

	/// Minimum zoom level
	#[arg(long)]
	min_zoom: Option<u8>,

	/// Maximum zoom level
	#[arg(long)]
	max_zoom: Option<u8>,

	/// Bounding box 'min_lon,min_lat,max_lon,max_lat'.
	/// Boxes crossing the antimeridian are rejected; split them at ±180°.
	#[arg(long, allow_hyphen_values = true, value_name = "BBOX")]
	bbox: Option<String>,

	/// Specific tiles 'z/x/y,z/x/y,...'
	#[arg(long, value_name = "TILES")]
	tiles: Option<String>,

	/// Output directory for per-tile files
	#[arg(long, conflicts_with = "output", value_name = "DIR")]
	output_dir: Option<String>,

	/// Single output file (with --single-file)
	#[arg(long, short, value_name = "FILE")]
	output: Option<String>,

	/// Combine all tiles into a single file
	#[arg(long, conflicts_with = "multi_file")]
	single_file: bool,

	/// Write each tile to its own file (the default)
	#[arg(long)]
	multi_file: bool,

	/// Tiles per processing chunk
	#[arg(long, value_name = "N")]
	chunk_size: Option<usize>,

	/// Stop processing on the first failed chunk
	#[arg(long)]
	fail_on_error: bool,

	/// Show a progress line on stderr
	#[arg(long, action = clap::ArgAction::Set, default_value_t = true, value_name = "BOOL")]
	progress: bool,

	/// Seconds between progress updates
	#[arg(long, value_name = "SECONDS")]
	progress_interval: Option<u64>,

	/// Resume a previous batch job (not implemented)
	#[arg(long, requires = "job_id")]
	resume: bool,

	/// Job id for --resume
	#[arg(long)]
	job_id: Option<String>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand, mut config: Config) -> Result<()> {
	if let Some(chunk_size) = arguments.chunk_size {
		config.batch.chunk_size = chunk_size;
	}
	if arguments.fail_on_error {
		config.batch.fail_on_error = true;
	}

	config::validate(&config)?;

	if arguments.resume {
		bail!("resume is not implemented yet");
	}

	let ranges = build_ranges(arguments)?;
	if ranges.is_empty() {
		bail!("no tiles to process: specify --zoom, --min-zoom/--max-zoom or --tiles");
	}
	let total: u64 = ranges.iter().map(TileRange::count).sum();
	log::info!("processing {total} tiles across {} ranges", ranges.len());

	let format: Format = config.output.format.parse()?;
	let formatter = Formatter::new(format, config.output.pretty, config.output.metadata);
	let writer = if arguments.single_file {
		let destination = arguments
			.output
			.as_deref()
			.ok_or_else(|| anyhow::anyhow!("an output file must be specified when using --single-file"))?;
		new_writer(formatter, destination, false, config.output.compression)?
	} else if config.output.stdout && arguments.output_dir.is_none() {
		new_writer(formatter, "", false, config.output.compression)?
	} else {
		let directory = arguments.output_dir.clone().unwrap_or_else(|| {
			if config.output.directory.is_empty() {
				String::from("./output")
			} else {
				config.output.directory.clone()
			}
		});
		new_writer(formatter, &directory, true, config.output.compression)?
	};

	let factory = FetcherFactory::new(config.clone());
	let fetcher = factory.create()?;
	let processor = Arc::new(TileProcessor::from_config(&config)?);

	let reporter: Option<Box<dyn ProgressReporter>> = if arguments.progress && config.logging.progress {
		let interval = Duration::from_secs(arguments.progress_interval.unwrap_or(1));
		Some(Box::new(ConsoleReporter::with_interval(interval)))
	} else {
		None
	};

	let job_config = JobConfig {
		concurrency: config.batch.concurrency,
		chunk_size: config.batch.chunk_size,
		timeout: config.batch_timeout(),
		fail_on_error: config.batch.fail_on_error,
	};
	let mut job = Job::new(generate_job_id(), ranges, job_config);

	let mut executor = BatchExecutor::new(factory, fetcher, processor, writer, reporter);

	// Ctrl-C cancels cooperatively; in-flight fetches finish and are
	// discarded when the job exits its loop.
	let cancel = executor.cancellation_token();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			log::warn!("interrupt received, canceling job");
			cancel.cancel();
		}
	});

	log::info!("starting batch processing job: {}", job.id);
	let outcome = executor.process(&mut job).await;

	print_summary(&job);
	outcome.context("batch processing failed")
}

fn build_ranges(arguments: &Subcommand) -> Result<Vec<TileRange>> {
	if let Some(tiles) = &arguments.tiles {
		return tiles
			.split(',')
			.map(|part| {
				let coord: TileCoord = part
					.parse()
					.with_context(|| format!("invalid tile in --tiles: {part:?}"))?;
				Ok(TileRange::from_coord(coord))
			})
			.collect();
	}

	let (min_zoom, max_zoom) = match (arguments.zoom, arguments.min_zoom, arguments.max_zoom) {
		(Some(zoom), _, _) => (zoom, zoom),
		(None, Some(min), Some(max)) => (min, max),
		(None, Some(min), None) => (min, min),
		(None, None, Some(max)) => (max, max),
		(None, None, None) => bail!("zoom level(s) must be specified"),
	};
	if min_zoom > max_zoom {
		bail!("min zoom ({min_zoom}) cannot be greater than max zoom ({max_zoom})");
	}

	let bbox = arguments
		.bbox
		.as_deref()
		.map(|text| text.parse::<GeoBBox>().context("failed to parse bounding box"))
		.transpose()?;

	(min_zoom..=max_zoom)
		.map(|z| match &bbox {
			Some(bbox) => TileRange::from_geo(z, bbox),
			None => TileRange::full(z),
		})
		.collect()
}

fn generate_job_id() -> String {
	let seconds = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0);
	format!("batch-{seconds}")
}

fn print_summary(job: &Job) {
	let progress = &job.progress;
	eprintln!();
	match job.status {
		JobStatus::Completed => eprintln!("Batch processing completed successfully!"),
		status => eprintln!("Batch processing ended: {status}"),
	}
	eprintln!("Processed: {} tiles", progress.processed);
	eprintln!("Success: {}, Failed: {}", progress.success, progress.failed);
	if let Some(started) = job.started_at {
		eprintln!("Duration: {:?}", started.elapsed());
	}
	eprintln!("Throughput: {:.2} tiles/second", progress.throughput);
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;

	#[derive(Parser, Debug)]
	struct TestCli {
		#[command(flatten)]
		args: Subcommand,
	}

	fn parse(args: &[&str]) -> Result<Subcommand, clap::Error> {
		let mut full = vec!["batch"];
		full.extend_from_slice(args);
		TestCli::try_parse_from(full).map(|cli| cli.args)
	}

	#[test]
	fn zoom_conflicts_with_min_max() {
		assert!(parse(&["--zoom", "5", "--min-zoom", "4"]).is_err());
		assert!(parse(&["--zoom", "5", "--max-zoom", "6"]).is_err());
	}

	#[test]
	fn single_file_conflicts_with_multi_file() {
		assert!(parse(&["--zoom", "5", "--single-file", "--multi-file"]).is_err());
	}

	#[test]
	fn output_dir_conflicts_with_output() {
		assert!(parse(&["--zoom", "5", "--output-dir", "a", "-o", "b"]).is_err());
	}

	#[test]
	fn resume_requires_job_id() {
		assert!(parse(&["--resume"]).is_err());
		assert!(parse(&["--resume", "--job-id", "batch-1"]).is_ok());
	}

	#[test]
	fn ranges_from_single_zoom_and_bbox() {
		let args = parse(&["--zoom", "14", "--bbox", "-74.0,40.7,-73.9,40.8"]).unwrap();
		let ranges = build_ranges(&args).unwrap();
		assert_eq!(ranges.len(), 1);
		assert_eq!(ranges[0].min_z, 14);
		assert_eq!((ranges[0].min_x, ranges[0].max_x), (4824, 4828));
		assert_eq!((ranges[0].min_y, ranges[0].max_y), (6154, 6160));
	}

	#[test]
	fn ranges_from_zoom_span() {
		let args = parse(&["--min-zoom", "1", "--max-zoom", "3", "--bbox", "0,0,10,10"]).unwrap();
		let ranges = build_ranges(&args).unwrap();
		assert_eq!(ranges.len(), 3);
		assert_eq!(ranges[0].min_z, 1);
		assert_eq!(ranges[2].min_z, 3);
	}

	#[test]
	fn ranges_from_tiles_list() {
		let args = parse(&["--tiles", "3/1/2,4/5/6"]).unwrap();
		let ranges = build_ranges(&args).unwrap();
		assert_eq!(ranges.len(), 2);
		assert_eq!(ranges.iter().map(TileRange::count).sum::<u64>(), 2);
	}

	#[test]
	fn tiles_list_rejects_garbage() {
		let args = parse(&["--tiles", "3/1"]).unwrap();
		assert!(build_ranges(&args).is_err());
	}

	#[test]
	fn antimeridian_bbox_is_rejected() {
		let args = parse(&["--zoom", "5", "--bbox", "170,40,-170,41"]).unwrap();
		let err = build_ranges(&args).err().unwrap();
		assert!(format!("{err:#}").contains("antimeridian"));
	}

	#[test]
	fn missing_zoom_is_an_error() {
		let args = parse(&["--bbox", "0,0,1,1"]).unwrap();
		assert!(build_ranges(&args).is_err());
	}

	#[test]
	fn full_level_without_bbox() {
		let args = parse(&["--zoom", "2"]).unwrap();
		let ranges = build_ranges(&args).unwrap();
		assert_eq!(ranges[0].count(), 16);
	}
}
