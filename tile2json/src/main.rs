//! # tile2json CLI
//!
//! Convert Mapbox Vector Tiles to GeoJSON.
//!
//! ## Subcommands
//! - **convert**: Convert a single tile (by URL, file path or coordinates).
//! - **batch**: Convert tile ranges concurrently.
//!
//! ## Examples
//! ```sh
//! # Convert a single remote tile
//! tile2json convert --url "https://example.com/tiles/14/8362/5956.mvt" -o tile.geojson
//!
//! # Convert a local tile to stdout, pretty-printed
//! tile2json convert --file /tiles/14/8362/5956.mvt --pretty true
//!
//! # Convert by coordinates against a tile server
//! tile2json convert --base-url "https://example.com/tiles" --z 14 --x 8362 --y 5956
//!
//! # Batch process a bounding box into a tile tree
//! tile2json batch --base-path /tiles --zoom 14 --bbox "-74.0,40.7,-73.9,40.8" --output-dir out/
//!
//! # Batch into one gzipped file
//! tile2json batch --base-url "https://example.com/tiles" --zoom 10 \
//!     --bbox "13.3,52.4,13.5,52.6" -o all.geojson.gz --single-file --compression true
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use tile2json::config::Config;
use tile2json::tools;

#[derive(Parser, Debug)]
#[command(
	name = "tile2json",
	author,
	version,
	about = "Convert Mapbox Vector Tiles to GeoJSON",
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Config file (default: ./tile2json.yaml or ~/.tile2json.yaml)
	#[arg(long, global = true, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Base URL of the tile server (http source)
	#[arg(long, global = true, value_name = "URL")]
	base_url: Option<String>,

	/// Base path of the local tile tree (local source)
	#[arg(long, global = true, value_name = "DIR")]
	base_path: Option<String>,

	/// API key for bearer authentication (http source)
	#[arg(long, global = true, value_name = "KEY")]
	api_key: Option<String>,

	/// Output format (geojson, json)
	#[arg(long, short = 'f', global = true, value_name = "FORMAT")]
	format: Option<String>,

	/// Pretty-print JSON output
	#[arg(long, global = true, action = clap::ArgAction::Set, value_name = "BOOL")]
	pretty: Option<bool>,

	/// Gzip output files
	#[arg(long, global = true, action = clap::ArgAction::Set, value_name = "BOOL")]
	compression: Option<bool>,

	/// Number of concurrent workers
	#[arg(long, global = true, value_name = "N")]
	concurrency: Option<usize>,

	/// Request timeout in seconds (http source)
	#[arg(long, global = true, value_name = "SECONDS")]
	timeout: Option<u64>,

	/// Number of retry attempts per tile
	#[arg(long, global = true, value_name = "N")]
	retries: Option<u32>,

	#[arg(
		long,
		short = 'q',
		action = clap::ArgAction::Count,
		global = true,
		conflicts_with = "verbose",
		help = "Decrease logging verbosity",
		display_order = 100,
	)]
	quiet: u8,

	#[arg(
		long,
		short = 'v',
		action = clap::ArgAction::Count,
		global = true,
		help = "Increase logging verbosity (repeat for more detail)",
		display_order = 100,
	)]
	verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Convert a single Mapbox Vector Tile
	Convert(tools::convert::Subcommand),

	/// Batch process multiple Mapbox Vector Tiles
	Batch(tools::batch::Subcommand),
}

fn main() {
	let cli = Cli::parse();

	init_logger(&cli);

	if let Err(error) = run(cli) {
		eprintln!("Error: {error:#}");
		std::process::exit(1);
	}
}

fn init_logger(cli: &Cli) {
	// -v / -q step the level relative to warnings; the config file level is
	// applied later only if no flag was given (env_logger can only be
	// initialized once, so flags win here).
	let verbosity = cli.verbose as i16 - cli.quiet as i16;
	let level = match verbosity {
		i16::MIN..=-1 => LevelFilter::Off,
		0 => LevelFilter::Warn,
		1 => LevelFilter::Info,
		2 => LevelFilter::Debug,
		3..=i16::MAX => LevelFilter::Trace,
	};
	env_logger::Builder::new()
		.filter_level(level)
		.format_timestamp(None)
		.init();
}

fn run(cli: Cli) -> Result<()> {
	let mut config = Config::load(cli.config.as_deref())?;
	apply_global_flags(&cli, &mut config);

	match &cli.command {
		Commands::Convert(arguments) => tools::convert::run(arguments, config),
		Commands::Batch(arguments) => tools::batch::run(arguments, config),
	}
}

fn apply_global_flags(cli: &Cli, config: &mut Config) {
	if let Some(base_url) = &cli.base_url {
		config.server.base_url = base_url.clone();
	}
	if let Some(base_path) = &cli.base_path {
		config.local.base_path = base_path.clone();
	}
	if let Some(api_key) = &cli.api_key {
		config.server.api_key = api_key.clone();
	}
	if let Some(format) = &cli.format {
		config.output.format = format.clone();
	}
	if let Some(pretty) = cli.pretty {
		config.output.pretty = pretty;
	}
	if let Some(compression) = cli.compression {
		config.output.compression = compression;
	}
	if let Some(concurrency) = cli.concurrency {
		config.batch.concurrency = concurrency;
	}
	if let Some(timeout) = cli.timeout {
		config.server.timeout = timeout;
	}
	if let Some(retries) = cli.retries {
		config.server.max_retries = retries;
	}
	if cli.verbose > 0 {
		config.logging.verbose = true;
	}
}
