//! The `convert` subcommand: one tile in, one document out.

use crate::config::{self, Config};
use crate::fetch::{Fetcher, FetcherFactory, HttpFetcher, LocalFetcher};
use crate::output::{Format, Formatter, new_writer};
use crate::processor::TileProcessor;
use crate::types::{SourceType, TileRequest};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tile2json_core::TileCoord;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true)]
pub struct Subcommand {
	/// Direct URL of the remote tile
	#[arg(long, conflicts_with_all = ["file", "z", "x", "y"])]
	url: Option<String>,

	/// Direct path of the local tile file
	#[arg(long, conflicts_with_all = ["z", "x", "y"])]
	file: Option<String>,

	/// Tile zoom level (with --x and --y)
	#[arg(long, requires_all = ["x", "y"])]
	z: Option<u8>,

	/// Tile x coordinate
	#[arg(long, requires_all = ["z", "y"])]
	x: Option<u32>,

	/// Tile y coordinate
	#[arg(long, requires_all = ["z", "x"])]
	y: Option<u32>,

	/// Override the source type (http, local)
	#[arg(long, value_name = "TYPE")]
	source_type: Option<String>,

	/// Output file path; '-' or empty writes to stdout
	#[arg(long, short)]
	output: Option<String>,

	/// Include tile metadata in the output
	#[arg(long)]
	metadata: bool,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand, mut config: Config) -> Result<()> {
	if let Some(source_type) = &arguments.source_type {
		match source_type.as_str() {
			"http" | "local" => config.source.r#type = source_type.clone(),
			other => bail!("invalid source type: {other:?} (must be 'http' or 'local')"),
		}
	}

	// The tile coordinate drives both path templates and the geometry
	// transform; direct URL/file inputs fall back to 0/0/0 when no
	// coordinates are given.
	let coord = match (arguments.z, arguments.x, arguments.y) {
		(Some(z), Some(x), Some(y)) => TileCoord::new(z, x, y).context("invalid tile coordinates")?,
		_ => {
			if arguments.url.is_none() && arguments.file.is_none() {
				bail!("must specify either --url, --file, or --z/--x/--y coordinates");
			}
			TileCoord::new(0, 0, 0)?
		}
	};

	let (fetcher, request): (Arc<dyn Fetcher>, TileRequest) = if let Some(url) = &arguments.url {
		config::validate_sections(&config)?;
		log::info!("fetching tile from URL: {url}");
		(
			Arc::new(HttpFetcher::new(&config)?),
			TileRequest::new(coord, url.clone()),
		)
	} else if let Some(file) = &arguments.file {
		config::validate_sections(&config)?;
		log::info!("reading tile from file: {file}");
		(
			Arc::new(LocalFetcher::new(&config)),
			TileRequest::new(coord, file.clone()),
		)
	} else {
		config::validate_sections(&config)?;
		let factory = FetcherFactory::new(config.clone());
		let source_type = factory.source_type();
		let fetcher = factory.create_for_type(source_type)?;
		let request = factory.request_for(coord);
		match source_type {
			SourceType::Http => log::info!("fetching tile from URL: {}", request.locator),
			SourceType::Local => log::info!("reading tile from: {}", config.tile_path(&coord)),
		}
		(fetcher, request)
	};

	let response = fetcher
		.fetch_with_retry(&request)
		.await
		.with_context(|| format!("failed to fetch tile {coord}"))?;

	log::debug!("processing tile data ({} bytes)", response.data.len());

	let processor = TileProcessor::from_config(&config)?;
	let tile = processor.process(&response)?;

	let format: Format = config.output.format.parse()?;
	let formatter = Formatter::new(format, config.output.pretty, arguments.metadata);
	let destination = arguments.output.as_deref().unwrap_or("");
	let mut writer = new_writer(formatter, destination, false, config.output.compression)?;

	writer.write(&tile).context("failed to write output")?;
	writer.close()?;

	if destination.is_empty() || destination == "-" {
		log::info!("tile converted successfully to stdout");
	} else {
		log::info!("tile converted successfully to: {destination}");
	}
	log::info!(
		"features: {}, layers: {:?}, size: {} bytes",
		tile.metadata.feature_count,
		tile.metadata.layers,
		tile.metadata.size_bytes
	);

	Ok(())
}
