//! Single-tile conversion flow: local file in, pretty GeoJSON out.

mod common;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::fs;
use tile2json::config::Config;
use tile2json::fetch::{Fetcher, LocalFetcher};
use tile2json::output::{Format, Formatter, new_writer};
use tile2json::processor::TileProcessor;
use tile2json::types::TileRequest;
use tile2json_core::TileCoord;

#[tokio::test]
async fn local_file_to_pretty_geojson() {
	let tiles = TempDir::new().unwrap();
	let tile = common::places_tile(2048, 2048, "X");
	let tile_file = tiles.child("14/8362/5956.mvt");
	tile_file.write_binary(tile.as_slice()).unwrap();

	let out = TempDir::new().unwrap();
	let destination = out.path().join("tile.geojson");

	let config = Config::default();
	let fetcher = LocalFetcher::new(&config);
	let request = TileRequest::new(
		TileCoord::new(14, 8362, 5956).unwrap(),
		tile_file.path().to_string_lossy().into_owned(),
	);

	let response = fetcher.fetch_with_retry(&request).await.unwrap();
	let processed = TileProcessor::from_config(&config).unwrap().process(&response).unwrap();

	let formatter = Formatter::new(Format::GeoJson, true, false);
	let mut writer = new_writer(formatter, destination.to_str().unwrap(), false, false).unwrap();
	writer.write(&processed).unwrap();
	writer.close().unwrap();

	let text = fs::read_to_string(&destination).unwrap();
	assert!(text.contains("\"type\": \"FeatureCollection\""));
	assert!(text.contains("\"type\": \"Feature\""));
	assert!(text.contains("\"_layer\": \"places\""));
	assert!(text.contains("\"name\": \"X\""));
	// pretty output is indented
	assert!(text.starts_with("{\n  "));

	// the point landed at the Web Mercator center of the tile
	assert!(text.contains("417040.4"));
	assert!(text.contains("5467999.2"));
}

#[tokio::test]
async fn metadata_block_is_attached_on_request() {
	let tiles = TempDir::new().unwrap();
	let tile = common::places_tile(0, 0, "X");
	let tile_file = tiles.child("3/1/2.mvt");
	tile_file.write_binary(tile.as_slice()).unwrap();

	let config = Config::default();
	let fetcher = LocalFetcher::new(&config);
	let request = TileRequest::new(
		TileCoord::new(3, 1, 2).unwrap(),
		tile_file.path().to_string_lossy().into_owned(),
	);
	let response = fetcher.fetch_with_retry(&request).await.unwrap();
	let processed = TileProcessor::from_config(&config).unwrap().process(&response).unwrap();

	let formatter = Formatter::new(Format::GeoJson, false, true);
	let text = formatter.format_tile(&processed);
	assert!(text.contains("\"_metadata\""));
	assert!(text.contains("\"tile_coordinate\":{\"x\":1,\"y\":2,\"z\":3}"));
	assert!(text.contains("\"layers\":[\"places\"]"));
}
