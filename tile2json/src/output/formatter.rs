//! Rendering processed tiles to JSON text.

use crate::types::{ProcessedTile, TileMetadata};
use anyhow::{Result, bail};
use std::str::FromStr;
use tile2json_core::TileCoord;
use tile2json_core::json::{JsonArray, JsonObject, JsonValue};

/// Output document shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
	/// A bare GeoJSON FeatureCollection.
	#[default]
	GeoJson,
	/// A JSON envelope `{ coordinate, data [, metadata] }`.
	Json,
}

impl Format {
	/// File extension for this format (without compression suffix).
	#[must_use]
	pub fn extension(&self) -> &'static str {
		match self {
			Format::GeoJson => ".geojson",
			Format::Json => ".json",
		}
	}
}

impl FromStr for Format {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"geojson" => Ok(Format::GeoJson),
			"json" => Ok(Format::Json),
			other => bail!("unsupported format: {other:?}, must be 'geojson' or 'json'"),
		}
	}
}

/// Renders tiles in a fixed format/pretty/metadata configuration.
#[derive(Clone, Debug)]
pub struct Formatter {
	format: Format,
	pretty: bool,
	metadata: bool,
}

impl Formatter {
	pub fn new(format: Format, pretty: bool, metadata: bool) -> Formatter {
		Formatter {
			format,
			pretty,
			metadata,
		}
	}

	#[must_use]
	pub fn format(&self) -> Format {
		self.format
	}

	fn render(&self, value: JsonValue) -> String {
		if self.pretty {
			value.stringify_pretty()
		} else {
			value.stringify()
		}
	}

	/// Renders a single tile.
	#[must_use]
	pub fn format_tile(&self, tile: &ProcessedTile) -> String {
		match self.format {
			Format::GeoJson => {
				let mut json = tile.collection.to_json();
				if self.metadata {
					json.set("_metadata", metadata_json(&tile.coord, &tile.metadata));
				}
				self.render(json.into())
			}
			Format::Json => {
				let mut json = JsonObject::new();
				json.set("coordinate", coordinate_json(&tile.coord));
				json.set("data", tile.collection.to_json());
				if self.metadata {
					json.set("metadata", metadata_json(&tile.coord, &tile.metadata));
				}
				self.render(json.into())
			}
		}
	}

	/// Renders a batch of tiles as one document.
	///
	/// GeoJSON: the union of all features in one FeatureCollection, each
	/// feature tagged with `properties._tile = "z/x/y"`. JSON: a `tiles`
	/// array of per-tile envelopes plus a `summary`.
	#[must_use]
	pub fn format_batch(&self, tiles: &[ProcessedTile]) -> String {
		match self.format {
			Format::GeoJson => {
				let mut features = JsonArray::new();
				let mut total_features = 0usize;
				for tile in tiles {
					let tag = tile.coord.to_string();
					for feature in &tile.collection.features {
						let mut tagged = feature.clone();
						tagged.set_property("_tile", tag.as_str());
						features.push(tagged.to_json());
						total_features += 1;
					}
				}

				let mut json = JsonObject::new();
				json.set("type", "FeatureCollection");
				json.set("features", features);
				if self.metadata {
					let mut meta = JsonObject::new();
					meta.set("total_tiles", tiles.len());
					meta.set("total_features", total_features);
					json.set("_metadata", meta);
				}
				self.render(json.into())
			}
			Format::Json => {
				let mut entries = JsonArray::new();
				for tile in tiles {
					let mut entry = JsonObject::new();
					entry.set("coordinate", coordinate_json(&tile.coord));
					entry.set("data", tile.collection.to_json());
					if self.metadata {
						entry.set("metadata", metadata_json(&tile.coord, &tile.metadata));
					}
					entries.push(entry);
				}

				let mut json = JsonObject::new();
				json.set("tiles", entries);
				let mut summary = JsonObject::new();
				summary.set("total_tiles", tiles.len());
				summary.set(
					"total_features",
					tiles.iter().map(|t| t.collection.len()).sum::<usize>(),
				);
				json.set("summary", summary);
				self.render(json.into())
			}
		}
	}
}

fn coordinate_json(coord: &TileCoord) -> JsonObject {
	let mut json = JsonObject::new();
	json.set("z", coord.z as u64);
	json.set("x", coord.x as u64);
	json.set("y", coord.y as u64);
	json
}

fn metadata_json(coord: &TileCoord, metadata: &TileMetadata) -> JsonObject {
	let mut json = JsonObject::new();
	json.set("tile_coordinate", coordinate_json(coord));
	json.set(
		"layers",
		metadata
			.layers
			.iter()
			.map(|name| JsonValue::from(name.as_str()))
			.collect::<JsonArray>(),
	);
	json.set("feature_count", metadata.feature_count);
	json.set("size_bytes", metadata.size_bytes);
	json.set("process_time_ms", metadata.process_time.as_secs_f64() * 1000.0);
	json.set("version", metadata.version);
	json.set("extent", metadata.extent);
	json.set("compressed", metadata.compressed);
	json
}
