//! MVT → GeoJSON conversion.
//!
//! [`Converter`] turns a raw tile payload into a feature collection:
//! decode, layer filter, property filter, `_layer` tagging, coordinate
//! promotion to Web Mercator, optional simplification and optional WGS-84
//! conversion. [`TileProcessor`] wraps it for the pipeline, turning a
//! [`TileResponse`] into a [`ProcessedTile`] with metadata.

use crate::config::{Config, ConversionConfig};
use crate::types::{ProcessedTile, TileMetadata, TileResponse};
use anyhow::{Context, Result, bail};
use std::time::Instant;
use tile2json_core::{Blob, TileCoord};
use tile2json_geometry::geo::{GeoCollection, GeoFeature};
use tile2json_geometry::simplify::simplify_geometry;
use tile2json_geometry::transform::{mercator_to_wgs84, tile_to_mercator};
use tile2json_geometry::vector_tile::decode;

/// Douglas–Peucker tolerance, in output units.
const SIMPLIFY_TOLERANCE: f64 = 1.0;

/// Output coordinate reference system.
///
/// The default is Web Mercator meters, matching the tile grid; `wgs84`
/// opts into RFC 7946 longitude/latitude degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoordinateSystem {
	#[default]
	WebMercator,
	Wgs84,
}

impl CoordinateSystem {
	pub fn parse(value: &str) -> Result<CoordinateSystem> {
		match value {
			"web-mercator" => Ok(CoordinateSystem::WebMercator),
			"wgs84" => Ok(CoordinateSystem::Wgs84),
			other => bail!("invalid coordinate system: {other:?}, must be 'web-mercator' or 'wgs84'"),
		}
	}
}

/// Options controlling one conversion.
#[derive(Clone, Debug, Default)]
pub struct ConversionOptions {
	/// Layers to keep; empty accepts all.
	pub layer_filter: Vec<String>,
	/// Property keys to keep; empty accepts all.
	pub property_filter: Vec<String>,
	pub simplify: bool,
	pub coordinate_system: CoordinateSystem,
}

impl ConversionOptions {
	pub fn from_config(config: &ConversionConfig) -> Result<ConversionOptions> {
		Ok(ConversionOptions {
			layer_filter: config.layer_filter.clone(),
			property_filter: config.property_filter.clone(),
			simplify: config.simplify,
			coordinate_system: CoordinateSystem::parse(&config.coordinate_system)?,
		})
	}
}

/// Facts about one conversion.
#[derive(Clone, Debug)]
pub struct ConversionMetadata {
	/// Decoded layer names, sorted (before filtering).
	pub layers: Vec<String>,
	/// Number of features emitted.
	pub feature_count: usize,
	pub version: u32,
	pub extent: u32,
	pub tile_id: String,
}

/// Converts MVT payloads to GeoJSON feature collections.
///
/// Stateless apart from its options; safe to share across workers.
pub struct Converter {
	options: ConversionOptions,
}

impl Converter {
	pub fn new(options: ConversionOptions) -> Converter {
		Converter { options }
	}

	pub fn convert(&self, data: &Blob, coord: TileCoord) -> Result<(GeoCollection, ConversionMetadata)> {
		let tile = decode(data, coord).with_context(|| format!("failed to decode tile {coord}"))?;

		let mut collection = GeoCollection::new();

		for (layer_name, layer) in &tile.layers {
			if !self.options.layer_filter.is_empty() && !self.options.layer_filter.contains(layer_name) {
				continue;
			}

			let promote = tile_to_mercator(coord, layer.extent);

			for decoded in &layer.features {
				let mut feature = GeoFeature::new(decoded.geometry.map_points(&promote));
				feature.id = decoded.id;

				for (key, value) in decoded.properties.iter() {
					if !self.options.property_filter.is_empty() && !self.options.property_filter.contains(key) {
						continue;
					}
					feature.properties.insert(key.clone(), value.clone());
				}
				feature.set_property("_layer", layer_name.as_str());

				if self.options.simplify {
					feature.geometry = simplify_geometry(&feature.geometry, SIMPLIFY_TOLERANCE);
				}
				if self.options.coordinate_system == CoordinateSystem::Wgs84 {
					feature.geometry = feature.geometry.map_points(mercator_to_wgs84);
				}

				collection.features.push(feature);
			}
		}

		let metadata = ConversionMetadata {
			layers: tile.layer_names(),
			feature_count: collection.len(),
			version: tile.version,
			extent: tile.extent,
			tile_id: coord.to_string(),
		};

		Ok((collection, metadata))
	}
}

/// Turns fetched tile responses into processed tiles.
pub struct TileProcessor {
	converter: Converter,
}

impl TileProcessor {
	pub fn new(converter: Converter) -> TileProcessor {
		TileProcessor { converter }
	}

	pub fn from_config(config: &Config) -> Result<TileProcessor> {
		Ok(TileProcessor::new(Converter::new(ConversionOptions::from_config(
			&config.conversion,
		)?)))
	}

	pub fn process(&self, response: &TileResponse) -> Result<ProcessedTile> {
		let start = Instant::now();

		let (collection, metadata) = self
			.converter
			.convert(&response.data, response.coord)
			.with_context(|| format!("failed to process tile {}", response.coord))?;

		Ok(ProcessedTile {
			coord: response.coord,
			metadata: TileMetadata {
				layers: metadata.layers,
				feature_count: collection.len(),
				size_bytes: response.data.len(),
				process_time: start.elapsed(),
				version: metadata.version,
				extent: metadata.extent,
				compressed: response.was_compressed(),
			},
			collection,
		})
	}
}
