//! Tile-level decoding: the outer message and the decode error taxonomy.

use super::layer::DecodedLayer;
use std::collections::BTreeMap;
use thiserror::Error;
use tile2json_core::io::ValueReader;
use tile2json_core::{Blob, TileCoord};

/// Errors produced by [`decode`].
#[derive(Debug, Error)]
pub enum DecodeError {
	/// The payload was zero bytes long.
	#[error("empty tile data")]
	EmptyData,

	/// A layer could not be decoded; this fails the whole tile.
	#[error("failed to decode layer {name:?}: {source:#}")]
	Layer { name: String, source: anyhow::Error },

	/// The outer tile message is not valid protobuf.
	#[error("malformed tile data: {0:#}")]
	Malformed(anyhow::Error),
}

/// A decoded tile: layers keyed by name, in deterministic (sorted) order.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedTile {
	pub coord: TileCoord,
	/// Tile-level extent reported in metadata (layers carry their own).
	pub extent: u32,
	/// MVT specification version.
	pub version: u32,
	pub layers: BTreeMap<String, DecodedLayer>,
}

impl DecodedTile {
	/// All layer names, sorted.
	#[must_use]
	pub fn layer_names(&self) -> Vec<String> {
		self.layers.keys().cloned().collect()
	}

	/// Total feature count across all layers.
	#[must_use]
	pub fn feature_count(&self) -> usize {
		self.layers.values().map(|layer| layer.features.len()).sum()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.feature_count() == 0
	}
}

/// Decodes an MVT payload.
///
/// Stateless and safe to call concurrently. Layers appear under field 3 of
/// the outer message; unknown fields are skipped.
pub fn decode(blob: &Blob, coord: TileCoord) -> Result<DecodedTile, DecodeError> {
	if blob.is_empty() {
		return Err(DecodeError::EmptyData);
	}

	let mut layers = BTreeMap::new();
	let mut reader = ValueReader::new(blob.as_slice());

	while reader.has_remaining() {
		match reader.read_pbf_key().map_err(DecodeError::Malformed)? {
			(3, 2) => {
				let mut sub = reader.get_pbf_sub_reader().map_err(DecodeError::Malformed)?;
				let layer = DecodedLayer::read(&mut sub).map_err(|err| DecodeError::Layer {
					name: err.name.unwrap_or_else(|| String::from("<unnamed>")),
					source: err.source,
				})?;
				layers.insert(layer.name.clone(), layer);
			}
			(_, wire_type) => reader.skip_pbf_field(wire_type).map_err(DecodeError::Malformed)?,
		}
	}

	Ok(DecodedTile {
		coord,
		extent: 4096,
		version: 2,
		layers,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::geo::Geometry;
	use tile2json_core::io::ValueWriter;

	fn coord() -> TileCoord {
		TileCoord::new(14, 8362, 5956).unwrap()
	}

	fn layer_message(name: &str, version: u64) -> Blob {
		let mut writer = ValueWriter::new();
		writer.write_pbf_key(1, 2);
		writer.write_pbf_string(name);
		// one point feature at (16, 32)
		let mut feature = ValueWriter::new();
		feature.write_pbf_key(3, 0);
		feature.write_varint(1);
		feature.write_pbf_key(4, 2);
		let mut geometry = ValueWriter::new();
		geometry.write_varint((1 << 3) | 1);
		geometry.write_svarint(16);
		geometry.write_svarint(32);
		feature.write_pbf_blob(&geometry.into_blob());
		writer.write_pbf_key(2, 2);
		writer.write_pbf_blob(&feature.into_blob());
		if version != 1 {
			writer.write_pbf_key(15, 0);
			writer.write_varint(version);
		}
		writer.into_blob()
	}

	fn tile_message(layers: &[Blob]) -> Blob {
		let mut writer = ValueWriter::new();
		for layer in layers {
			writer.write_pbf_key(3, 2);
			writer.write_pbf_blob(layer);
		}
		writer.into_blob()
	}

	#[test]
	fn empty_payload_is_its_own_error() {
		let err = decode(&Blob::new_empty(), coord()).err().unwrap();
		assert!(matches!(err, DecodeError::EmptyData));
	}

	#[test]
	fn zero_layer_tile_decodes_empty() {
		let tile = decode(&tile_message(&[]), coord()).unwrap();
		assert!(tile.layers.is_empty());
		assert!(tile.is_empty());
		assert_eq!(tile.extent, 4096);
		assert_eq!(tile.version, 2);
	}

	#[test]
	fn decodes_layers_keyed_by_name() {
		let blob = tile_message(&[layer_message("water", 1), layer_message("places", 2)]);
		let tile = decode(&blob, coord()).unwrap();
		assert_eq!(tile.layer_names(), vec!["places", "water"]);
		assert_eq!(tile.feature_count(), 2);

		let places = &tile.layers["places"];
		assert_eq!(places.version, 2);
		assert_eq!(places.features[0].geometry, Geometry::Point([16.0, 32.0]));
	}

	#[test]
	fn malformed_layer_fails_the_tile() {
		let blob = tile_message(&[layer_message("ok", 1), layer_message("bad", 7)]);
		let err = decode(&blob, coord()).err().unwrap();
		match err {
			DecodeError::Layer { name, .. } => assert_eq!(name, "bad"),
			other => panic!("unexpected error {other:?}"),
		}
	}

	#[test]
	fn garbage_payload_is_malformed() {
		// 0x1A announces a length-delimited field 3 with length 0xFF, which
		// overruns the buffer.
		let blob = Blob::from(vec![0x1A, 0xFF]);
		assert!(matches!(
			decode(&blob, coord()).err().unwrap(),
			DecodeError::Malformed(_)
		));
	}

	#[test]
	fn decoder_is_stateless_across_calls() {
		let blob = tile_message(&[layer_message("water", 1)]);
		let first = decode(&blob, coord()).unwrap();
		let second = decode(&blob, coord()).unwrap();
		assert_eq!(first, second);
	}
}
