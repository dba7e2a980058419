//! Layer decoding: wire fields, pooled properties, feature resolution.
//!
//! MVT layer fields: 1 = name, 2 = repeated feature, 3 = repeated key,
//! 4 = repeated value, 5 = extent (default 4096), 15 = version (default 1).

use super::feature::{DecodedFeature, RawFeature};
use super::value::read_value;
use crate::geo::{GeoProperties, GeoValue};
use anyhow::{Context, Result, anyhow, bail, ensure};
use tile2json_core::io::ValueReader;

/// A fully decoded layer: resolved features in wire order.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedLayer {
	pub name: String,
	pub extent: u32,
	pub version: u32,
	pub features: Vec<DecodedFeature>,
}

/// A layer-level decode failure, keeping the layer name when it was parsed
/// before the failure.
pub(crate) struct LayerError {
	pub name: Option<String>,
	pub source: anyhow::Error,
}

impl DecodedLayer {
	pub(crate) fn read(reader: &mut ValueReader) -> Result<DecodedLayer, LayerError> {
		let mut name: Option<String> = None;
		let mut raw_features: Vec<RawFeature> = Vec::new();
		let mut keys: Vec<String> = Vec::new();
		let mut values: Vec<GeoValue> = Vec::new();
		let mut extent = 4096u32;
		let mut version = 1u32;

		let mut parse = || -> Result<()> {
			while reader.has_remaining() {
				match reader.read_pbf_key()? {
					(1, 2) => name = Some(reader.read_pbf_string().context("failed to read layer name")?),
					(2, 2) => {
						let mut sub = reader.get_pbf_sub_reader().context("failed to read feature message")?;
						raw_features.push(RawFeature::read(&mut sub).context("failed to read feature")?);
					}
					(3, 2) => keys.push(reader.read_pbf_string().context("failed to read property key")?),
					(4, 2) => {
						let mut sub = reader.get_pbf_sub_reader().context("failed to read value message")?;
						values.push(read_value(&mut sub).context("failed to read property value")?);
					}
					(5, 0) => {
						extent = u32::try_from(reader.read_varint().context("failed to read extent")?)
							.context("extent out of range")?
					}
					(15, 0) => {
						version = u32::try_from(reader.read_varint().context("failed to read version")?)
							.context("version out of range")?
					}
					(_, wire_type) => reader.skip_pbf_field(wire_type)?,
				}
			}
			Ok(())
		};

		if let Err(source) = parse() {
			return Err(LayerError {
				name: name.clone(),
				source,
			});
		}

		let build = |name: &str| -> Result<DecodedLayer> {
			ensure!(
				version == 1 || version == 2,
				"unsupported layer version {version} (expected 1 or 2)"
			);
			ensure!(extent > 0, "layer extent must be positive");

			let mut features = Vec::with_capacity(raw_features.len());
			for raw in &raw_features {
				match resolve_feature(raw, &keys, &values) {
					Ok(feature) => features.push(feature),
					Err(err) => log::warn!("skipping malformed feature in layer {name:?}: {err:#}"),
				}
			}

			Ok(DecodedLayer {
				name: name.to_string(),
				extent,
				version,
				features,
			})
		};

		match name {
			Some(name) => build(&name).map_err(|source| LayerError {
				name: Some(name),
				source,
			}),
			None => Err(LayerError {
				name: None,
				source: anyhow!("layer name is required"),
			}),
		}
	}
}

/// Resolves pooled tag indices and decodes the geometry of one feature.
fn resolve_feature(raw: &RawFeature, keys: &[String], values: &[GeoValue]) -> Result<DecodedFeature> {
	if raw.tag_ids.len() % 2 != 0 {
		bail!("feature has an odd number of tag indices");
	}

	let mut properties = GeoProperties::new();
	for pair in raw.tag_ids.chunks(2) {
		let key = keys
			.get(pair[0] as usize)
			.ok_or_else(|| anyhow!("tag key index {} out of range", pair[0]))?;
		let value = values
			.get(pair[1] as usize)
			.ok_or_else(|| anyhow!("tag value index {} out of range", pair[1]))?;
		properties.insert(key.clone(), value.clone());
	}

	let geometry = raw.decode_geometry().context("failed to decode geometry")?;

	Ok(DecodedFeature {
		id: raw.id,
		properties,
		geometry,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::geo::Geometry;
	use tile2json_core::Blob;
	use tile2json_core::io::ValueWriter;

	fn point_geometry(x: i64, y: i64) -> Blob {
		let mut writer = ValueWriter::new();
		writer.write_varint((1 << 3) | 1); // MoveTo, count 1
		writer.write_svarint(x);
		writer.write_svarint(y);
		writer.into_blob()
	}

	fn feature_message(id: Option<u64>, tag_ids: &[u32], geom_type: u64, geometry: &Blob) -> Blob {
		let mut writer = ValueWriter::new();
		if let Some(id) = id {
			writer.write_pbf_key(1, 0);
			writer.write_varint(id);
		}
		if !tag_ids.is_empty() {
			writer.write_pbf_key(2, 2);
			writer.write_pbf_packed_uint32(tag_ids);
		}
		writer.write_pbf_key(3, 0);
		writer.write_varint(geom_type);
		writer.write_pbf_key(4, 2);
		writer.write_pbf_blob(geometry);
		writer.into_blob()
	}

	fn string_value(s: &str) -> Blob {
		let mut writer = ValueWriter::new();
		writer.write_pbf_key(1, 2);
		writer.write_pbf_string(s);
		writer.into_blob()
	}

	struct LayerBuilder {
		writer: ValueWriter,
	}

	impl LayerBuilder {
		fn new(name: &str) -> LayerBuilder {
			let mut writer = ValueWriter::new();
			writer.write_pbf_key(1, 2);
			writer.write_pbf_string(name);
			LayerBuilder { writer }
		}

		fn feature(mut self, blob: &Blob) -> Self {
			self.writer.write_pbf_key(2, 2);
			self.writer.write_pbf_blob(blob);
			self
		}

		fn key(mut self, key: &str) -> Self {
			self.writer.write_pbf_key(3, 2);
			self.writer.write_pbf_string(key);
			self
		}

		fn value(mut self, blob: &Blob) -> Self {
			self.writer.write_pbf_key(4, 2);
			self.writer.write_pbf_blob(blob);
			self
		}

		fn version(mut self, version: u64) -> Self {
			self.writer.write_pbf_key(15, 0);
			self.writer.write_varint(version);
			self
		}

		fn extent(mut self, extent: u64) -> Self {
			self.writer.write_pbf_key(5, 0);
			self.writer.write_varint(extent);
			self
		}

		fn build(self) -> Blob {
			self.writer.into_blob()
		}
	}

	fn read_layer(blob: &Blob) -> Result<DecodedLayer, LayerError> {
		DecodedLayer::read(&mut ValueReader::new(blob.as_slice()))
	}

	#[test]
	fn decodes_name_features_and_tags() {
		let blob = LayerBuilder::new("places")
			.feature(&feature_message(Some(7), &[0, 0], 1, &point_geometry(2048, 2048)))
			.key("name")
			.value(&string_value("X"))
			.build();

		let layer = read_layer(&blob).map_err(|e| e.source).unwrap();
		assert_eq!(layer.name, "places");
		assert_eq!(layer.extent, 4096);
		assert_eq!(layer.version, 1);
		assert_eq!(layer.features.len(), 1);

		let feature = &layer.features[0];
		assert_eq!(feature.id, Some(7));
		assert_eq!(feature.properties.get("name"), Some(&GeoValue::from("X")));
		assert_eq!(feature.geometry, Geometry::Point([2048.0, 2048.0]));
	}

	#[test]
	fn custom_extent_and_version() {
		let blob = LayerBuilder::new("roads").extent(512).version(2).build();
		let layer = read_layer(&blob).map_err(|e| e.source).unwrap();
		assert_eq!(layer.extent, 512);
		assert_eq!(layer.version, 2);
		assert!(layer.features.is_empty());
	}

	#[test]
	fn unsupported_version_fails() {
		let blob = LayerBuilder::new("bad").version(3).build();
		let err = read_layer(&blob).err().unwrap();
		assert_eq!(err.name.as_deref(), Some("bad"));
		assert!(err.source.to_string().contains("version 3"));
	}

	#[test]
	fn missing_name_fails() {
		let mut writer = ValueWriter::new();
		writer.write_pbf_key(5, 0);
		writer.write_varint(4096);
		let err = read_layer(&writer.into_blob()).err().unwrap();
		assert!(err.name.is_none());
	}

	#[test]
	fn malformed_feature_is_skipped() {
		// Second feature has a tag index pointing past the key table.
		let blob = LayerBuilder::new("places")
			.feature(&feature_message(Some(1), &[0, 0], 1, &point_geometry(1, 1)))
			.feature(&feature_message(Some(2), &[9, 9], 1, &point_geometry(2, 2)))
			.key("name")
			.value(&string_value("X"))
			.build();

		let layer = read_layer(&blob).map_err(|e| e.source).unwrap();
		assert_eq!(layer.features.len(), 1);
		assert_eq!(layer.features[0].id, Some(1));
	}

	#[test]
	fn zero_vertex_feature_is_skipped() {
		let blob = LayerBuilder::new("places")
			.feature(&feature_message(None, &[], 1, &Blob::new_empty()))
			.feature(&feature_message(None, &[], 1, &point_geometry(3, 4)))
			.build();

		let layer = read_layer(&blob).map_err(|e| e.source).unwrap();
		assert_eq!(layer.features.len(), 1);
		assert_eq!(layer.features[0].geometry, Geometry::Point([3.0, 4.0]));
	}

	#[test]
	fn feature_order_is_preserved() {
		let blob = LayerBuilder::new("places")
			.feature(&feature_message(Some(5), &[], 1, &point_geometry(1, 1)))
			.feature(&feature_message(Some(3), &[], 1, &point_geometry(2, 2)))
			.feature(&feature_message(Some(9), &[], 1, &point_geometry(3, 3)))
			.build();

		let layer = read_layer(&blob).map_err(|e| e.source).unwrap();
		let ids: Vec<Option<u64>> = layer.features.iter().map(|f| f.id).collect();
		assert_eq!(ids, vec![Some(5), Some(3), Some(9)]);
	}
}
