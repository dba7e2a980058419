//! Fixture helpers: hand-assembled MVT payloads written into a temp tile
//! tree.

use tile2json_core::Blob;
use tile2json_core::io::ValueWriter;

/// Encodes an MVT `Value` message holding a string.
fn string_value(text: &str) -> Blob {
	let mut writer = ValueWriter::new();
	writer.write_pbf_key(1, 2);
	writer.write_pbf_string(text);
	writer.into_blob()
}

/// Encodes a point feature at `(px, py)` with tag pair `(0, 0)`.
fn point_feature(id: u64, px: i64, py: i64) -> Blob {
	let mut geometry = ValueWriter::new();
	geometry.write_varint((1 << 3) | 1); // MoveTo, count 1
	geometry.write_svarint(px);
	geometry.write_svarint(py);

	let mut writer = ValueWriter::new();
	writer.write_pbf_key(1, 0);
	writer.write_varint(id);
	writer.write_pbf_key(2, 2);
	writer.write_pbf_packed_uint32(&[0, 0]);
	writer.write_pbf_key(3, 0);
	writer.write_varint(1); // POINT
	writer.write_pbf_key(4, 2);
	writer.write_pbf_blob(&geometry.into_blob());
	writer.into_blob()
}

/// Encodes a layer named `name` with one point feature carrying
/// `name=<value>`.
fn layer(name: &str, feature: &Blob, value: &str) -> Blob {
	let mut writer = ValueWriter::new();
	writer.write_pbf_key(1, 2);
	writer.write_pbf_string(name);
	writer.write_pbf_key(2, 2);
	writer.write_pbf_blob(feature);
	writer.write_pbf_key(3, 2);
	writer.write_pbf_string("name");
	writer.write_pbf_key(4, 2);
	writer.write_pbf_blob(&string_value(value));
	writer.into_blob()
}

/// A complete single-layer tile: one `places` point at `(px, py)` tagged
/// `name=<value>`.
pub fn places_tile(px: i64, py: i64, value: &str) -> Blob {
	let mut writer = ValueWriter::new();
	writer.write_pbf_key(3, 2);
	writer.write_pbf_blob(&layer("places", &point_feature(1, px, py), value));
	writer.into_blob()
}
