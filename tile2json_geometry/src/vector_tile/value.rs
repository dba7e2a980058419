//! Decoding of the MVT `Value` message into [`GeoValue`].

use crate::geo::GeoValue;
use anyhow::{Context, Result, ensure};
use tile2json_core::io::ValueReader;

/// Reads one pooled `Value` message.
///
/// The message is a oneof over string (1), float (2), double (3), int (4),
/// uint (5), sint (6) and bool (7); the last field present wins. A message
/// without any field decodes to null, matching an absent value.
pub fn read_value(reader: &mut ValueReader) -> Result<GeoValue> {
	let mut value = GeoValue::Null;

	while reader.has_remaining() {
		let (field, wire_type) = reader.read_pbf_key()?;
		value = match (field, wire_type) {
			(1, 2) => GeoValue::String(reader.read_pbf_string().context("failed to read string value")?),
			(2, 5) => GeoValue::Float(reader.read_f32().context("failed to read float value")?),
			(3, 1) => GeoValue::Double(reader.read_f64().context("failed to read double value")?),
			(4, 0) => GeoValue::Int(reader.read_varint().context("failed to read int value")? as i64),
			(5, 0) => GeoValue::UInt(reader.read_varint().context("failed to read uint value")?),
			(6, 0) => GeoValue::Int(reader.read_svarint().context("failed to read sint value")?),
			(7, 0) => {
				let raw = reader.read_varint().context("failed to read bool value")?;
				ensure!(raw <= 1, "bool value out of range: {raw}");
				GeoValue::Bool(raw != 0)
			}
			(_, w) => {
				reader.skip_pbf_field(w)?;
				value
			}
		};
	}

	Ok(value)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tile2json_core::io::ValueWriter;

	fn read(data: &[u8]) -> GeoValue {
		read_value(&mut ValueReader::new(data)).unwrap()
	}

	#[test]
	fn string_value() {
		assert_eq!(
			read(&[0x0A, 0x05, b'h', b'e', b'l', b'l', b'o']),
			GeoValue::from("hello")
		);
	}

	#[test]
	fn float_and_double_values() {
		assert_eq!(read(&[0x15, 0x00, 0x00, 0x80, 0x3F]), GeoValue::Float(1.0));
		assert_eq!(
			read(&[0x19, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F]),
			GeoValue::Double(1.0)
		);
	}

	#[test]
	fn integer_values() {
		// field 5 (uint), varint 150
		assert_eq!(read(&[0x28, 0x96, 0x01]), GeoValue::UInt(150));
		// field 6 (sint), zig-zag 150 => 75
		assert_eq!(read(&[0x30, 0x96, 0x01]), GeoValue::Int(75));
		// field 6 (sint), zig-zag 149 => -75
		assert_eq!(read(&[0x30, 0x95, 0x01]), GeoValue::Int(-75));
		// field 4 (int64), plain varint
		assert_eq!(read(&[0x20, 0x2A]), GeoValue::Int(42));
	}

	#[test]
	fn bool_value() {
		assert_eq!(read(&[0x38, 0x01]), GeoValue::Bool(true));
		assert_eq!(read(&[0x38, 0x00]), GeoValue::Bool(false));
	}

	#[test]
	fn empty_message_is_null() {
		assert_eq!(read(&[]), GeoValue::Null);
	}

	#[test]
	fn unknown_fields_are_skipped() {
		let mut writer = ValueWriter::new();
		writer.write_pbf_key(12, 0);
		writer.write_varint(99);
		writer.write_pbf_key(5, 0);
		writer.write_varint(7);
		let blob = writer.into_blob();
		assert_eq!(read(blob.as_slice()), GeoValue::UInt(7));
	}

	#[test]
	fn truncated_message_fails() {
		assert!(read_value(&mut ValueReader::new(&[0x0A, 0x05, b'h'])).is_err());
	}
}
