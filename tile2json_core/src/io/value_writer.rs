//! Byte writer producing length-delimited protobuf data.
//!
//! The converter has no MVT write path; this writer backs the test fixtures
//! that feed the decoder, and mirrors the reader's primitives so the two
//! stay in sync.

use crate::Blob;
use byteorder::{ByteOrder, LE};

/// Accumulates protobuf wire-format bytes.
#[derive(Default)]
pub struct ValueWriter {
	data: Vec<u8>,
}

impl ValueWriter {
	pub fn new() -> ValueWriter {
		ValueWriter::default()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn write_u8(&mut self, value: u8) {
		self.data.push(value);
	}

	pub fn write_varint(&mut self, mut value: u64) {
		loop {
			let byte = (value & 0x7F) as u8;
			value >>= 7;
			if value == 0 {
				self.data.push(byte);
				break;
			}
			self.data.push(byte | 0x80);
		}
	}

	/// Writes a zig-zag encoded signed varint.
	pub fn write_svarint(&mut self, value: i64) {
		self.write_varint(((value << 1) ^ (value >> 63)) as u64);
	}

	pub fn write_f32(&mut self, value: f32) {
		let mut buf = [0u8; 4];
		LE::write_f32(&mut buf, value);
		self.data.extend_from_slice(&buf);
	}

	pub fn write_f64(&mut self, value: f64) {
		let mut buf = [0u8; 8];
		LE::write_f64(&mut buf, value);
		self.data.extend_from_slice(&buf);
	}

	pub fn write_pbf_key(&mut self, field_number: u32, wire_type: u8) {
		self.write_varint(((field_number as u64) << 3) | (wire_type as u64));
	}

	pub fn write_pbf_string(&mut self, value: &str) {
		self.write_varint(value.len() as u64);
		self.data.extend_from_slice(value.as_bytes());
	}

	pub fn write_pbf_blob(&mut self, blob: &Blob) {
		self.write_varint(blob.len() as u64);
		self.data.extend_from_slice(blob.as_slice());
	}

	pub fn write_pbf_packed_uint32(&mut self, values: &[u32]) {
		let mut packed = ValueWriter::new();
		for value in values {
			packed.write_varint(*value as u64);
		}
		self.write_pbf_blob(&packed.into_blob());
	}

	#[must_use]
	pub fn into_blob(self) -> Blob {
		Blob::from(self.data)
	}
}
