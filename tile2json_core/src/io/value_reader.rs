//! Sequential reader over a byte slice with protobuf primitives.

use crate::Blob;
use anyhow::{Context, Result, bail, ensure};
use byteorder::{ByteOrder, LE};

/// Reads varints, zig-zag integers, floats, strings, and length-delimited
/// protobuf fields from a borrowed byte slice.
///
/// Sub-readers borrow a window of the parent's data, so nested messages are
/// parsed without copying.
pub struct ValueReader<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> ValueReader<'a> {
	pub fn new(data: &'a [u8]) -> ValueReader<'a> {
		ValueReader { data, pos: 0 }
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	#[must_use]
	pub fn position(&self) -> usize {
		self.pos
	}

	#[must_use]
	pub fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	#[must_use]
	pub fn has_remaining(&self) -> bool {
		self.remaining() > 0
	}

	fn take(&mut self, length: usize) -> Result<&'a [u8]> {
		ensure!(
			length <= self.remaining(),
			"unexpected end of data: needed {length} bytes, {} remaining",
			self.remaining()
		);
		let slice = &self.data[self.pos..self.pos + length];
		self.pos += length;
		Ok(slice)
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.take(1)?[0])
	}

	/// Reads a base-128 varint (up to 10 bytes).
	pub fn read_varint(&mut self) -> Result<u64> {
		let mut value = 0u64;
		let mut shift = 0;
		loop {
			let byte = self.read_u8().context("failed to read varint byte")?;
			value |= ((byte & 0x7F) as u64) << shift;
			if byte & 0x80 == 0 {
				break;
			}
			shift += 7;
			if shift >= 70 {
				bail!("varint too long");
			}
		}
		Ok(value)
	}

	/// Reads a zig-zag encoded signed varint: `n = (p >> 1) ^ -(p & 1)`.
	pub fn read_svarint(&mut self) -> Result<i64> {
		let value = self.read_varint()? as i64;
		Ok((value >> 1) ^ -(value & 1))
	}

	pub fn read_f32(&mut self) -> Result<f32> {
		Ok(LE::read_f32(self.take(4)?))
	}

	pub fn read_f64(&mut self) -> Result<f64> {
		Ok(LE::read_f64(self.take(8)?))
	}

	pub fn read_string(&mut self, length: usize) -> Result<String> {
		Ok(String::from_utf8(self.take(length)?.to_vec())?)
	}

	pub fn read_blob(&mut self, length: usize) -> Result<Blob> {
		Ok(Blob::from(self.take(length)?))
	}

	/// Reads a protobuf field key, returning `(field_number, wire_type)`.
	pub fn read_pbf_key(&mut self) -> Result<(u32, u8)> {
		let value = self.read_varint().context("failed to read PBF key")?;
		Ok(((value >> 3) as u32, (value & 0x07) as u8))
	}

	/// Reads a length prefix and returns a reader over that many bytes.
	pub fn get_pbf_sub_reader(&mut self) -> Result<ValueReader<'a>> {
		let length = self.read_varint().context("failed to read sub-message length")? as usize;
		Ok(ValueReader::new(self.take(length)?))
	}

	/// Reads a packed repeated `uint32` field.
	pub fn read_pbf_packed_uint32(&mut self) -> Result<Vec<u32>> {
		let mut reader = self.get_pbf_sub_reader().context("failed to read packed uint32 field")?;
		let mut values = Vec::new();
		while reader.has_remaining() {
			values.push(reader.read_varint()? as u32);
		}
		Ok(values)
	}

	/// Reads a length-delimited string field.
	pub fn read_pbf_string(&mut self) -> Result<String> {
		let length = self.read_varint().context("failed to read string length")? as usize;
		self.read_string(length)
	}

	/// Reads a length-delimited bytes field.
	pub fn read_pbf_blob(&mut self) -> Result<Blob> {
		let length = self.read_varint().context("failed to read blob length")? as usize;
		self.read_blob(length)
	}

	/// Skips over a field of the given wire type.
	pub fn skip_pbf_field(&mut self, wire_type: u8) -> Result<()> {
		match wire_type {
			0 => {
				self.read_varint()?;
			}
			1 => {
				self.take(8)?;
			}
			2 => {
				let length = self.read_varint()? as usize;
				self.take(length)?;
			}
			5 => {
				self.take(4)?;
			}
			_ => bail!("cannot skip unknown wire type {wire_type}"),
		}
		Ok(())
	}
}
