//! Gzip helpers over [`Blob`].
//!
//! Transport compression of tiles and file compression of output both use
//! plain gzip; this is the only codec the tool needs.

use crate::Blob;
use anyhow::{Context, Result};
use flate2::bufread::{GzDecoder, GzEncoder};
use std::io::Read;

/// Compresses a blob with gzip (best compression).
pub fn compress_gzip(blob: &Blob) -> Result<Blob> {
	let mut encoder = GzEncoder::new(blob.as_slice(), flate2::Compression::best());
	let mut compressed = Vec::new();
	encoder
		.read_to_end(&mut compressed)
		.context("failed to compress data using gzip")?;
	Ok(Blob::from(compressed))
}

/// Decompresses a gzip blob.
pub fn decompress_gzip(blob: &Blob) -> Result<Blob> {
	let mut decoder = GzDecoder::new(blob.as_slice());
	let mut decompressed = Vec::new();
	decoder
		.read_to_end(&mut decompressed)
		.context("failed to decompress data using gzip")?;
	Ok(Blob::from(decompressed))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip() -> Result<()> {
		let data = Blob::from("a tile payload that compresses a tile payload that compresses");
		let compressed = compress_gzip(&data)?;
		assert_ne!(compressed, data);
		let decompressed = decompress_gzip(&compressed)?;
		assert_eq!(decompressed, data);
		Ok(())
	}

	#[test]
	fn decompress_rejects_garbage() {
		let garbage = Blob::from(vec![0x00, 0x01, 0x02, 0x03]);
		assert!(decompress_gzip(&garbage).is_err());
	}

	#[test]
	fn gzip_magic_bytes() -> Result<()> {
		let compressed = compress_gzip(&Blob::from("x"))?;
		assert_eq!(&compressed.as_slice()[0..2], &[0x1F, 0x8B]);
		Ok(())
	}
}
