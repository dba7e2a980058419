//! Shared request/response/result types of the conversion pipeline.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::time::Duration;
use tile2json_core::{Blob, TileCoord};
use tile2json_geometry::geo::GeoCollection;

/// Where tiles come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceType {
	Http,
	Local,
}

impl Display for SourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SourceType::Http => f.write_str("http"),
			SourceType::Local => f.write_str("local"),
		}
	}
}

/// A request for one tile.
///
/// `locator` is the single field fetchers consume: a URL for the HTTP
/// source, a filesystem path for the local source.
#[derive(Clone, Debug)]
pub struct TileRequest {
	pub coord: TileCoord,
	pub locator: String,
	pub headers: BTreeMap<String, String>,
}

impl TileRequest {
	pub fn new(coord: TileCoord, locator: String) -> TileRequest {
		TileRequest {
			coord,
			locator,
			headers: BTreeMap::new(),
		}
	}
}

/// A fetched tile payload plus transport facts.
///
/// The local fetcher synthesizes HTTP-like fields (`status = 200`, content
/// type and encoding headers) so downstream code never branches on the
/// source kind.
#[derive(Debug)]
pub struct TileResponse {
	pub coord: TileCoord,
	pub data: Blob,
	pub status: u16,
	pub headers: Vec<(String, String)>,
	pub fetch_time: Duration,
}

impl TileResponse {
	/// True when the transport delivered the payload compressed.
	#[must_use]
	pub fn was_compressed(&self) -> bool {
		self.headers.iter().any(|(name, value)| {
			name.eq_ignore_ascii_case("content-encoding") && (value.contains("gzip") || value.contains("deflate"))
		})
	}
}

/// A tile after conversion to GeoJSON.
#[derive(Clone, Debug)]
pub struct ProcessedTile {
	pub coord: TileCoord,
	pub collection: GeoCollection,
	pub metadata: TileMetadata,
}

/// Conversion facts reported alongside each tile.
#[derive(Clone, Debug)]
pub struct TileMetadata {
	/// Layer names, sorted.
	pub layers: Vec<String>,
	/// Number of features emitted into the collection.
	pub feature_count: usize,
	/// Size of the raw (decompressed) MVT payload.
	pub size_bytes: usize,
	pub process_time: Duration,
	pub version: u32,
	pub extent: u32,
	pub compressed: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_type_display() {
		assert_eq!(SourceType::Http.to_string(), "http");
		assert_eq!(SourceType::Local.to_string(), "local");
	}

	#[test]
	fn compressed_detection_is_case_insensitive() {
		let coord = TileCoord::new(1, 0, 0).unwrap();
		let response = TileResponse {
			coord,
			data: Blob::new_empty(),
			status: 200,
			headers: vec![("Content-Encoding".to_string(), "gzip".to_string())],
			fetch_time: Duration::ZERO,
		};
		assert!(response.was_compressed());

		let response = TileResponse {
			coord,
			data: Blob::new_empty(),
			status: 200,
			headers: vec![("content-type".to_string(), "application/x-protobuf".to_string())],
			fetch_time: Duration::ZERO,
		};
		assert!(!response.was_compressed());
	}
}
