//! Local filesystem tile fetcher.
//!
//! Resolves a tile to a path (absolute locator, relative locator joined to
//! the base path, or the `{z}/{x}/{y}` template), requires a regular file,
//! gunzips `.gz` files transparently, and synthesizes HTTP-like response
//! fields for parity with the HTTP fetcher.

use super::{FetchError, Fetcher};
use crate::config::Config;
use crate::types::{TileRequest, TileResponse};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tile2json_core::Blob;
use tile2json_core::utils::decompress_gzip;
use tokio::time::sleep;

pub struct LocalFetcher {
	base_path: String,
	extension: String,
	compressed: bool,
	max_retries: u32,
}

impl LocalFetcher {
	pub fn new(config: &Config) -> LocalFetcher {
		LocalFetcher {
			base_path: config.local.base_path.clone(),
			extension: config.local.extension.clone(),
			compressed: config.local.compressed,
			max_retries: config.server.max_retries,
		}
	}

	/// Derives the file path for a request.
	fn file_path(&self, request: &TileRequest) -> Result<PathBuf, FetchError> {
		if !request.locator.is_empty() {
			let locator = Path::new(&request.locator);
			if locator.is_absolute() {
				return Ok(locator.to_path_buf());
			}
			return Ok(Path::new(&self.base_path).join(locator));
		}

		if self.base_path.is_empty() {
			return Err(FetchError::Validation(String::from(
				"base_path is required for coordinate-based file paths",
			)));
		}

		let mut extension = self.extension.clone();
		if self.compressed {
			extension.push_str(".gz");
		}
		let coord = request.coord;
		Ok(
			Path::new(&self.base_path)
				.join(coord.z.to_string())
				.join(coord.x.to_string())
				.join(format!("{}{extension}", coord.y)),
		)
	}

	fn classify_io(error: &std::io::Error, path: &Path) -> FetchError {
		match error.kind() {
			ErrorKind::NotFound => FetchError::NotFound(format!("tile file not found: {}", path.display())),
			ErrorKind::PermissionDenied => {
				FetchError::PermissionDenied(format!("cannot access tile file: {}", path.display()))
			}
			_ => FetchError::Filesystem(format!("cannot read tile file {}: {error}", path.display())),
		}
	}
}

#[async_trait]
impl Fetcher for LocalFetcher {
	async fn fetch(&self, request: &TileRequest) -> Result<TileResponse, FetchError> {
		let start = Instant::now();
		let path = self.file_path(request)?;

		let metadata = std::fs::metadata(&path).map_err(|err| Self::classify_io(&err, &path))?;
		if !metadata.is_file() {
			return Err(FetchError::Validation(format!(
				"path is not a regular file: {}",
				path.display()
			)));
		}

		let raw = std::fs::read(&path).map_err(|err| Self::classify_io(&err, &path))?;

		let is_gzipped = path
			.extension()
			.is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
		let data = if is_gzipped {
			decompress_gzip(&Blob::from(raw))
				.map_err(|err| FetchError::Decompression(format!("{}: {err:#}", path.display())))?
		} else {
			Blob::from(raw)
		};

		let mut headers = vec![
			(String::from("content-type"), String::from("application/x-protobuf")),
			(String::from("content-length"), data.len().to_string()),
		];
		if is_gzipped {
			headers.push((String::from("content-encoding"), String::from("gzip")));
		}

		Ok(TileResponse {
			coord: request.coord,
			data,
			status: 200,
			headers,
			fetch_time: start.elapsed(),
		})
	}

	/// Linear backoff (attempt × 100 ms) for transient filesystem glitches.
	async fn fetch_with_retry(&self, request: &TileRequest) -> Result<TileResponse, FetchError> {
		let mut last_error = None;

		for attempt in 0..=self.max_retries {
			if attempt > 0 {
				sleep(Duration::from_millis(attempt as u64 * 100)).await;
			}

			match self.fetch(request).await {
				Ok(response) => return Ok(response),
				Err(error) => {
					let retryable = error.is_retryable();
					last_error = Some(error);
					if !retryable {
						break;
					}
				}
			}
		}

		Err(last_error.expect("at least one attempt was made"))
	}
}
