//! Fetcher construction and source selection.

use super::{FetchError, Fetcher, HttpFetcher, LocalFetcher};
use crate::config::Config;
use crate::types::{SourceType, TileRequest};
use std::path::Path;
use std::sync::Arc;
use tile2json_core::TileCoord;

/// Builds fetchers and tile requests for the configured source.
pub struct FetcherFactory {
	config: Config,
}

impl FetcherFactory {
	pub fn new(config: Config) -> FetcherFactory {
		FetcherFactory { config }
	}

	/// The resolved source type (explicit, auto-detected, or default).
	#[must_use]
	pub fn source_type(&self) -> SourceType {
		self.config.determine_source_type()
	}

	/// Creates a fetcher for the auto-detected source type.
	pub fn create(&self) -> Result<Arc<dyn Fetcher>, FetchError> {
		self.create_for_type(self.source_type())
	}

	/// Creates a fetcher for a specific source type, validating that the
	/// configuration carries everything that source needs.
	pub fn create_for_type(&self, source_type: SourceType) -> Result<Arc<dyn Fetcher>, FetchError> {
		self.validate_for_type(source_type)?;
		match source_type {
			SourceType::Http => {
				let fetcher =
					HttpFetcher::new(&self.config).map_err(|err| FetchError::Validation(format!("{err:#}")))?;
				Ok(Arc::new(fetcher))
			}
			SourceType::Local => Ok(Arc::new(LocalFetcher::new(&self.config))),
		}
	}

	/// Checks the required fields and templates of a source type.
	pub fn validate_for_type(&self, source_type: SourceType) -> Result<(), FetchError> {
		match source_type {
			SourceType::Http => {
				if self.config.server.base_url.is_empty() {
					return Err(FetchError::Validation(String::from(
						"base_url is required for the http source",
					)));
				}
				validate_template(&self.config.server.url_template, "url_template")?;
			}
			SourceType::Local => {
				if self.config.local.base_path.is_empty() {
					return Err(FetchError::Validation(String::from(
						"base_path is required for the local source",
					)));
				}
				validate_template(&self.config.local.path_template, "path_template")?;
				let base = Path::new(&self.config.local.base_path);
				if !base.is_dir() {
					return Err(FetchError::Validation(format!(
						"base_path is not a readable directory: {}",
						self.config.local.base_path
					)));
				}
			}
		}
		Ok(())
	}

	/// Builds the request for a tile, expanding the source's template.
	#[must_use]
	pub fn request_for(&self, coord: TileCoord) -> TileRequest {
		let locator = match self.source_type() {
			SourceType::Http => self.config.tile_url(&coord),
			// Coordinate-based local requests leave the locator empty; the
			// local fetcher derives the path from its own template fields.
			SourceType::Local => String::new(),
		};
		TileRequest::new(coord, locator)
	}
}

fn validate_template(template: &str, what: &str) -> Result<(), FetchError> {
	for placeholder in ["{z}", "{x}", "{y}"] {
		if !template.contains(placeholder) {
			return Err(FetchError::Validation(format!(
				"{what} must contain the {placeholder} placeholder"
			)));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::TempDir;

	#[test]
	fn http_requires_base_url() {
		let factory = FetcherFactory::new(Config::default());
		let error = factory.create_for_type(SourceType::Http).err().unwrap();
		assert!(matches!(error, FetchError::Validation(_)));
	}

	#[test]
	fn local_requires_existing_directory() {
		let mut config = Config::default();
		config.local.base_path = String::from("/definitely/not/here");
		let factory = FetcherFactory::new(config);
		let error = factory.create_for_type(SourceType::Local).err().unwrap();
		assert!(matches!(error, FetchError::Validation(_)));
	}

	#[test]
	fn templates_must_contain_placeholders() {
		let dir = TempDir::new().unwrap();
		let mut config = Config::default();
		config.local.base_path = dir.path().to_string_lossy().into_owned();
		config.local.path_template = String::from("{base_path}/tiles.mvt");
		let factory = FetcherFactory::new(config);
		let error = factory.create_for_type(SourceType::Local).err().unwrap();
		assert!(error.to_string().contains("{z}"));
	}

	#[test]
	fn auto_detection_picks_the_configured_source() {
		let dir = TempDir::new().unwrap();
		let mut config = Config::default();
		config.local.base_path = dir.path().to_string_lossy().into_owned();
		let factory = FetcherFactory::new(config);
		assert_eq!(factory.source_type(), SourceType::Local);
		assert!(factory.create().is_ok());
	}

	#[test]
	fn http_requests_carry_the_expanded_url() {
		let mut config = Config::default();
		config.server.base_url = String::from("https://ex/tiles");
		let factory = FetcherFactory::new(config);
		let request = factory.request_for(TileCoord::new(14, 8362, 5956).unwrap());
		assert_eq!(request.locator, "https://ex/tiles/14/8362/5956.mvt");
	}

	#[test]
	fn local_requests_leave_the_locator_empty() {
		let dir = TempDir::new().unwrap();
		let mut config = Config::default();
		config.local.base_path = dir.path().to_string_lossy().into_owned();
		let factory = FetcherFactory::new(config);
		let request = factory.request_for(TileCoord::new(3, 1, 2).unwrap());
		assert!(request.locator.is_empty());
	}
}
