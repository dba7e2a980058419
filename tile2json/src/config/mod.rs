//! Configuration: defaults, YAML file, environment overrides.
//!
//! Precedence, lowest to highest: built-in defaults, the YAML config file,
//! `TILE_TO_JSON_*` environment variables, command-line flags (applied by
//! the CLI layer). Environment keys map dotted config paths to underscores,
//! e.g. `server.base_url` → `TILE_TO_JSON_SERVER_BASE_URL`. Durations are
//! plain seconds.

mod validation;

pub use validation::{validate, validate_sections};

use crate::types::SourceType;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tile2json_core::TileCoord;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub server: ServerConfig,
	pub local: LocalConfig,
	pub source: SourceConfig,
	pub output: OutputConfig,
	pub batch: BatchConfig,
	pub network: NetworkConfig,
	pub logging: LoggingConfig,
	pub conversion: ConversionConfig,
}

/// Tile server settings for the HTTP source.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
	pub base_url: String,
	pub api_key: String,
	pub headers: BTreeMap<String, String>,
	/// Per-request timeout in seconds.
	pub timeout: u64,
	pub max_retries: u32,
	pub url_template: String,
}

impl Default for ServerConfig {
	fn default() -> Self {
		ServerConfig {
			base_url: String::new(),
			api_key: String::new(),
			headers: BTreeMap::new(),
			timeout: 30,
			max_retries: 3,
			url_template: String::from("{base_url}/{z}/{x}/{y}.mvt"),
		}
	}
}

/// Local tile tree settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LocalConfig {
	pub base_path: String,
	pub path_template: String,
	pub extension: String,
	/// When set, tiles are stored gzipped (`.mvt.gz`).
	pub compressed: bool,
}

impl Default for LocalConfig {
	fn default() -> Self {
		LocalConfig {
			base_path: String::new(),
			path_template: String::from("{base_path}/{z}/{x}/{y}.mvt"),
			extension: String::from(".mvt"),
			compressed: false,
		}
	}
}

/// Source selection: explicit type or auto-detection.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
	/// `auto`, `http` or `local`.
	pub r#type: String,
	/// Used when auto-detection cannot decide.
	pub default_type: String,
	pub auto_detect: bool,
}

impl Default for SourceConfig {
	fn default() -> Self {
		SourceConfig {
			r#type: String::from("auto"),
			default_type: String::from("http"),
			auto_detect: true,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
	/// `geojson` or `json`.
	pub format: String,
	pub directory: String,
	pub compression: bool,
	pub pretty: bool,
	pub stdout: bool,
	pub metadata: bool,
}

impl Default for OutputConfig {
	fn default() -> Self {
		OutputConfig {
			format: String::from("geojson"),
			directory: String::new(),
			compression: false,
			pretty: true,
			stdout: false,
			metadata: false,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
	pub concurrency: usize,
	pub chunk_size: usize,
	/// Whole-job timeout in seconds.
	pub timeout: u64,
	pub fail_on_error: bool,
}

impl Default for BatchConfig {
	fn default() -> Self {
		BatchConfig {
			concurrency: 10,
			chunk_size: 100,
			timeout: 300,
			fail_on_error: false,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
	pub proxy_url: String,
	pub user_agent: String,
	/// TCP keep-alive in seconds.
	pub keep_alive: u64,
	pub max_idle_conns: usize,
	/// Idle connection timeout in seconds.
	pub idle_conn_timeout: u64,
	pub disable_keep_alive: bool,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		NetworkConfig {
			proxy_url: String::new(),
			user_agent: String::from("tile2json/1.0"),
			keep_alive: 30,
			max_idle_conns: 100,
			idle_conn_timeout: 90,
			disable_keep_alive: false,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
	/// `error`, `warn`, `info`, `debug` or `trace`.
	pub level: String,
	/// `text` or `json`.
	pub format: String,
	/// `stderr` or `stdout`.
	pub output: String,
	pub verbose: bool,
	pub progress: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		LoggingConfig {
			level: String::from("info"),
			format: String::from("text"),
			output: String::from("stderr"),
			verbose: false,
			progress: true,
		}
	}
}

/// Conversion options applied per tile.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
	/// Layers to keep; empty accepts all.
	pub layer_filter: Vec<String>,
	/// Property keys to keep; empty accepts all.
	pub property_filter: Vec<String>,
	/// Douglas–Peucker simplification with tolerance 1.0 in output units.
	pub simplify: bool,
	/// `web-mercator` (meters) or `wgs84` (degrees).
	pub coordinate_system: String,
}

impl Default for ConversionConfig {
	fn default() -> Self {
		ConversionConfig {
			layer_filter: Vec::new(),
			property_filter: Vec::new(),
			simplify: false,
			coordinate_system: String::from("web-mercator"),
		}
	}
}

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "TILE_TO_JSON_";

impl Config {
	/// Loads configuration: defaults, then the YAML file (explicit path, or
	/// `./tile2json.yaml`, or `~/.tile2json.yaml`), then environment
	/// overrides. Validation happens separately, after the CLI applied its
	/// flag overrides.
	pub fn load(path: Option<&Path>) -> Result<Config> {
		let mut config = match path {
			Some(path) => Config::from_file(path)?,
			None => match Config::find_default_file() {
				Some(path) => Config::from_file(&path)?,
				None => Config::default(),
			},
		};
		config.apply_env();
		Ok(config)
	}

	pub fn from_file(path: &Path) -> Result<Config> {
		let text = std::fs::read_to_string(path).with_context(|| format!("failed to read config file {path:?}"))?;
		Config::from_str(&text).with_context(|| format!("failed to parse config file {path:?}"))
	}

	pub fn from_str(text: &str) -> Result<Config> {
		Ok(serde_yaml::from_str(text)?)
	}

	fn find_default_file() -> Option<PathBuf> {
		let local = PathBuf::from("tile2json.yaml");
		if local.is_file() {
			return Some(local);
		}
		let home = env::var_os("HOME")?;
		let in_home = PathBuf::from(home).join(".tile2json.yaml");
		if in_home.is_file() { Some(in_home) } else { None }
	}

	/// Applies `TILE_TO_JSON_*` environment overrides onto `self`.
	pub fn apply_env(&mut self) {
		fn string(key: &str, target: &mut String) {
			if let Ok(value) = env::var(format!("{ENV_PREFIX}{key}")) {
				*target = value;
			}
		}
		fn boolean(key: &str, target: &mut bool) {
			if let Ok(value) = env::var(format!("{ENV_PREFIX}{key}")) {
				match value.to_ascii_lowercase().as_str() {
					"1" | "true" | "yes" => *target = true,
					"0" | "false" | "no" => *target = false,
					other => log::warn!("ignoring {ENV_PREFIX}{key}: not a boolean: {other:?}"),
				}
			}
		}
		fn number<T: std::str::FromStr>(key: &str, target: &mut T) {
			if let Ok(value) = env::var(format!("{ENV_PREFIX}{key}")) {
				match value.parse::<T>() {
					Ok(parsed) => *target = parsed,
					Err(_) => log::warn!("ignoring {ENV_PREFIX}{key}: not a number: {value:?}"),
				}
			}
		}

		string("SERVER_BASE_URL", &mut self.server.base_url);
		string("SERVER_API_KEY", &mut self.server.api_key);
		number("SERVER_TIMEOUT", &mut self.server.timeout);
		number("SERVER_MAX_RETRIES", &mut self.server.max_retries);
		string("SERVER_URL_TEMPLATE", &mut self.server.url_template);

		string("LOCAL_BASE_PATH", &mut self.local.base_path);
		string("LOCAL_PATH_TEMPLATE", &mut self.local.path_template);
		string("LOCAL_EXTENSION", &mut self.local.extension);
		boolean("LOCAL_COMPRESSED", &mut self.local.compressed);

		string("SOURCE_TYPE", &mut self.source.r#type);
		string("SOURCE_DEFAULT_TYPE", &mut self.source.default_type);
		boolean("SOURCE_AUTO_DETECT", &mut self.source.auto_detect);

		string("OUTPUT_FORMAT", &mut self.output.format);
		string("OUTPUT_DIRECTORY", &mut self.output.directory);
		boolean("OUTPUT_COMPRESSION", &mut self.output.compression);
		boolean("OUTPUT_PRETTY", &mut self.output.pretty);
		boolean("OUTPUT_STDOUT", &mut self.output.stdout);
		boolean("OUTPUT_METADATA", &mut self.output.metadata);

		number("BATCH_CONCURRENCY", &mut self.batch.concurrency);
		number("BATCH_CHUNK_SIZE", &mut self.batch.chunk_size);
		number("BATCH_TIMEOUT", &mut self.batch.timeout);
		boolean("BATCH_FAIL_ON_ERROR", &mut self.batch.fail_on_error);

		string("NETWORK_PROXY_URL", &mut self.network.proxy_url);
		string("NETWORK_USER_AGENT", &mut self.network.user_agent);
		number("NETWORK_KEEP_ALIVE", &mut self.network.keep_alive);
		number("NETWORK_MAX_IDLE_CONNS", &mut self.network.max_idle_conns);
		number("NETWORK_IDLE_CONN_TIMEOUT", &mut self.network.idle_conn_timeout);
		boolean("NETWORK_DISABLE_KEEP_ALIVE", &mut self.network.disable_keep_alive);

		string("LOGGING_LEVEL", &mut self.logging.level);
		string("LOGGING_FORMAT", &mut self.logging.format);
		string("LOGGING_OUTPUT", &mut self.logging.output);
		boolean("LOGGING_VERBOSE", &mut self.logging.verbose);
		boolean("LOGGING_PROGRESS", &mut self.logging.progress);

		string("CONVERSION_COORDINATE_SYSTEM", &mut self.conversion.coordinate_system);
		boolean("CONVERSION_SIMPLIFY", &mut self.conversion.simplify);
	}

	/// Expands the URL template for a tile.
	#[must_use]
	pub fn tile_url(&self, coord: &TileCoord) -> String {
		expand_template(&self.server.url_template, &self.server.base_url, coord)
	}

	/// Expands the local path template for a tile, honoring the configured
	/// extension and the `.gz` suffix for compressed trees.
	#[must_use]
	pub fn tile_path(&self, coord: &TileCoord) -> String {
		let mut path = expand_template(&self.local.path_template, &self.local.base_path, coord);
		if let Some(stripped) = path.strip_suffix(".mvt") {
			let mut extension = self.local.extension.clone();
			if self.local.compressed {
				extension.push_str(".gz");
			}
			path = format!("{stripped}{extension}");
		} else if self.local.compressed && !path.ends_with(".gz") {
			path.push_str(".gz");
		}
		path
	}

	/// Resolves the source type: explicit configuration wins, otherwise a
	/// single configured base decides, otherwise the default type.
	#[must_use]
	pub fn determine_source_type(&self) -> SourceType {
		if !self.source.auto_detect || self.source.r#type != "auto" {
			return if self.source.r#type == "local" {
				SourceType::Local
			} else {
				SourceType::Http
			};
		}

		let has_url = !self.server.base_url.is_empty();
		let has_path = !self.local.base_path.is_empty();
		match (has_url, has_path) {
			(true, false) => SourceType::Http,
			(false, true) => SourceType::Local,
			_ => {
				if self.source.default_type == "local" {
					SourceType::Local
				} else {
					SourceType::Http
				}
			}
		}
	}

	#[must_use]
	pub fn server_timeout(&self) -> Duration {
		Duration::from_secs(self.server.timeout)
	}

	#[must_use]
	pub fn batch_timeout(&self) -> Duration {
		Duration::from_secs(self.batch.timeout)
	}
}

fn expand_template(template: &str, base: &str, coord: &TileCoord) -> String {
	template
		.replace("{base_url}", base)
		.replace("{base_path}", base)
		.replace("{z}", &coord.z.to_string())
		.replace("{x}", &coord.x.to_string())
		.replace("{y}", &coord.y.to_string())
}
