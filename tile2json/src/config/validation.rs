//! Configuration validation.
//!
//! Checks legal enum values, positivity, URL syntax, template placeholders
//! and the cross-field rule that the resolved source type has its required
//! fields populated.

use super::Config;
use crate::types::SourceType;
use anyhow::{Context, Result, ensure};
use std::path::Path;

const MAX_CONCURRENCY: usize = 1000;

/// Full validation including the cross-field check that the resolved
/// source type has its required fields populated.
pub fn validate(config: &Config) -> Result<()> {
	validate_sections(config)?;
	validate_source_combination(config).context("source configuration combination invalid")?;
	Ok(())
}

/// Per-section validation without the cross-field source check. Used when
/// an explicit `--url`/`--file` bypasses the configured source entirely.
pub fn validate_sections(config: &Config) -> Result<()> {
	validate_source(config).context("source configuration invalid")?;
	validate_server(config).context("server configuration invalid")?;
	validate_local(config).context("local configuration invalid")?;
	validate_output(config).context("output configuration invalid")?;
	validate_batch(config).context("batch configuration invalid")?;
	validate_network(config).context("network configuration invalid")?;
	validate_logging(config).context("logging configuration invalid")?;
	Ok(())
}

fn one_of(value: &str, allowed: &[&str], what: &str) -> Result<()> {
	ensure!(
		allowed.contains(&value),
		"invalid {what}: {value:?}, must be one of {allowed:?}"
	);
	Ok(())
}

fn validate_source(config: &Config) -> Result<()> {
	one_of(&config.source.r#type, &["http", "local", "auto"], "source type")?;
	one_of(&config.source.default_type, &["http", "local"], "default source type")?;
	Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
	// Server configuration is optional when only local tiles are used.
	if config.server.base_url.is_empty() {
		return Ok(());
	}

	reqwest::Url::parse(&config.server.base_url)
		.with_context(|| format!("invalid base_url: {:?}", config.server.base_url))?;

	ensure!(config.server.timeout > 0, "timeout must be positive");
	ensure!(!config.server.url_template.is_empty(), "url_template is required when base_url is specified");
	validate_template(&config.server.url_template, "url_template")?;
	Ok(())
}

fn validate_local(config: &Config) -> Result<()> {
	// Local configuration is optional when only HTTP sources are used.
	if config.local.base_path.is_empty() {
		return Ok(());
	}

	let base = Path::new(&config.local.base_path);
	ensure!(base.exists(), "base_path does not exist: {}", config.local.base_path);
	ensure!(base.is_dir(), "base_path is not a directory: {}", config.local.base_path);

	ensure!(
		!config.local.path_template.is_empty(),
		"path_template is required when base_path is specified"
	);
	validate_template(&config.local.path_template, "path_template")?;

	ensure!(!config.local.extension.is_empty(), "extension must not be empty");
	ensure!(
		config.local.extension.starts_with('.'),
		"extension must start with a dot: {:?}",
		config.local.extension
	);
	Ok(())
}

fn validate_template(template: &str, what: &str) -> Result<()> {
	for placeholder in ["{z}", "{x}", "{y}"] {
		ensure!(
			template.contains(placeholder),
			"{what} must contain the {placeholder} placeholder"
		);
	}
	Ok(())
}

fn validate_output(config: &Config) -> Result<()> {
	one_of(&config.output.format, &["geojson", "json"], "output format")?;
	Ok(())
}

fn validate_batch(config: &Config) -> Result<()> {
	ensure!(config.batch.concurrency > 0, "concurrency must be positive");
	ensure!(
		config.batch.concurrency <= MAX_CONCURRENCY,
		"concurrency must be <= {MAX_CONCURRENCY}"
	);
	ensure!(config.batch.chunk_size > 0, "chunk size must be positive");
	ensure!(config.batch.timeout > 0, "timeout must be positive");
	Ok(())
}

fn validate_network(config: &Config) -> Result<()> {
	if !config.network.proxy_url.is_empty() {
		reqwest::Url::parse(&config.network.proxy_url)
			.with_context(|| format!("invalid proxy_url: {:?}", config.network.proxy_url))?;
	}
	ensure!(!config.network.user_agent.is_empty(), "user_agent must not be empty");
	Ok(())
}

fn validate_logging(config: &Config) -> Result<()> {
	one_of(
		&config.logging.level,
		&["error", "warn", "info", "debug", "trace"],
		"log level",
	)?;
	one_of(&config.logging.format, &["text", "json"], "log format")?;
	one_of(&config.logging.output, &["stderr", "stdout"], "log output")?;
	one_of(
		&config.conversion.coordinate_system,
		&["web-mercator", "wgs84"],
		"coordinate system",
	)?;
	Ok(())
}

fn validate_source_combination(config: &Config) -> Result<()> {
	match config.determine_source_type() {
		SourceType::Http => {
			ensure!(
				!config.server.base_url.is_empty(),
				"base_url is required for the http source type"
			);
		}
		SourceType::Local => {
			ensure!(
				!config.local.base_path.is_empty(),
				"base_path is required for the local source type"
			);
			let base = Path::new(&config.local.base_path);
			ensure!(base.is_dir(), "base_path must be a directory");
		}
	}
	Ok(())
}
