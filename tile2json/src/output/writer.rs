//! Writers: stdout, single file, per-tile directory tree.
//!
//! All three sit behind [`Writer`]. The executor is the only caller and
//! invokes `write_batch` once per chunk; `close` flushes and, for gzip
//! output, finishes the compression stream before the file is closed.

use super::{Format, Formatter};
use crate::types::ProcessedTile;
use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Destination for rendered tiles.
pub trait Writer: Send {
	/// Writes one tile.
	fn write(&mut self, tile: &ProcessedTile) -> Result<()>;

	/// Writes a chunk of tiles as one batch operation.
	fn write_batch(&mut self, tiles: &[ProcessedTile]) -> Result<()>;

	/// Flushes and closes the destination. Idempotent.
	fn close(&mut self) -> Result<()>;

	/// Bytes handed to the destination so far (before file compression).
	fn bytes_written(&self) -> u64;
}

/// Creates the writer matching the CLI's output selection.
pub fn new_writer(
	formatter: Formatter,
	destination: &str,
	multi_file: bool,
	compression: bool,
) -> Result<Box<dyn Writer>> {
	if destination.is_empty() || destination == "-" {
		return Ok(Box::new(StdoutWriter::new(formatter)));
	}
	if multi_file {
		return Ok(Box::new(MultiFileWriter::new(formatter, destination, compression)?));
	}
	Ok(Box::new(FileWriter::new(formatter, destination, compression)?))
}

// ----------------------------------------------------------------------------
// stdout
// ----------------------------------------------------------------------------

/// Writes each document to stdout, newline-terminated.
pub struct StdoutWriter {
	formatter: Formatter,
	bytes_written: u64,
}

impl StdoutWriter {
	pub fn new(formatter: Formatter) -> StdoutWriter {
		StdoutWriter {
			formatter,
			bytes_written: 0,
		}
	}

	fn emit(&mut self, text: String) -> Result<()> {
		let mut stdout = std::io::stdout().lock();
		stdout.write_all(text.as_bytes()).context("failed to write to stdout")?;
		stdout.write_all(b"\n").context("failed to write to stdout")?;
		self.bytes_written += text.len() as u64 + 1;
		Ok(())
	}
}

impl Writer for StdoutWriter {
	fn write(&mut self, tile: &ProcessedTile) -> Result<()> {
		self.emit(self.formatter.format_tile(tile))
	}

	fn write_batch(&mut self, tiles: &[ProcessedTile]) -> Result<()> {
		self.emit(self.formatter.format_batch(tiles))
	}

	fn close(&mut self) -> Result<()> {
		std::io::stdout().flush().context("failed to flush stdout")
	}

	fn bytes_written(&self) -> u64 {
		self.bytes_written
	}
}

// ----------------------------------------------------------------------------
// single file
// ----------------------------------------------------------------------------

enum Sink {
	Plain(File),
	Gzip(GzEncoder<File>),
}

impl Sink {
	fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
		match self {
			Sink::Plain(file) => file.write_all(data),
			Sink::Gzip(encoder) => encoder.write_all(data),
		}
	}

	fn finish(self) -> std::io::Result<()> {
		match self {
			Sink::Plain(mut file) => file.flush(),
			// The gzip trailer must land before the file is dropped.
			Sink::Gzip(encoder) => encoder.finish().and_then(|mut file| file.flush()),
		}
	}
}

/// All output into one destination file, optionally gzipped.
pub struct FileWriter {
	formatter: Formatter,
	sink: Option<Sink>,
	path: PathBuf,
	bytes_written: u64,
}

impl FileWriter {
	/// Opens (and truncates) the destination. With compression enabled a
	/// `.gz` suffix is appended unless already present.
	pub fn new(formatter: Formatter, destination: &str, compression: bool) -> Result<FileWriter> {
		let mut path = PathBuf::from(destination);
		if compression && path.extension().is_none_or(|ext| !ext.eq_ignore_ascii_case("gz")) {
			path = PathBuf::from(format!("{destination}.gz"));
		}

		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent).with_context(|| format!("failed to create directory {parent:?}"))?;
			}
		}

		let file = File::create(&path).with_context(|| format!("failed to create file {path:?}"))?;
		let sink = if compression {
			Sink::Gzip(GzEncoder::new(file, Compression::default()))
		} else {
			Sink::Plain(file)
		};

		Ok(FileWriter {
			formatter,
			sink: Some(sink),
			path,
			bytes_written: 0,
		})
	}

	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn emit(&mut self, text: String) -> Result<()> {
		let sink = match self.sink.as_mut() {
			Some(sink) => sink,
			None => bail!("writer is already closed"),
		};
		sink
			.write_all(text.as_bytes())
			.with_context(|| format!("failed to write to {:?}", self.path))?;
		sink
			.write_all(b"\n")
			.with_context(|| format!("failed to write to {:?}", self.path))?;
		self.bytes_written += text.len() as u64 + 1;
		Ok(())
	}
}

impl Writer for FileWriter {
	fn write(&mut self, tile: &ProcessedTile) -> Result<()> {
		self.emit(self.formatter.format_tile(tile))
	}

	fn write_batch(&mut self, tiles: &[ProcessedTile]) -> Result<()> {
		self.emit(self.formatter.format_batch(tiles))
	}

	fn close(&mut self) -> Result<()> {
		if let Some(sink) = self.sink.take() {
			sink.finish().with_context(|| format!("failed to close {:?}", self.path))?;
		}
		Ok(())
	}

	fn bytes_written(&self) -> u64 {
		self.bytes_written
	}
}

// ----------------------------------------------------------------------------
// per-tile tree
// ----------------------------------------------------------------------------

/// One file per tile at `<base_dir>/<z>/<x>/<y>.<ext>[.gz]`.
///
/// Existing tile files are overwritten, which keeps reruns idempotent.
pub struct MultiFileWriter {
	formatter: Formatter,
	base_dir: PathBuf,
	compression: bool,
	bytes_written: u64,
}

impl MultiFileWriter {
	pub fn new(formatter: Formatter, base_dir: &str, compression: bool) -> Result<MultiFileWriter> {
		fs::create_dir_all(base_dir).with_context(|| format!("failed to create base directory {base_dir:?}"))?;
		Ok(MultiFileWriter {
			formatter,
			base_dir: PathBuf::from(base_dir),
			compression,
			bytes_written: 0,
		})
	}

	fn tile_path(&self, tile: &ProcessedTile) -> PathBuf {
		let mut extension = self.formatter.format().extension().to_string();
		if self.compression {
			extension.push_str(".gz");
		}
		self
			.base_dir
			.join(tile.coord.z.to_string())
			.join(tile.coord.x.to_string())
			.join(format!("{}{extension}", tile.coord.y))
	}
}

impl Writer for MultiFileWriter {
	fn write(&mut self, tile: &ProcessedTile) -> Result<()> {
		let path = self.tile_path(tile);
		let parent = path.parent().unwrap();
		fs::create_dir_all(parent).with_context(|| format!("failed to create directory {parent:?}"))?;

		let text = self.formatter.format_tile(tile);
		let file = File::create(&path).with_context(|| format!("failed to create file {path:?}"))?;
		let mut sink = if self.compression {
			Sink::Gzip(GzEncoder::new(file, Compression::default()))
		} else {
			Sink::Plain(file)
		};
		sink
			.write_all(text.as_bytes())
			.with_context(|| format!("failed to write to {path:?}"))?;
		sink.finish().with_context(|| format!("failed to close {path:?}"))?;

		self.bytes_written += text.len() as u64;
		Ok(())
	}

	fn write_batch(&mut self, tiles: &[ProcessedTile]) -> Result<()> {
		for tile in tiles {
			self
				.write(tile)
				.with_context(|| format!("failed to write tile {}", tile.coord))?;
		}
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		Ok(())
	}

	fn bytes_written(&self) -> u64 {
		self.bytes_written
	}
}
