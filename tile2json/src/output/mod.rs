//! Output formatting and writing.
//!
//! A [`Formatter`] renders processed tiles as GeoJSON or as a thin JSON
//! envelope, compact or two-space pretty. A [`Writer`] delivers the
//! rendered bytes to stdout, a single file, or a per-tile directory tree,
//! optionally gzipped.

mod formatter;
mod writer;

pub use formatter::{Format, Formatter};
pub use writer::{FileWriter, MultiFileWriter, StdoutWriter, Writer, new_writer};
