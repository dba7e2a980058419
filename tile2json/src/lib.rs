//! tile2json: convert Mapbox Vector Tiles to GeoJSON.
//!
//! The binary exposes two subcommands: `convert` for a single tile and
//! `batch` for concurrent range processing. The library modules behind them:
//!
//! - [`config`] — configuration structs, YAML + environment loading,
//!   validation and source selection.
//! - [`fetch`] — the tile source abstraction with HTTP and local-filesystem
//!   implementations behind one async trait.
//! - [`processor`] — MVT decode, coordinate promotion, filtering and
//!   GeoJSON assembly.
//! - [`output`] — formatters (GeoJSON / JSON envelope) and writers
//!   (stdout, single file, per-tile tree).
//! - [`batch`] — the chunked batch executor with worker pool, progress
//!   tracking and cooperative cancellation.

pub mod batch;
pub mod config;
pub mod fetch;
pub mod output;
pub mod processor;
pub mod tools;
pub mod types;
