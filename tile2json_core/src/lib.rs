//! Core building blocks shared by the tile2json crates.
//!
//! This crate carries no domain logic of its own: it provides the tile
//! coordinate model ([`TileCoord`], [`TileRange`], [`GeoBBox`]), the byte
//! buffer type [`Blob`], low-level protobuf readers/writers used by the MVT
//! decoder, gzip helpers, a small JSON value model with deterministic
//! serialization, and a terminal progress line.

pub mod io;
pub mod json;
pub mod types;
pub mod utils;

pub use types::{Blob, GeoBBox, TileCoord, TileRange};
