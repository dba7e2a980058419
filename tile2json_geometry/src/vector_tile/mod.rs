//! Decoder for the Mapbox Vector Tile wire format (spec v2, accepting v1).
//!
//! The decoder walks the protobuf encoding directly: a tile is a sequence of
//! layers (field 3), each layer carries its name, features, pooled property
//! keys/values, extent and version. Feature geometries arrive as a
//! command-integer stream with zig-zag deltas.
//!
//! Error policy: a malformed feature is logged and skipped; a malformed
//! layer fails the whole tile; empty input is its own error.

mod feature;
mod geometry_type;
mod layer;
mod tile;
mod value;

pub use feature::DecodedFeature;
pub use geometry_type::GeomType;
pub use layer::DecodedLayer;
pub use tile::{DecodeError, DecodedTile, decode};
