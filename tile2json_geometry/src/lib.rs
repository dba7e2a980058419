//! Geometry model and MVT decoding for tile2json.
//!
//! The [`geo`] module defines the GeoJSON-shaped feature model (geometries,
//! typed property values, features). [`vector_tile`] decodes the Mapbox
//! Vector Tile wire format into that model. [`transform`] provides the
//! per-vertex coordinate transforms (tile grid → Web Mercator → WGS-84) and
//! [`simplify`] the Douglas–Peucker reduction.

pub mod geo;
pub mod math;
pub mod simplify;
pub mod transform;
pub mod vector_tile;
