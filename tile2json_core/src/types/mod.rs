mod blob;
mod geo_bbox;
mod tile_coord;
mod tile_range;

pub use blob::Blob;
pub use geo_bbox::GeoBBox;
pub use tile_coord::{MAX_ZOOM, TileCoord};
pub use tile_range::TileRange;
