//! Coordinate transforms between tile space, Web Mercator and WGS-84.
//!
//! Both transforms are plain `Point -> Point` functions; chain them through
//! [`Geometry::map_points`](crate::geo::Geometry::map_points). Tile-local
//! integer coordinates are promoted to Web Mercator meters during
//! conversion; the optional second hop converts meters to degrees.

use crate::geo::Point;
use std::f64::consts::PI;
use tile2json_core::TileCoord;

/// Half the extent of the Web Mercator plane in meters (EPSG:3857).
pub const WEB_MERCATOR_MAX: f64 = 20037508.342789244;

/// Latitude bound of the Web Mercator projection, in degrees.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.05112878;

/// Returns the transform from tile-local coordinates (grid `0..extent`) of
/// `coord` to Web Mercator meters.
pub fn tile_to_mercator(coord: TileCoord, extent: u32) -> impl Fn(Point) -> Point {
	let n = (1u64 << coord.z) as f64;
	let extent = extent as f64;
	let tile_x = coord.x as f64;
	let tile_y = coord.y as f64;

	move |p: Point| {
		let global_x = (tile_x + p[0] / extent) / n;
		let global_y = (tile_y + p[1] / extent) / n;
		[
			(global_x * 2.0 - 1.0) * WEB_MERCATOR_MAX,
			(1.0 - global_y * 2.0) * WEB_MERCATOR_MAX,
		]
	}
}

/// Converts a Web Mercator point (meters) to WGS-84 degrees.
pub fn mercator_to_wgs84(p: Point) -> Point {
	let lon = p[0] / WEB_MERCATOR_MAX * 180.0;
	let lat = 180.0 / PI * (2.0 * ((p[1] / WEB_MERCATOR_MAX) * PI).exp().atan() - PI / 2.0);
	[lon, lat]
}

/// Converts a WGS-84 point (degrees) to Web Mercator meters.
pub fn wgs84_to_mercator(p: Point) -> Point {
	let x = p[0] / 180.0 * WEB_MERCATOR_MAX;
	let y = (PI / 4.0 + p[1].to_radians() / 2.0).tan().ln() / PI * WEB_MERCATOR_MAX;
	[x, y]
}
