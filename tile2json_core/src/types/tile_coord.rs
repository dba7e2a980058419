//! Slippy-map tile coordinates.
//!
//! A [`TileCoord`] addresses one tile in the `2^z × 2^z` grid of a zoom
//! level. The display form is `z/x/y`, matching the path layout used by tile
//! servers and local tile trees.

use anyhow::{Result, bail, ensure};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

/// Highest zoom level the converter accepts.
pub const MAX_ZOOM: u8 = 22;

/// A tile address `(z, x, y)` with `x, y < 2^z`.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct TileCoord {
	pub z: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	/// Creates a validated tile coordinate.
	///
	/// Fails when `z > 22` or either axis falls outside the `2^z` grid.
	pub fn new(z: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(z <= MAX_ZOOM, "invalid zoom level {z}: must be between 0 and {MAX_ZOOM}");
		let max = 1u32 << z;
		ensure!(x < max, "invalid x coordinate {x} for zoom {z}: must be between 0 and {}", max - 1);
		ensure!(y < max, "invalid y coordinate {y} for zoom {z}: must be between 0 and {}", max - 1);
		Ok(TileCoord { z, x, y })
	}

	/// Converts geographic coordinates (degrees) to the tile containing them,
	/// using the standard slippy-map formula.
	///
	/// Longitude/latitude outside the Web Mercator domain are clamped onto
	/// the grid edge.
	pub fn from_geo(lon: f64, lat: f64, z: u8) -> Result<TileCoord> {
		ensure!(z <= MAX_ZOOM, "invalid zoom level {z}: must be between 0 and {MAX_ZOOM}");
		let n = (1u32 << z) as f64;
		let x = ((lon + 180.0) / 360.0 * n).floor();
		let lat_rad = lat.to_radians();
		let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();

		let max = n - 1.0;
		TileCoord::new(z, x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
	}

	/// True when the coordinate lies inside the grid of its zoom level.
	#[must_use]
	pub fn is_valid(&self) -> bool {
		let max = 1u32 << self.z;
		self.z <= MAX_ZOOM && self.x < max && self.y < max
	}
}

impl Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.z, self.x, self.y)
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}/{}/{})", self.z, self.x, self.y)
	}
}

impl FromStr for TileCoord {
	type Err = anyhow::Error;

	/// Parses the `z/x/y` display form.
	fn from_str(s: &str) -> Result<Self> {
		let parts: Vec<&str> = s.trim().split('/').collect();
		if parts.len() != 3 {
			bail!("invalid tile format {s:?} (expected z/x/y)");
		}
		let z = parts[0].parse::<u8>().map_err(|_| anyhow::anyhow!("invalid zoom level: {}", parts[0]))?;
		let x = parts[1].parse::<u32>().map_err(|_| anyhow::anyhow!("invalid x coordinate: {}", parts[1]))?;
		let y = parts[2].parse::<u32>().map_err(|_| anyhow::anyhow!("invalid y coordinate: {}", parts[2]))?;
		TileCoord::new(z, x, y)
	}
}

impl PartialOrd for TileCoord {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for TileCoord {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self
			.z
			.cmp(&other.z)
			.then(self.x.cmp(&other.x))
			.then(self.y.cmp(&other.y))
	}
}
