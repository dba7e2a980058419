//! Inclusive tile ranges spanning one or more zoom levels.
//!
//! A [`TileRange`] is the unit of batch work: the same `x`/`y` rectangle
//! applied to every zoom level in `min_z..=max_z`. Enumeration is
//! deterministic (z-major, then x, then y ascending), which the batch
//! executor relies on for stable chunking.

use crate::types::{GeoBBox, TileCoord};
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::fmt::Debug;

/// An inclusive cuboid of tiles: `min_z..=max_z` × `min_x..=max_x` × `min_y..=max_y`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
	pub min_z: u8,
	pub max_z: u8,
	pub min_x: u32,
	pub max_x: u32,
	pub min_y: u32,
	pub max_y: u32,
}

impl TileRange {
	/// Creates a validated range.
	///
	/// Every `(z, min_x..=max_x, min_y..=max_y)` slice must fit the `2^z`
	/// grid, so the maximums are checked against the smallest zoom level.
	pub fn new(min_z: u8, max_z: u8, min_x: u32, max_x: u32, min_y: u32, max_y: u32) -> Result<TileRange> {
		ensure!(min_z <= max_z, "min zoom ({min_z}) cannot be greater than max zoom ({max_z})");
		ensure!(max_z <= super::tile_coord::MAX_ZOOM, "zoom levels must be between 0 and 22");
		ensure!(min_x <= max_x, "min x ({min_x}) cannot be greater than max x ({max_x})");
		ensure!(min_y <= max_y, "min y ({min_y}) cannot be greater than max y ({max_y})");

		let grid = 1u64 << min_z;
		ensure!(
			(max_x as u64) < grid,
			"x coordinates for zoom {min_z} must be between 0 and {}",
			grid - 1
		);
		ensure!(
			(max_y as u64) < grid,
			"y coordinates for zoom {min_z} must be between 0 and {}",
			grid - 1
		);

		Ok(TileRange {
			min_z,
			max_z,
			min_x,
			max_x,
			min_y,
			max_y,
		})
	}

	/// A range containing exactly one tile.
	pub fn from_coord(coord: TileCoord) -> TileRange {
		TileRange {
			min_z: coord.z,
			max_z: coord.z,
			min_x: coord.x,
			max_x: coord.x,
			min_y: coord.y,
			max_y: coord.y,
		}
	}

	/// Computes the tile rectangle covering `bbox` at a single zoom level.
	pub fn from_geo(z: u8, bbox: &GeoBBox) -> Result<TileRange> {
		bbox.check()?;
		let min = TileCoord::from_geo(bbox.min_lon, bbox.max_lat, z)?;
		let max = TileCoord::from_geo(bbox.max_lon, bbox.min_lat, z)?;
		TileRange::new(z, z, min.x, max.x, min.y, max.y)
	}

	/// The full `2^z` grid at a single zoom level.
	pub fn full(z: u8) -> Result<TileRange> {
		ensure!(z <= super::tile_coord::MAX_ZOOM, "zoom levels must be between 0 and 22");
		let max = (1u32 << z) - 1;
		TileRange::new(z, z, 0, max, 0, max)
	}

	/// Total number of tiles in the range.
	#[must_use]
	pub fn count(&self) -> u64 {
		let dx = (self.max_x - self.min_x + 1) as u64;
		let dy = (self.max_y - self.min_y + 1) as u64;
		(self.max_z - self.min_z + 1) as u64 * dx * dy
	}

	/// Iterates all tiles, z-major, then x, then y ascending.
	pub fn iter_coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
		(self.min_z..=self.max_z).flat_map(move |z| {
			(self.min_x..=self.max_x)
				.cartesian_product(self.min_y..=self.max_y)
				.map(move |(x, y)| TileCoord { z, x, y })
		})
	}
}

impl Debug for TileRange {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"TileRange(z {}..={}, x {}..={}, y {}..={})",
			self.min_z, self.max_z, self.min_x, self.max_x, self.min_y, self.max_y
		)
	}
}
