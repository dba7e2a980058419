//! Geographic bounding boxes in degrees.

use anyhow::{Result, bail, ensure};
use std::fmt::Debug;
use std::str::FromStr;

/// A geographic bounding box `(min_lon, min_lat, max_lon, max_lat)`.
///
/// Longitudes are in `[-180, 180]`, latitudes in `[-90, 90]`, and minimums
/// must not exceed maximums. A bbox crossing the antimeridian
/// (`min_lon > max_lon`) is rejected; callers have to split it at ±180°.
#[derive(Clone, Copy, PartialEq)]
pub struct GeoBBox {
	pub min_lon: f64,
	pub min_lat: f64,
	pub max_lon: f64,
	pub max_lat: f64,
}

impl GeoBBox {
	pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<GeoBBox> {
		let bbox = GeoBBox {
			min_lon,
			min_lat,
			max_lon,
			max_lat,
		};
		bbox.check()?;
		Ok(bbox)
	}

	pub fn check(&self) -> Result<()> {
		ensure!(self.min_lon >= -180.0, "min_lon ({}) must be >= -180", self.min_lon);
		ensure!(self.min_lat >= -90.0, "min_lat ({}) must be >= -90", self.min_lat);
		ensure!(self.max_lon <= 180.0, "max_lon ({}) must be <= 180", self.max_lon);
		ensure!(self.max_lat <= 90.0, "max_lat ({}) must be <= 90", self.max_lat);
		ensure!(
			self.min_lon <= self.max_lon,
			"min_lon ({}) must be <= max_lon ({}); bounding boxes crossing the antimeridian are not supported, split the bbox at ±180°",
			self.min_lon,
			self.max_lon
		);
		ensure!(
			self.min_lat <= self.max_lat,
			"min_lat ({}) must be <= max_lat ({})",
			self.min_lat,
			self.max_lat
		);
		Ok(())
	}
}

impl FromStr for GeoBBox {
	type Err = anyhow::Error;

	/// Parses the CLI form `min_lon,min_lat,max_lon,max_lat`.
	fn from_str(s: &str) -> Result<Self> {
		let values = s
			.split(',')
			.map(|part| {
				part
					.trim()
					.parse::<f64>()
					.map_err(|_| anyhow::anyhow!("invalid coordinate value: {part:?}"))
			})
			.collect::<Result<Vec<f64>>>()?;
		if values.len() != 4 {
			bail!("bounding box must have 4 values: min_lon,min_lat,max_lon,max_lat");
		}
		GeoBBox::new(values[0], values[1], values[2], values[3])
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{},{},{},{}", self.min_lon, self.min_lat, self.max_lon, self.max_lat)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_cli_form() {
		let bbox: GeoBBox = "-74.0, 40.7, -73.9, 40.8".parse().unwrap();
		assert_eq!(bbox.min_lon, -74.0);
		assert_eq!(bbox.max_lat, 40.8);
	}

	#[test]
	fn rejects_antimeridian_crossing() {
		let err = "170.0,40.0,-170.0,41.0".parse::<GeoBBox>().unwrap_err();
		assert!(err.to_string().contains("antimeridian"));
	}

	#[test]
	fn rejects_wrong_arity_and_garbage() {
		assert!("1,2,3".parse::<GeoBBox>().is_err());
		assert!("a,b,c,d".parse::<GeoBBox>().is_err());
	}

	#[test]
	fn rejects_out_of_range() {
		assert!(GeoBBox::new(-181.0, 0.0, 0.0, 1.0).is_err());
		assert!(GeoBBox::new(0.0, 0.0, 0.0, 91.0).is_err());
		assert!(GeoBBox::new(0.0, 1.0, 0.0, 0.0).is_err());
	}
}
