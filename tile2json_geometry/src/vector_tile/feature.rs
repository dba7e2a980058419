//! Feature decoding: wire fields and the command-integer geometry stream.

use super::geometry_type::GeomType;
use crate::geo::{Coordinates1, Coordinates2, GeoProperties, Geometry};
use crate::math::area_ring;
use anyhow::{Context, Result, bail, ensure};
use tile2json_core::Blob;
use tile2json_core::io::ValueReader;

/// A feature with its properties resolved and geometry decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFeature {
	pub id: Option<u64>,
	pub properties: GeoProperties,
	pub geometry: Geometry,
}

/// The wire-level feature before tag resolution and geometry decoding.
#[derive(Debug, Default)]
pub(crate) struct RawFeature {
	pub id: Option<u64>,
	pub tag_ids: Vec<u32>,
	pub geom_type: GeomType,
	pub geom_data: Blob,
}

impl RawFeature {
	pub(crate) fn read(reader: &mut ValueReader) -> Result<RawFeature> {
		let mut feature = RawFeature::default();

		while reader.has_remaining() {
			match reader.read_pbf_key()? {
				(1, 0) => feature.id = Some(reader.read_varint().context("failed to read feature id")?),
				(2, 2) => {
					feature.tag_ids = reader
						.read_pbf_packed_uint32()
						.context("failed to read feature tags")?
				}
				(3, 0) => {
					feature.geom_type = GeomType::from(reader.read_varint().context("failed to read geometry type")?)
				}
				(4, 2) => {
					feature.geom_data = reader
						.read_pbf_blob()
						.context("failed to read geometry data")?
				}
				(_, wire_type) => reader.skip_pbf_field(wire_type)?,
			}
		}

		Ok(feature)
	}

	/// Decodes the command-integer stream into a typed geometry.
	///
	/// Single-part results become `Point`/`LineString`/`Polygon`; multiple
	/// parts become the corresponding multi variant. Polygon rings are
	/// grouped by the sign of their shoelace area: positive starts a new
	/// polygon, negative attaches as an interior ring.
	pub(crate) fn decode_geometry(&self) -> Result<Geometry> {
		let parts = self.decode_parts()?;

		match self.geom_type {
			GeomType::Unknown => bail!("unknown geometry type"),

			GeomType::Point => {
				ensure!(!parts.is_empty(), "point geometry contains no coordinates");
				let mut points: Coordinates1 = Vec::with_capacity(parts.len());
				for mut part in parts {
					ensure!(part.len() == 1, "point parts must have exactly one coordinate");
					points.push(part.pop().unwrap());
				}
				if points.len() == 1 {
					Ok(Geometry::Point(points[0]))
				} else {
					Ok(Geometry::MultiPoint(points))
				}
			}

			GeomType::LineString => {
				ensure!(!parts.is_empty(), "line geometry contains no coordinates");
				for part in &parts {
					ensure!(part.len() >= 2, "each line string needs at least two points");
				}
				if parts.len() == 1 {
					Ok(Geometry::LineString(parts.into_iter().next().unwrap()))
				} else {
					Ok(Geometry::MultiLineString(parts))
				}
			}

			GeomType::Polygon => {
				ensure!(!parts.is_empty(), "polygon geometry contains no coordinates");
				let mut polygons: Vec<Coordinates2> = Vec::new();
				let mut current: Coordinates2 = Vec::new();

				for ring in parts {
					ensure!(ring.len() >= 4, "each polygon ring needs at least four points (A,B,C,A)");
					ensure!(
						ring[0] == ring[ring.len() - 1],
						"polygon ring is not closed"
					);

					let area = area_ring(&ring);
					if area > 1e-14 {
						if !current.is_empty() {
							polygons.push(current);
							current = Vec::new();
						}
						current.push(ring);
					} else if area < -1e-14 {
						if current.is_empty() {
							log::warn!("interior ring without a preceding exterior ring, skipping");
						} else {
							current.push(ring);
						}
					} else {
						log::warn!("polygon ring with zero area, skipping");
					}
				}
				if !current.is_empty() {
					polygons.push(current);
				}
				ensure!(!polygons.is_empty(), "polygon geometry contains no valid rings");

				if polygons.len() == 1 {
					Ok(Geometry::Polygon(polygons.into_iter().next().unwrap()))
				} else {
					Ok(Geometry::MultiPolygon(polygons))
				}
			}
		}
	}

	/// Runs the command stream: `MoveTo` (1) starts a part, `LineTo` (2)
	/// extends it, `ClosePath` (7) repeats the part's first point. Deltas
	/// are zig-zag encoded and accumulate into a cursor.
	fn decode_parts(&self) -> Result<Coordinates2> {
		let mut reader = ValueReader::new(self.geom_data.as_slice());
		let mut parts: Coordinates2 = Vec::new();
		let mut part: Coordinates1 = Vec::new();
		let mut x = 0i64;
		let mut y = 0i64;

		while reader.has_remaining() {
			let value = reader.read_varint().context("failed to read geometry command")?;
			let command = value & 0x7;
			let count = value >> 3;

			match command {
				1 | 2 => {
					for _ in 0..count {
						if command == 1 && !part.is_empty() {
							parts.push(part);
							part = Vec::new();
						}
						x += reader.read_svarint().context("failed to read x delta")?;
						y += reader.read_svarint().context("failed to read y delta")?;
						part.push([x as f64, y as f64]);
					}
				}
				7 => {
					ensure!(!part.is_empty(), "ClosePath on an empty ring");
					part.push(part[0]);
				}
				_ => bail!("unknown geometry command {command}"),
			}
		}

		if !part.is_empty() {
			parts.push(part);
		}

		Ok(parts)
	}
}
