//! The six GeoJSON geometry variants over a shared coordinate nesting.

use std::fmt::Debug;
use tile2json_core::json::{JsonObject, JsonValue};

/// A single vertex.
pub type Point = [f64; 2];
/// A run of vertices (line string or ring).
pub type Coordinates1 = Vec<Point>;
/// A list of runs (multi line string, polygon rings).
pub type Coordinates2 = Vec<Coordinates1>;
/// A list of polygons.
pub type Coordinates3 = Vec<Coordinates2>;

/// A GeoJSON geometry.
#[derive(Clone, PartialEq)]
pub enum Geometry {
	Point(Point),
	LineString(Coordinates1),
	Polygon(Coordinates2),
	MultiPoint(Coordinates1),
	MultiLineString(Coordinates2),
	MultiPolygon(Coordinates3),
}

impl Geometry {
	/// The GeoJSON `type` member.
	#[must_use]
	pub fn type_name(&self) -> &'static str {
		match self {
			Geometry::Point(_) => "Point",
			Geometry::LineString(_) => "LineString",
			Geometry::Polygon(_) => "Polygon",
			Geometry::MultiPoint(_) => "MultiPoint",
			Geometry::MultiLineString(_) => "MultiLineString",
			Geometry::MultiPolygon(_) => "MultiPolygon",
		}
	}

	/// Applies `transform` to every vertex, preserving the structure.
	///
	/// The traversal is the single place geometry nesting is walked; both
	/// coordinate transforms and any future per-vertex function reuse it.
	#[must_use]
	pub fn map_points<F>(&self, transform: F) -> Geometry
	where
		F: Fn(Point) -> Point,
	{
		fn map1<F: Fn(Point) -> Point>(line: &Coordinates1, f: &F) -> Coordinates1 {
			line.iter().map(|p| f(*p)).collect()
		}
		fn map2<F: Fn(Point) -> Point>(lines: &Coordinates2, f: &F) -> Coordinates2 {
			lines.iter().map(|line| map1(line, f)).collect()
		}

		match self {
			Geometry::Point(p) => Geometry::Point(transform(*p)),
			Geometry::LineString(line) => Geometry::LineString(map1(line, &transform)),
			Geometry::Polygon(rings) => Geometry::Polygon(map2(rings, &transform)),
			Geometry::MultiPoint(points) => Geometry::MultiPoint(map1(points, &transform)),
			Geometry::MultiLineString(lines) => Geometry::MultiLineString(map2(lines, &transform)),
			Geometry::MultiPolygon(polygons) => {
				Geometry::MultiPolygon(polygons.iter().map(|polygon| map2(polygon, &transform)).collect())
			}
		}
	}

	/// Total number of vertices across all parts.
	#[must_use]
	pub fn vertex_count(&self) -> usize {
		match self {
			Geometry::Point(_) => 1,
			Geometry::LineString(line) | Geometry::MultiPoint(line) => line.len(),
			Geometry::Polygon(lines) | Geometry::MultiLineString(lines) => lines.iter().map(Vec::len).sum(),
			Geometry::MultiPolygon(polygons) => polygons
				.iter()
				.map(|polygon| polygon.iter().map(Vec::len).sum::<usize>())
				.sum(),
		}
	}

	/// Serializes to a GeoJSON geometry object.
	#[must_use]
	pub fn to_json(&self) -> JsonObject {
		fn point_json(p: &Point) -> JsonValue {
			JsonValue::from(vec![p[0], p[1]])
		}
		fn coords1_json(line: &Coordinates1) -> JsonValue {
			JsonValue::Array(line.iter().map(point_json).collect())
		}
		fn coords2_json(lines: &Coordinates2) -> JsonValue {
			JsonValue::Array(lines.iter().map(coords1_json).collect())
		}

		let coordinates = match self {
			Geometry::Point(p) => point_json(p),
			Geometry::LineString(line) | Geometry::MultiPoint(line) => coords1_json(line),
			Geometry::Polygon(lines) | Geometry::MultiLineString(lines) => coords2_json(lines),
			Geometry::MultiPolygon(polygons) => JsonValue::Array(polygons.iter().map(coords2_json).collect()),
		};

		let mut json = JsonObject::new();
		json.set("type", self.type_name());
		json.set("coordinates", coordinates);
		json
	}
}

impl Debug for Geometry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let (type_name, inner): (&str, &dyn Debug) = match self {
			Geometry::Point(g) => ("Point", g),
			Geometry::LineString(g) => ("LineString", g),
			Geometry::Polygon(g) => ("Polygon", g),
			Geometry::MultiPoint(g) => ("MultiPoint", g),
			Geometry::MultiLineString(g) => ("MultiLineString", g),
			Geometry::MultiPolygon(g) => ("MultiPolygon", g),
		};
		f.debug_tuple(type_name).field(inner).finish()
	}
}
