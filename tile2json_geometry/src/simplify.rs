//! Douglas–Peucker geometry simplification.
//!
//! Works on geometries that are already in output units (Web Mercator
//! meters), so the tolerance is a distance in those units. Points are never
//! touched; line strings keep their endpoints; polygon rings keep their
//! closing point and at least four vertices.

use crate::geo::{Coordinates1, Geometry, Point};

/// Simplifies a geometry with the given tolerance.
#[must_use]
pub fn simplify_geometry(geometry: &Geometry, tolerance: f64) -> Geometry {
	match geometry {
		Geometry::Point(_) | Geometry::MultiPoint(_) => geometry.clone(),
		Geometry::LineString(line) => Geometry::LineString(simplify_line(line, tolerance)),
		Geometry::MultiLineString(lines) => {
			Geometry::MultiLineString(lines.iter().map(|line| simplify_line(line, tolerance)).collect())
		}
		Geometry::Polygon(rings) => Geometry::Polygon(simplify_rings(rings, tolerance)),
		Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(
			polygons
				.iter()
				.map(|polygon| simplify_rings(polygon, tolerance))
				.collect(),
		),
	}
}

fn simplify_rings(rings: &[Coordinates1], tolerance: f64) -> Vec<Coordinates1> {
	rings
		.iter()
		.map(|ring| {
			let simplified = simplify_line(ring, tolerance);
			// A valid ring needs A,B,C,A; fall back to the original.
			if simplified.len() >= 4 { simplified } else { ring.clone() }
		})
		.collect()
}

/// Douglas–Peucker: recursively keeps the point farthest from the chord
/// while that distance exceeds the tolerance.
#[must_use]
pub fn simplify_line(line: &Coordinates1, tolerance: f64) -> Coordinates1 {
	if line.len() <= 2 {
		return line.clone();
	}

	let mut keep = vec![false; line.len()];
	keep[0] = true;
	keep[line.len() - 1] = true;
	simplify_segment(line, 0, line.len() - 1, tolerance, &mut keep);

	line
		.iter()
		.zip(keep)
		.filter_map(|(point, kept)| if kept { Some(*point) } else { None })
		.collect()
}

fn simplify_segment(line: &Coordinates1, first: usize, last: usize, tolerance: f64, keep: &mut [bool]) {
	if last <= first + 1 {
		return;
	}

	let mut max_distance = 0.0;
	let mut max_index = first;
	for index in first + 1..last {
		let distance = perpendicular_distance(line[index], line[first], line[last]);
		if distance > max_distance {
			max_distance = distance;
			max_index = index;
		}
	}

	if max_distance > tolerance {
		keep[max_index] = true;
		simplify_segment(line, first, max_index, tolerance, keep);
		simplify_segment(line, max_index, last, tolerance, keep);
	}
}

fn perpendicular_distance(point: Point, start: Point, end: Point) -> f64 {
	let dx = end[0] - start[0];
	let dy = end[1] - start[1];
	let length_sq = dx * dx + dy * dy;
	if length_sq == 0.0 {
		return ((point[0] - start[0]).powi(2) + (point[1] - start[1]).powi(2)).sqrt();
	}
	((dy * point[0] - dx * point[1] + end[0] * start[1] - end[1] * start[0]).abs()) / length_sq.sqrt()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn collinear_points_are_dropped() {
		let line = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
		assert_eq!(simplify_line(&line, 0.5), vec![[0.0, 0.0], [3.0, 0.0]]);
	}

	#[test]
	fn significant_detours_survive() {
		let line = vec![[0.0, 0.0], [1.0, 5.0], [2.0, 0.0]];
		assert_eq!(simplify_line(&line, 1.0), line);
	}

	#[test]
	fn small_detours_are_removed() {
		let line = vec![[0.0, 0.0], [1.0, 0.2], [2.0, 0.0]];
		assert_eq!(simplify_line(&line, 1.0), vec![[0.0, 0.0], [2.0, 0.0]]);
	}

	#[test]
	fn endpoints_are_always_kept() {
		let line = vec![[0.0, 0.0], [0.5, 0.01], [1.0, 0.0]];
		let simplified = simplify_line(&line, 10.0);
		assert_eq!(simplified.first(), Some(&[0.0, 0.0]));
		assert_eq!(simplified.last(), Some(&[1.0, 0.0]));
	}

	#[test]
	fn points_pass_through() {
		let geometry = Geometry::Point([1.0, 2.0]);
		assert_eq!(simplify_geometry(&geometry, 1.0), geometry);
	}

	#[test]
	fn rings_stay_valid() {
		// Aggressive tolerance would collapse the ring below 4 points;
		// the original ring must be kept instead.
		let ring = vec![[0.0, 0.0], [1.0, 0.1], [2.0, 0.0], [0.0, 0.0]];
		let geometry = Geometry::Polygon(vec![ring.clone()]);
		match simplify_geometry(&geometry, 100.0) {
			Geometry::Polygon(rings) => assert_eq!(rings[0], ring),
			other => panic!("unexpected geometry {other:?}"),
		}
	}

	#[test]
	fn polygon_rings_are_simplified_independently() {
		let outer = vec![
			[0.0, 0.0],
			[5.0, 0.05],
			[10.0, 0.0],
			[10.0, 10.0],
			[0.0, 10.0],
			[0.0, 0.0],
		];
		let geometry = Geometry::Polygon(vec![outer]);
		match simplify_geometry(&geometry, 1.0) {
			Geometry::Polygon(rings) => {
				assert_eq!(rings[0].len(), 5);
				assert!(!rings[0].contains(&[5.0, 0.05]));
			}
			other => panic!("unexpected geometry {other:?}"),
		}
	}
}
