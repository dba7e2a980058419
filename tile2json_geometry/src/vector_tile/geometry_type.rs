/// The `geom_type` field of an MVT feature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeomType {
	#[default]
	Unknown,
	Point,
	LineString,
	Polygon,
}

impl From<u64> for GeomType {
	fn from(value: u64) -> Self {
		match value {
			1 => GeomType::Point,
			2 => GeomType::LineString,
			3 => GeomType::Polygon,
			_ => GeomType::Unknown,
		}
	}
}
