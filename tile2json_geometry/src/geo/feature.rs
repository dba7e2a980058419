//! A GeoJSON feature: optional id, geometry, typed properties.

use super::{GeoProperties, GeoValue, Geometry};
use tile2json_core::json::JsonObject;

/// One geographic feature, serialized as a GeoJSON `Feature` object.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
	/// MVT feature ids are unsigned 64-bit integers when present.
	pub id: Option<u64>,
	pub geometry: Geometry,
	pub properties: GeoProperties,
}

impl GeoFeature {
	#[must_use]
	pub fn new(geometry: Geometry) -> GeoFeature {
		GeoFeature {
			id: None,
			geometry,
			properties: GeoProperties::new(),
		}
	}

	pub fn set_property<V: Into<GeoValue>>(&mut self, key: &str, value: V) {
		self.properties.insert(key.to_string(), value);
	}

	/// Serializes to a GeoJSON `Feature` object.
	#[must_use]
	pub fn to_json(&self) -> JsonObject {
		let mut json = JsonObject::new();
		json.set("type", "Feature");
		if let Some(id) = self.id {
			json.set("id", id);
		}
		json.set("geometry", self.geometry.to_json());
		json.set("properties", self.properties.to_json());
		json
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tile2json_core::json::JsonValue;

	#[test]
	fn to_json_includes_all_members() {
		let mut feature = GeoFeature::new(Geometry::Point([1.0, 2.0]));
		feature.id = Some(7);
		feature.set_property("name", "X");
		assert_eq!(
			JsonValue::from(feature.to_json()).stringify(),
			"{\"geometry\":{\"coordinates\":[1,2],\"type\":\"Point\"},\"id\":7,\"properties\":{\"name\":\"X\"},\"type\":\"Feature\"}"
		);
	}

	#[test]
	fn id_is_omitted_when_absent() {
		let feature = GeoFeature::new(Geometry::Point([0.0, 0.0]));
		assert!(feature.to_json().get("id").is_none());
	}
}
