//! A GeoJSON FeatureCollection.

use super::GeoFeature;
use tile2json_core::json::{JsonArray, JsonObject};

/// An ordered collection of features, serialized as a GeoJSON
/// `FeatureCollection`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoCollection {
	pub features: Vec<GeoFeature>,
}

impl GeoCollection {
	#[must_use]
	pub fn new() -> GeoCollection {
		GeoCollection::default()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.features.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.features.is_empty()
	}

	/// Serializes to a GeoJSON `FeatureCollection` object.
	#[must_use]
	pub fn to_json(&self) -> JsonObject {
		let mut json = JsonObject::new();
		json.set("type", "FeatureCollection");
		json.set(
			"features",
			self.features.iter().map(|f| f.to_json().into()).collect::<JsonArray>(),
		);
		json
	}
}

impl From<Vec<GeoFeature>> for GeoCollection {
	fn from(features: Vec<GeoFeature>) -> Self {
		GeoCollection { features }
	}
}
