use super::GeoValue;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tile2json_core::json::JsonObject;

/// Feature properties: an ordered map from key to [`GeoValue`].
///
/// Sorted iteration keeps GeoJSON output deterministic across runs.
#[derive(Clone, Default, PartialEq)]
pub struct GeoProperties(BTreeMap<String, GeoValue>);

impl GeoProperties {
	pub fn new() -> GeoProperties {
		GeoProperties::default()
	}

	pub fn insert<V: Into<GeoValue>>(&mut self, key: String, value: V) {
		self.0.insert(key, value.into());
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&GeoValue> {
		self.0.get(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<GeoValue> {
		self.0.remove(key)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &GeoValue)> {
		self.0.iter()
	}

	#[must_use]
	pub fn to_json(&self) -> JsonObject {
		self.0.iter().map(|(k, v)| (k, v.to_json())).collect()
	}
}

impl Debug for GeoProperties {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_map().entries(self.0.iter()).finish()
	}
}

impl<K: ToString, V: Into<GeoValue>> FromIterator<(K, V)> for GeoProperties {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		GeoProperties(iter.into_iter().map(|(k, v)| (k.to_string(), v.into())).collect())
	}
}
