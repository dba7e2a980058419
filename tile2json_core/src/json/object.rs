use super::JsonValue;
use std::collections::BTreeMap;

/// A JSON object with members kept sorted by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonObject(BTreeMap<String, JsonValue>);

impl JsonObject {
	pub fn new() -> JsonObject {
		JsonObject::default()
	}

	pub fn set<V: Into<JsonValue>>(&mut self, key: &str, value: V) {
		self.0.insert(key.to_string(), value.into());
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.0.get(key)
	}

	pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
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

	pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
		self.0.iter()
	}
}

impl<K: ToString, V: Into<JsonValue>> FromIterator<(K, V)> for JsonObject {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		JsonObject(iter.into_iter().map(|(k, v)| (k.to_string(), v.into())).collect())
	}
}
