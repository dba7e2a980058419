use super::JsonValue;

/// A JSON array preserving insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonArray(Vec<JsonValue>);

impl JsonArray {
	pub fn new() -> JsonArray {
		JsonArray::default()
	}

	pub fn push<V: Into<JsonValue>>(&mut self, value: V) {
		self.0.push(value.into());
	}

	pub fn extend<I: IntoIterator<Item = JsonValue>>(&mut self, values: I) {
		self.0.extend(values);
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &JsonValue> {
		self.0.iter()
	}
}

impl<T: Into<JsonValue>> From<Vec<T>> for JsonArray {
	fn from(values: Vec<T>) -> Self {
		JsonArray(values.into_iter().map(Into::into).collect())
	}
}

impl FromIterator<JsonValue> for JsonArray {
	fn from_iter<T: IntoIterator<Item = JsonValue>>(iter: T) -> Self {
		JsonArray(iter.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn preserves_order() {
		let mut arr = JsonArray::new();
		arr.push(3u64);
		arr.push(1u64);
		arr.push(2u64);
		let values: Vec<String> = arr.iter().map(|v| v.stringify()).collect();
		assert_eq!(values, vec!["3", "1", "2"]);
	}
}
