use super::{JsonArray, JsonObject, stringify};

/// Any JSON value: object, array, string, number, boolean or null.
///
/// Numbers are stored as `f64`; integral values are printed without a
/// fractional part, which collapses the MVT scalar variants (int, uint,
/// float, double) into plain JSON numbers.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonValue {
	Array(JsonArray),
	Boolean(bool),
	Null,
	Number(f64),
	Object(JsonObject),
	String(String),
}

impl JsonValue {
	/// Serializes to a compact JSON string without whitespace.
	#[must_use]
	pub fn stringify(&self) -> String {
		stringify::stringify(self)
	}

	/// Serializes with two-space indentation, one member per line.
	#[must_use]
	pub fn stringify_pretty(&self) -> String {
		stringify::stringify_pretty(self, 0)
	}
}

impl From<&str> for JsonValue {
	fn from(value: &str) -> Self {
		JsonValue::String(value.to_string())
	}
}

impl From<String> for JsonValue {
	fn from(value: String) -> Self {
		JsonValue::String(value)
	}
}

impl From<f64> for JsonValue {
	fn from(value: f64) -> Self {
		JsonValue::Number(value)
	}
}

impl From<u32> for JsonValue {
	fn from(value: u32) -> Self {
		JsonValue::Number(value as f64)
	}
}

impl From<u64> for JsonValue {
	fn from(value: u64) -> Self {
		JsonValue::Number(value as f64)
	}
}

impl From<i64> for JsonValue {
	fn from(value: i64) -> Self {
		JsonValue::Number(value as f64)
	}
}

impl From<usize> for JsonValue {
	fn from(value: usize) -> Self {
		JsonValue::Number(value as f64)
	}
}

impl From<bool> for JsonValue {
	fn from(value: bool) -> Self {
		JsonValue::Boolean(value)
	}
}

impl From<JsonObject> for JsonValue {
	fn from(value: JsonObject) -> Self {
		JsonValue::Object(value)
	}
}

impl From<JsonArray> for JsonValue {
	fn from(value: JsonArray) -> Self {
		JsonValue::Array(value)
	}
}

impl<T: Into<JsonValue>> From<Vec<T>> for JsonValue {
	fn from(value: Vec<T>) -> Self {
		JsonValue::Array(JsonArray::from(value))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn from_primitives() {
		assert_eq!(JsonValue::from("x"), JsonValue::String("x".to_string()));
		assert_eq!(JsonValue::from(true), JsonValue::Boolean(true));
		assert_eq!(JsonValue::from(1u64), JsonValue::Number(1.0));
		assert_eq!(JsonValue::from(vec![1u64, 2]).stringify(), "[1,2]");
	}
}
