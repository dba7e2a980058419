use super::{JsonArray, JsonObject, JsonValue};

pub fn stringify(json: &JsonValue) -> String {
	match json {
		JsonValue::String(s) => format!("\"{}\"", escape_json_string(s)),
		JsonValue::Number(n) => stringify_number(*n),
		JsonValue::Boolean(b) => b.to_string(),
		JsonValue::Null => String::from("null"),
		JsonValue::Array(arr) => {
			let items: Vec<String> = arr.iter().map(stringify).collect();
			format!("[{}]", items.join(","))
		}
		JsonValue::Object(obj) => {
			let members: Vec<String> = obj
				.iter()
				.map(|(k, v)| format!("\"{}\":{}", escape_json_string(k), stringify(v)))
				.collect();
			format!("{{{}}}", members.join(","))
		}
	}
}

/// Serializes with two-space indentation. Every array element and object
/// member gets its own line; empty containers stay inline.
pub fn stringify_pretty(json: &JsonValue, depth: usize) -> String {
	match json {
		JsonValue::Array(arr) => stringify_pretty_array(arr, depth),
		JsonValue::Object(obj) => stringify_pretty_object(obj, depth),
		_ => stringify(json),
	}
}

fn stringify_pretty_array(arr: &JsonArray, depth: usize) -> String {
	if arr.is_empty() {
		return String::from("[]");
	}
	let indent = "  ".repeat(depth + 1);
	let items: Vec<String> = arr
		.iter()
		.map(|item| format!("{indent}{}", stringify_pretty(item, depth + 1)))
		.collect();
	format!("[\n{}\n{}]", items.join(",\n"), "  ".repeat(depth))
}

fn stringify_pretty_object(obj: &JsonObject, depth: usize) -> String {
	if obj.is_empty() {
		return String::from("{}");
	}
	let indent = "  ".repeat(depth + 1);
	let members: Vec<String> = obj
		.iter()
		.map(|(k, v)| {
			format!(
				"{indent}\"{}\": {}",
				escape_json_string(k),
				stringify_pretty(v, depth + 1)
			)
		})
		.collect();
	format!("{{\n{}\n{}}}", members.join(",\n"), "  ".repeat(depth))
}

fn stringify_number(n: f64) -> String {
	if n.is_finite() { n.to_string() } else { String::from("null") }
}

pub fn escape_json_string(input: &str) -> String {
	input
		.chars()
		.map(|c| match c {
			'"' => "\\\"".to_string(),
			'\\' => "\\\\".to_string(),
			'\n' => "\\n".to_string(),
			'\r' => "\\r".to_string(),
			'\t' => "\\t".to_string(),
			'\u{08}' => "\\b".to_string(),
			'\u{0c}' => "\\f".to_string(),
			c if c.is_control() => format!("\\u{:04x}", c as u32),
			c => c.to_string(),
		})
		.collect()
}
