//! Plain JSON sample → JSchema conversion
//!
//! A `.json` source holds sample data rather than type names. Before it goes
//! through inference every scalar is replaced by the name of its primitive
//! kind and every list of maps is collapsed into a single merged sample.

use crate::value::{JsonList, JsonMap, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static DATETIME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}",
        r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static DATE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());

/// Converter with format detection options
#[derive(Debug, Clone)]
pub struct JSchemaConverter {
    /// Classify ISO dates and date-times as `date`
    detect_date: bool,
    /// Classify http(s) strings as `uri`
    detect_uri: bool,
    /// Deeper values become `object`
    max_depth: usize,
}

impl Default for JSchemaConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl JSchemaConverter {
    /// Create a converter with all detection enabled
    pub fn new() -> Self {
        Self {
            detect_date: true,
            detect_uri: true,
            max_depth: 32,
        }
    }

    /// Enable/disable date detection
    #[must_use]
    pub fn with_date_detection(mut self, enabled: bool) -> Self {
        self.detect_date = enabled;
        self
    }

    /// Enable/disable URI detection
    #[must_use]
    pub fn with_uri_detection(mut self, enabled: bool) -> Self {
        self.detect_uri = enabled;
        self
    }

    /// Set maximum nesting depth
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Convert a sample tree into an equivalent JSchema tree
    pub fn convert(&self, value: &Value) -> Value {
        self.convert_at(value, 0)
    }

    fn convert_at(&self, value: &Value, depth: usize) -> Value {
        if depth >= self.max_depth {
            return Value::from("object");
        }
        match value {
            Value::Null => Value::from("object"),
            Value::Bool(_) => Value::from("boolean"),
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Value::from("int")
                } else {
                    Value::from("number")
                }
            }
            Value::String(s) => Value::from(self.string_type(s)),
            Value::Map(map) => Value::Map(self.convert_map(map, depth)),
            Value::List(list) => Value::List(self.convert_list(list, depth)),
        }
    }

    fn string_type(&self, s: &str) -> &'static str {
        if self.detect_date && (is_datetime(s) || is_date(s)) {
            "date"
        } else if self.detect_uri && is_uri(s) {
            "uri"
        } else {
            "string"
        }
    }

    fn convert_map(&self, map: &JsonMap, depth: usize) -> JsonMap {
        let out = JsonMap::new();
        for (key, val) in map.entries() {
            out.insert_fresh(key, self.convert_at(&val, depth + 1));
        }
        out
    }

    fn convert_list(&self, list: &JsonList, depth: usize) -> JsonList {
        let out = JsonList::new();
        let items = list.items();
        let Some(first) = items.first() else {
            return out;
        };

        if items.iter().any(|item| item.as_map().is_some()) {
            let merged = JsonMap::new();
            for sample in items.iter().filter_map(Value::as_map) {
                let converted = self.convert_map(sample, depth + 1);
                merge_into(&merged, &converted);
            }
            out.push_fresh(Value::Map(merged));
        } else {
            out.push_fresh(self.convert_at(first, depth + 1));
        }
        out
    }
}

/// Add keys of `sample` missing from `target`; nested maps merge recursively
fn merge_into(target: &JsonMap, sample: &JsonMap) {
    for (key, val) in sample.entries() {
        match (target.get(&key), val) {
            (None, val) => {
                target.insert_fresh(key, val);
            }
            (Some(Value::Map(existing)), Value::Map(incoming)) => merge_into(&existing, &incoming),
            (Some(Value::List(existing)), Value::List(incoming)) => {
                if let (Some(Value::Map(a)), Some(Value::Map(b))) = (existing.get(0), incoming.get(0))
                {
                    merge_into(&a, &b);
                }
            }
            _ => {}
        }
    }
}

/// Convert a sample tree with default settings
pub fn json_to_jschema(value: &Value) -> Value {
    JSchemaConverter::new().convert(value)
}

// Format detection helpers

fn is_datetime(s: &str) -> bool {
    DATETIME_PATTERNS.iter().any(|re| re.is_match(s))
}

fn is_date(s: &str) -> bool {
    DATE_PATTERN.as_ref().is_some_and(|re| re.is_match(s))
}

fn is_uri(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn convert(sample: serde_json::Value) -> serde_json::Value {
        json_to_jschema(&Value::from_serde(&sample)).to_serde()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(
            convert(json!({
                "name": "Ann",
                "age": 42,
                "score": 4.5,
                "active": true,
                "nickname": null,
                "born": "1990-01-02",
                "seen": "2024-01-15T10:30:00Z",
                "home": "https://example.com"
            })),
            json!({
                "name": "string",
                "age": "int",
                "score": "number",
                "active": "boolean",
                "nickname": "object",
                "born": "date",
                "seen": "date",
                "home": "uri"
            })
        );
    }

    #[test]
    fn test_list_of_maps_is_merged() {
        assert_eq!(
            convert(json!({"orders": [{"id": 1}, {"id": 2, "note": "x"}, {"note": 3}]})),
            json!({"orders": [{"id": "int", "note": "string"}]})
        );
    }

    #[test]
    fn test_nested_maps_merge_recursively() {
        assert_eq!(
            convert(json!([{"a": {"x": 1}}, {"a": {"y": true}}])),
            json!([{"a": {"x": "int", "y": "boolean"}}])
        );
    }

    #[test]
    fn test_scalar_list_keeps_first() {
        assert_eq!(convert(json!({"tags": ["a", "b"]})), json!({"tags": ["string"]}));
        assert_eq!(convert(json!({"empty": []})), json!({"empty": []}));
    }

    #[test]
    fn test_detection_can_be_disabled() {
        let converter = JSchemaConverter::new()
            .with_date_detection(false)
            .with_uri_detection(false);
        let value = Value::from_serde(&json!(["2024-01-15", "http://x"]));
        assert_eq!(converter.convert(&value).to_serde(), json!(["string"]));
    }

    #[test]
    fn test_max_depth() {
        let converter = JSchemaConverter::new().with_max_depth(1);
        let value = Value::from_serde(&json!({"a": {"b": 1}}));
        assert_eq!(converter.convert(&value).to_serde(), json!({"a": "object"}));
    }
}
