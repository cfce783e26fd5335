//! JSON output formatting for stored entries.

use serde_json::{Map, Value};

/// Parse a stored payload, keeping unparsable text as a JSON string.
pub fn parse_stored(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Group `(namespace, key, raw)` rows into `{namespace: {key: value}}`.
pub fn entries_json(rows: &[(String, String, String)]) -> Value {
    let mut root = Map::new();
    for (namespace, key, raw) in rows {
        let slot = root
            .entry(namespace.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(entries) = slot {
            entries.insert(key.clone(), parse_stored(raw));
        }
    }
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_grouped_by_namespace() {
        let rows = vec![
            ("game".to_string(), "score".to_string(), "42".to_string()),
            ("game".to_string(), "name".to_string(), "\"Ada\"".to_string()),
            ("settings".to_string(), "app".to_string(), "{broken".to_string()),
        ];
        assert_eq!(
            entries_json(&rows),
            json!({
                "game": {"score": 42, "name": "Ada"},
                "settings": {"app": "{broken"},
            })
        );
    }
}
