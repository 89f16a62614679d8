use std::collections::BTreeMap;
use serde_json::{Map, Value};

// Scalars the dashboard can print directly.
fn displayable(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Follow a key path into nested mappings.
pub fn value_at_path<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = map.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Decode a display string, trying each key in order before falling back to
/// the default. Numbers and booleans are stringified; anything else is
/// skipped as if the key were absent.
pub fn string_or(map: &Map<String, Value>, keys: &[&str], default: &str) -> String {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(displayable)
        .unwrap_or_else(|| default.to_string())
}

/// Decode a sequence of strings from any of the loose wire shapes:
/// a sequence (scalar items stringified), a single string (wrapped into a
/// one-element sequence), or a mapping (collapsed to its values, or to its
/// keys when the values are not displayable). Returns None when nothing
/// displayable survives, so the caller can supply its default.
pub fn string_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::Array(entries) => entries.iter().filter_map(displayable).collect(),
        Value::String(s) => vec![s.clone()],
        Value::Object(map) => {
            let values: Vec<String> = map.values().filter_map(displayable).collect();
            if values.is_empty() {
                map.keys().cloned().collect()
            } else {
                values
            }
        }
        _ => Vec::new(),
    };

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Decode a sequence field, trying each key in order; the default filler is
/// used when no key yields a non-empty sequence.
pub fn string_list_or(map: &Map<String, Value>, keys: &[&str], default: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find_map(string_list)
        .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
}

/// Decode a string-to-string mapping, keeping displayable values and
/// dropping nested structures.
pub fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    if let Some(Value::Object(map)) = value {
        for (key, entry) in map {
            if let Some(text) = displayable(entry) {
                result.insert(key.clone(), text);
            }
        }
    }
    result
}
