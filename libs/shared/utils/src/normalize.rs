//! Response-shape normalization applied once at the data-access boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::de::value_to_id;

/// `{id, name}` reference item (categories, specialties, areas).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedItem {
    pub id: String,
    pub name: String,
}

/// Looks up a dotted path such as `data.payments`.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
}

/// Returns the first array found at `keys` (in order), or the body itself
/// when it is already an array.
pub fn extract_list(body: &Value, keys: &[&str]) -> Option<Vec<Value>> {
    if let Value::Array(items) = body {
        return Some(items.clone());
    }
    keys.iter()
        .filter_map(|key| lookup(body, key))
        .find_map(|candidate| candidate.as_array().cloned())
}

/// Returns the first object found at `keys`, or the body itself when it
/// already looks like the entity (carries an `id`).
pub fn extract_object(body: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|key| lookup(body, key))
        .find(|candidate| candidate.is_object())
        .cloned()
        .or_else(|| body.get("id").map(|_| body.clone()))
}

/// Normalizes the three list shapes the backend uses for reference data:
/// `{categories: [string]}`, `{data: [{id, name}]}` and a bare array.
pub fn normalize_list(raw: &Value) -> Vec<NamedItem> {
    let items = match extract_list(raw, &["categories", "data", "data.categories", "items"]) {
        Some(items) => items,
        None => {
            debug!("Unrecognised list payload shape: {}", raw);
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) if !name.trim().is_empty() => Some(NamedItem {
                id: name.trim().to_string(),
                name: name.trim().to_string(),
            }),
            Value::Object(_) => {
                let name = FieldResolver::new(&["name", "title", "name_ar", "name_en"]).resolve(item)?;
                let id = item.get("id").and_then(value_to_id).unwrap_or_else(|| name.clone());
                Some(NamedItem { id, name })
            }
            other => {
                debug!("Skipping list entry with unexpected shape: {}", other);
                None
            }
        })
        .collect()
}

/// Ordered list of candidate field paths; the first non-empty string wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    paths: &'a [&'a str],
}

impl<'a> FieldResolver<'a> {
    pub const fn new(paths: &'a [&'a str]) -> Self {
        Self { paths }
    }

    pub fn resolve(&self, value: &Value) -> Option<String> {
        self.paths.iter().find_map(|path| {
            match lookup(value, path)? {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        })
    }
}
