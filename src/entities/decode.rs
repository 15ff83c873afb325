//! Lenient field access over an entity's attributes and JSON payload.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::store::Entity;

/// Field view over an entity: attributes first, then the decoded payload.
/// Blank strings count as absent everywhere.
pub(crate) struct Fields<'a> {
    entity: &'a Entity,
    payload: Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(entity: &'a Entity) -> Self {
        Self {
            entity,
            payload: decode_payload(entity),
        }
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.attribute(key).or_else(|| self.payload_text(key))
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.attribute(key)
            .and_then(|raw| raw.trim().parse().ok())
            .or_else(|| match self.payload.get(key)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .filter(|n: &f64| n.is_finite())
    }

    /// Array in the payload, or a comma-separated string in either place.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        if let Some(Value::Array(items)) = self.payload.get(key) {
            let items: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            return Some(items);
        }
        self.text(key).map(|raw| split_list(&raw))
    }

    pub fn map(&self, key: &str) -> Option<BTreeMap<String, String>> {
        let Value::Object(object) = self.payload.get(key)? else {
            return None;
        };
        Some(
            object
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), non_blank(v.as_str()?)?)))
                .collect(),
        )
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.entity.attribute(key).and_then(non_blank)
    }

    fn payload_text(&self, key: &str) -> Option<String> {
        match self.payload.get(key)? {
            Value::String(s) => non_blank(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn decode_payload(entity: &Entity) -> Map<String, Value> {
    let Some(payload) = &entity.payload else {
        return Map::new();
    };

    match payload.to_json() {
        Ok(Value::Object(map)) => map,
        // Some writers double-encode: a JSON string holding a JSON document.
        Ok(Value::String(inner)) => match serde_json::from_str(&inner) {
            Ok(Value::Object(map)) => map,
            _ => {
                tracing::warn!(key = %entity.key, "payload is a string, not a JSON object");
                Map::new()
            }
        },
        Ok(_) => {
            tracing::warn!(key = %entity.key, "payload is not a JSON object");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(key = %entity.key, error = %e, "error decoding payload");
            Map::new()
        }
    }
}
