//! Boundary coercion for stored documents.
//!
//! The store is untyped: lists sometimes come back as keyed maps, numbers as
//! strings, and older documents use different shapes. Everything is coerced
//! here once, right after a read, so renderers and the editor only ever see
//! the typed schema.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

use super::content::ImageSet;
use super::SectionId;

/// Coerce any JSON shape into an ordered list.
///
/// Keyed maps yield their values in the store's enumeration order. That order
/// is whatever the map holds and is not guaranteed stable across writers.
pub fn list_from_value<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, serde_json::Error> {
    list_items(value).into_iter().map(serde_json::from_value).collect()
}

fn list_items(value: Value) -> Vec<Value> {
    let items: Vec<Value> = match value {
        Value::Null => return Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        scalar => vec![scalar],
    };
    items.into_iter().filter(|item| !item.is_null()).collect()
}

/// Like `list_from_value`, but an element that does not fit is skipped
/// instead of failing the whole list.
pub fn lenient_list_from_value<T: DeserializeOwned>(value: Value) -> Vec<T> {
    list_items(value)
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Skipping malformed list item: {}", e);
                None
            }
        })
        .collect()
}

pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_list_from_value(value))
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => {
            tracing::warn!("Ignoring non-text value {}", other);
            None
        }
    }
}

/// Required text fields: `null` becomes empty, scalars are stringified.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Optional text fields, coerced like `text`.
pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// Nested record that degrades to absent when it does not fit.
pub(crate) fn record<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => match serde_json::from_value(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                tracing::warn!("Ignoring malformed record: {}", e);
                Ok(None)
            }
        },
    }
}

/// Skill level clamped to 0..=100.
pub(crate) fn level<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(clamp_level(raw))
}

pub fn clamp_level(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

pub(crate) fn image_set<'de, D>(deserializer: D) -> Result<ImageSet, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(url) => Ok(ImageSet::Single(url)),
        other => Ok(ImageSet::from_urls(lenient_list_from_value(other))),
    }
}

/// Rewrite legacy document shapes into the current schema before typed
/// deserialization.
pub fn prepare(id: SectionId, document: &Value) -> Value {
    match (id, document) {
        (_, Value::Null) => Value::Object(Map::new()),

        // Projects used to be stored as a bare list under content/projects
        (SectionId::Projects, Value::Array(projects)) => json!({ "projects": projects }),

        (SectionId::Experience, Value::Object(map)) => {
            let mut map = map.clone();
            if !map.contains_key("experiences") {
                if let Some(legacy) = map.remove("experience") {
                    map.insert("experiences".to_string(), legacy);
                }
            }
            Value::Object(map)
        }

        (SectionId::Skills, Value::Object(map)) => {
            let mut map = map.clone();
            if !map.contains_key("categories") {
                if let Some(flat) = map.remove("skills") {
                    let names: Vec<String> = lenient_list_from_value(flat);
                    let skills: Vec<Value> = names
                        .into_iter()
                        .map(|name| json!({ "name": name, "level": 0 }))
                        .collect();
                    map.insert(
                        "categories".to_string(),
                        json!([{ "name": "", "skills": skills }]),
                    );
                }
            }
            Value::Object(map)
        }

        (_, other) => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_from_map_keeps_enumeration_order() {
        let value = json!({ "b": "second", "a": "first-inserted-later" });
        let items: Vec<String> = list_from_value(value).unwrap();
        assert_eq!(items, vec!["second", "first-inserted-later"]);
    }

    #[test]
    fn test_list_from_null_and_scalar() {
        let empty: Vec<String> = list_from_value(Value::Null).unwrap();
        assert!(empty.is_empty());

        let single: Vec<String> = list_from_value(json!("one bullet")).unwrap();
        assert_eq!(single, vec!["one bullet"]);
    }

    #[test]
    fn test_list_skips_holes() {
        let items: Vec<String> = list_from_value(json!(["a", null, "c"])).unwrap();
        assert_eq!(items, vec!["a", "c"]);
    }

    #[test]
    fn test_lenient_list_skips_bad_items() {
        let items: Vec<u32> = lenient_list_from_value(json!([1, "two", 3, { "n": 4 }]));
        assert_eq!(items, vec![1, 3]);

        let strict: Result<Vec<u32>, _> = list_from_value(json!([1, "two"]));
        assert!(strict.is_err());
    }

    #[test]
    fn test_clamp_level() {
        assert_eq!(clamp_level(-5.0), 0);
        assert_eq!(clamp_level(140.0), 100);
        assert_eq!(clamp_level(72.6), 73);
        assert_eq!(clamp_level(f64::NAN), 0);
    }

    #[test]
    fn test_prepare_bare_project_list() {
        let prepared = prepare(SectionId::Projects, &json!([{ "title": "A" }]));
        assert_eq!(prepared["projects"][0]["title"], "A");
    }

    #[test]
    fn test_prepare_legacy_experience_key() {
        let prepared = prepare(
            SectionId::Experience,
            &json!({ "experience": [{ "title": "Dev" }] }),
        );
        assert_eq!(prepared["experiences"][0]["title"], "Dev");
        assert!(prepared.get("experience").is_none());
    }

    #[test]
    fn test_prepare_flat_skill_names() {
        let prepared = prepare(SectionId::Skills, &json!({ "skills": ["Rust", "Go"] }));
        assert_eq!(prepared["categories"][0]["skills"][1]["name"], "Go");
    }
}
