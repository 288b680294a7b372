//! Section Registry
//!
//! The `sections` document maps section ids to `{ name, enabled }`. The public
//! page only looks at `enabled`; the admin dashboard lists every entry.
//! Iteration follows the store's key enumeration order.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::schema::SectionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

impl Section {
    /// Known section for this entry, if any.
    pub fn section_id(&self) -> Option<SectionId> {
        self.id.parse().ok()
    }

    /// Stored form at `sections/{id}`.
    pub fn to_document(&self) -> Value {
        json!({ "name": self.name, "enabled": self.enabled })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionRegistry {
    entries: Vec<Section>,
}

impl SectionRegistry {
    /// Parse the registry document. Missing names fall back to the id,
    /// anything but `true` counts as disabled.
    pub fn from_document(document: &Value) -> Self {
        let Some(map) = document.as_object() else {
            if !document.is_null() {
                tracing::warn!("Registry document is not a map, treating as empty");
            }
            return Self::default();
        };

        let entries = map
            .iter()
            .map(|(id, entry)| Section {
                id: id.clone(),
                name: entry
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.clone()),
                enabled: entry.get("enabled").and_then(Value::as_bool).unwrap_or(false),
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[Section] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Section> {
        self.entries.iter().find(|s| s.id == id)
    }

    pub fn is_enabled(&self, id: SectionId) -> bool {
        self.get(id.as_str()).map(|s| s.enabled).unwrap_or(false)
    }

    /// Known, enabled sections in page order.
    pub fn enabled_sections(&self) -> Vec<SectionId> {
        SectionId::ALL
            .into_iter()
            .filter(|id| self.is_enabled(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_document_keeps_store_order() {
        let registry = SectionRegistry::from_document(&json!({
            "contact": { "name": "Contact", "enabled": true },
            "hero": { "name": "Hero", "enabled": false },
            "blog": { "name": "Blog", "enabled": true }
        }));

        let ids: Vec<&str> = registry.entries().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["contact", "hero", "blog"]);
    }

    #[test]
    fn test_enabled_sections_skip_unknown_and_disabled() {
        let registry = SectionRegistry::from_document(&json!({
            "contact": { "name": "Contact", "enabled": true },
            "hero": { "name": "Hero", "enabled": false },
            "about": { "name": "About", "enabled": true },
            "blog": { "name": "Blog", "enabled": true }
        }));

        assert_eq!(
            registry.enabled_sections(),
            vec![SectionId::About, SectionId::Contact]
        );
    }

    #[test]
    fn test_lenient_entries() {
        let registry = SectionRegistry::from_document(&json!({
            "skills": { "enabled": "yes" }
        }));
        let skills = registry.get("skills").unwrap();
        assert_eq!(skills.name, "skills");
        assert!(!skills.enabled);
    }

    #[test]
    fn test_non_map_document_is_empty() {
        assert!(SectionRegistry::from_document(&Value::Null).is_empty());
        assert!(SectionRegistry::from_document(&json!([1, 2])).is_empty());
    }
}
