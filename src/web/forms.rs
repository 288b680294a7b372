//! Dashboard form posts to draft edits.
//!
//! Every editor form carries an `op` field naming the edit plus the fields
//! that edit takes. Index fields (`category`, `project`, ...) are numbers.
//! Fields named `value.<key>` build the `value` record of an `update_*` edit;
//! they are laid over the item currently in the draft, so a form only needs
//! the inputs it shows. An empty `url`, `icon`, or image clears it.

use serde_json::{Map, Value};

use crate::editor::EditOp;
use crate::schema::SectionContent;

const INDEX_FIELDS: &[&str] = &[
    "category",
    "skill",
    "project",
    "technology",
    "image",
    "experience",
    "bullet",
    "link",
];

#[derive(Debug, thiserror::Error)]
pub enum FormEditError {
    #[error("form has no edit")]
    MissingOp,

    #[error("{field} must be a list position, got '{value}'")]
    BadIndex { field: String, value: String },

    #[error("invalid {op} edit: {source}")]
    Invalid {
        op: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Translate a form post into an edit of `draft`'s section.
pub fn edit_from_form(
    draft: &SectionContent,
    fields: Vec<(String, String)>,
) -> Result<EditOp, FormEditError> {
    let mut edit = Map::new();
    let mut record = Map::new();

    for (name, raw) in fields {
        if let Some(key) = name.strip_prefix("value.") {
            record.insert(key.to_string(), Value::String(raw));
        } else if INDEX_FIELDS.contains(&name.as_str()) {
            let index = raw.trim().parse::<u64>().map_err(|_| FormEditError::BadIndex {
                field: name.clone(),
                value: raw.clone(),
            })?;
            edit.insert(name, Value::from(index));
        } else if (name == "url" || name == "icon") && raw.trim().is_empty() {
            edit.insert(name, Value::Null);
        } else {
            edit.insert(name, Value::String(raw));
        }
    }

    let op = match edit.get("op") {
        Some(Value::String(op)) if !op.is_empty() => op.clone(),
        _ => return Err(FormEditError::MissingOp),
    };

    if op == "set_image" && edit.get("value").and_then(Value::as_str) == Some("") {
        edit.insert("value".to_string(), Value::Null);
    }

    if !record.is_empty() && !edit.contains_key("value") {
        let mut value = match current_record(&draft.to_document(), &op, &edit) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        value.extend(record);
        edit.insert("value".to_string(), Value::Object(value));
    }

    let mut wire = Map::new();
    wire.insert("section".to_string(), Value::String(draft.id().as_str().to_string()));
    wire.insert("edit".to_string(), Value::Object(edit));

    serde_json::from_value(Value::Object(wire)).map_err(|source| FormEditError::Invalid { op, source })
}

/// The stored form of the item an `update_*` edit replaces.
fn current_record(document: &Value, op: &str, edit: &Map<String, Value>) -> Value {
    let index = |field: &str| {
        edit.get(field)
            .and_then(Value::as_u64)
            .and_then(|i| usize::try_from(i).ok())
            .unwrap_or(usize::MAX)
    };

    match op {
        "update_skill" => document["categories"][index("category")]["skills"][index("skill")].clone(),
        "update_project" => document["projects"][index("project")].clone(),
        "update_experience" => document["experiences"][index("experience")].clone(),
        "update_link" => document["links"][index("link")].clone(),
        "set_details" => document["contact"].clone(),
        _ => Value::Null,
    }
}

/// Which edit field receives an uploaded file's URL.
pub fn upload_target(op: &str) -> &'static str {
    match op {
        "set_image" => "value",
        "set_skill_icon" | "set_link_icon" => "icon",
        _ => "url",
    }
}
