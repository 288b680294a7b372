//! Content Schema
//!
//! Section identifiers, the typed document for each section, and the
//! `SectionContent` union the renderers and the admin editor share.
//!
//! ## Sections
//! 1. Hero - title, subtitle, rich description, portrait
//! 2. About - title, rich description, image
//! 3. Skills - categories of skills with levels and icons
//! 4. Projects - projects with image carousels, videos, technologies
//! 5. Experience - positions with bullet points and technologies
//! 6. Contact - details and social links

pub mod content;
pub mod normalize;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use content::{
    AboutContent, ContactContent, ContactDetails, ContactLink, Experience, ExperienceContent,
    HeroContent, ImageSet, IntroContent, LinkKind, Project, ProjectsContent, Skill, SkillCategory,
    SkillsContent,
};

/// Store path of the section registry.
pub const REGISTRY_PATH: &str = "sections";

/// Store path prefix of the per-section documents.
pub const CONTENT_ROOT: &str = "content";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Hero,
    About,
    Skills,
    Projects,
    Experience,
    Contact,
}

impl SectionId {
    /// Page order.
    pub const ALL: [SectionId; 6] = [
        SectionId::Hero,
        SectionId::About,
        SectionId::Skills,
        SectionId::Projects,
        SectionId::Experience,
        SectionId::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Hero => "hero",
            SectionId::About => "about",
            SectionId::Skills => "skills",
            SectionId::Projects => "projects",
            SectionId::Experience => "experience",
            SectionId::Contact => "contact",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SectionId::Hero => "Hero",
            SectionId::About => "About",
            SectionId::Skills => "Skills",
            SectionId::Projects => "Projects",
            SectionId::Experience => "Experience",
            SectionId::Contact => "Contact",
        }
    }

    pub fn content_path(&self) -> String {
        format!("{}/{}", CONTENT_ROOT, self.as_str())
    }

    pub fn registry_path(&self) -> String {
        format!("{}/{}", REGISTRY_PATH, self.as_str())
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section '{0}'")]
pub struct UnknownSection(pub String);

impl FromStr for SectionId {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

// ============================================================================
// Section Content Union
// ============================================================================

/// One section's document, typed by section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", content = "content", rename_all = "lowercase")]
pub enum SectionContent {
    Hero(HeroContent),
    About(AboutContent),
    Skills(SkillsContent),
    Projects(ProjectsContent),
    Experience(ExperienceContent),
    Contact(ContactContent),
}

impl SectionContent {
    /// Empty document of the section's shape.
    pub fn empty(id: SectionId) -> Self {
        match id {
            SectionId::Hero => SectionContent::Hero(HeroContent::default()),
            SectionId::About => SectionContent::About(AboutContent::default()),
            SectionId::Skills => SectionContent::Skills(SkillsContent::default()),
            SectionId::Projects => SectionContent::Projects(ProjectsContent::default()),
            SectionId::Experience => SectionContent::Experience(ExperienceContent::default()),
            SectionId::Contact => SectionContent::Contact(ContactContent::default()),
        }
    }

    pub fn id(&self) -> SectionId {
        match self {
            SectionContent::Hero(_) => SectionId::Hero,
            SectionContent::About(_) => SectionId::About,
            SectionContent::Skills(_) => SectionId::Skills,
            SectionContent::Projects(_) => SectionId::Projects,
            SectionContent::Experience(_) => SectionId::Experience,
            SectionContent::Contact(_) => SectionId::Contact,
        }
    }

    /// Coerce a stored document. Bad fields and list elements are dropped one
    /// by one; only a document that is not a record at all fails.
    pub fn try_from_document(id: SectionId, document: &Value) -> Result<Self, serde_json::Error> {
        let prepared = normalize::prepare(id, document);
        Ok(match id {
            SectionId::Hero => SectionContent::Hero(serde_json::from_value(prepared)?),
            SectionId::About => SectionContent::About(serde_json::from_value(prepared)?),
            SectionId::Skills => SectionContent::Skills(serde_json::from_value(prepared)?),
            SectionId::Projects => SectionContent::Projects(serde_json::from_value(prepared)?),
            SectionId::Experience => SectionContent::Experience(serde_json::from_value(prepared)?),
            SectionId::Contact => SectionContent::Contact(serde_json::from_value(prepared)?),
        })
    }

    /// Like `try_from_document`, but a document that is not a record degrades
    /// to the empty content of the section.
    pub fn from_document(id: SectionId, document: &Value) -> Self {
        match Self::try_from_document(id, document) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Malformed {} document, using defaults: {}", id, e);
                Self::empty(id)
            }
        }
    }

    /// The document written back to the store. `null` top-level fields are
    /// stripped.
    pub fn to_document(&self) -> Value {
        let value = match self {
            SectionContent::Hero(c) | SectionContent::About(c) => serde_json::to_value(c),
            SectionContent::Skills(c) => serde_json::to_value(c),
            SectionContent::Projects(c) => serde_json::to_value(c),
            SectionContent::Experience(c) => serde_json::to_value(c),
            SectionContent::Contact(c) => serde_json::to_value(c),
        };

        match value {
            Ok(Value::Object(mut map)) => {
                map.retain(|_, v| !v.is_null());
                Value::Object(map)
            }
            Ok(other) => other,
            // Plain structs of strings and numbers always serialize
            Err(_) => Value::Object(Default::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_id_round_trip_str() {
        for id in SectionId::ALL {
            assert_eq!(id.as_str().parse::<SectionId>().unwrap(), id);
        }
        assert!("footer".parse::<SectionId>().is_err());
    }

    #[test]
    fn test_section_paths() {
        assert_eq!(SectionId::Projects.content_path(), "content/projects");
        assert_eq!(SectionId::Hero.registry_path(), "sections/hero");
    }

    #[test]
    fn test_missing_document_is_empty_content() {
        let content = SectionContent::from_document(SectionId::Skills, &Value::Null);
        assert_eq!(content, SectionContent::Skills(SkillsContent::default()));
    }

    #[test]
    fn test_projects_map_normalized_to_list() {
        let document = json!({
            "title": "Work",
            "projects": {
                "-Nx1": { "title": "First", "image": "a.png" },
                "-Nx2": { "title": "Second", "image": ["b.png", "c.png"] }
            }
        });

        let SectionContent::Projects(projects) =
            SectionContent::from_document(SectionId::Projects, &document)
        else {
            panic!("expected projects");
        };

        assert_eq!(projects.projects.len(), 2);
        assert_eq!(projects.projects[0].image.urls(), vec!["a.png"]);
        assert_eq!(projects.projects[1].image.urls(), vec!["b.png", "c.png"]);
        assert!(projects.projects[0].technologies.is_empty());
    }

    #[test]
    fn test_skill_level_clamped_on_read() {
        let document = json!({
            "categories": [{ "name": "Lang", "skills": [
                { "name": "Rust", "level": 250 },
                { "name": "Go", "level": "40" }
            ]}]
        });

        let SectionContent::Skills(skills) =
            SectionContent::from_document(SectionId::Skills, &document)
        else {
            panic!("expected skills");
        };

        assert_eq!(skills.categories[0].skills[0].level, 100);
        assert_eq!(skills.categories[0].skills[1].level, 40);
    }

    #[test]
    fn test_bad_link_skipped_rest_kept() {
        let document = json!({
            "title": "Reach Me",
            "links": [
                { "type": "email", "link": "mailto:me@example.com", "message": "Email me" },
                { "type": "linkedin", "link": "in/me", "message": "Connect" }
            ]
        });

        let SectionContent::Contact(contact) =
            SectionContent::try_from_document(SectionId::Contact, &document).unwrap()
        else {
            panic!("expected contact");
        };

        assert_eq!(contact.title.as_deref(), Some("Reach Me"));
        assert_eq!(contact.links.len(), 1);
        assert_eq!(contact.links[0].kind, LinkKind::Email);
    }

    #[test]
    fn test_bad_scalars_coerced() {
        let document = json!({ "title": 2024, "subtitle": { "en": "Dev" }, "image": ["x"] });
        let SectionContent::Hero(hero) = SectionContent::from_document(SectionId::Hero, &document)
        else {
            panic!("expected hero");
        };
        assert_eq!(hero.title.as_deref(), Some("2024"));
        assert_eq!(hero.subtitle, None);
        assert_eq!(hero.image, None);
    }

    #[test]
    fn test_malformed_contact_details_dropped() {
        let document = json!({ "title": "Contact", "contact": "me@example.com" });
        let SectionContent::Contact(contact) =
            SectionContent::from_document(SectionId::Contact, &document)
        else {
            panic!("expected contact");
        };
        assert_eq!(contact.title.as_deref(), Some("Contact"));
        assert!(contact.contact.is_none());
    }

    #[test]
    fn test_non_record_document_falls_back() {
        let document = json!("just a string");
        assert!(SectionContent::try_from_document(SectionId::About, &document).is_err());
        assert_eq!(
            SectionContent::from_document(SectionId::About, &document),
            SectionContent::empty(SectionId::About)
        );
    }

    #[test]
    fn test_experience_single_string_description() {
        let document = json!({
            "experience": [{ "title": "Senior Developer", "description": "Leading development" }]
        });
        let SectionContent::Experience(exp) =
            SectionContent::from_document(SectionId::Experience, &document)
        else {
            panic!("expected experience");
        };
        assert_eq!(exp.experiences[0].description, vec!["Leading development"]);
    }

    #[test]
    fn test_to_document_strips_absent_fields() {
        let content = SectionContent::Hero(HeroContent {
            title: Some("Hi".into()),
            ..Default::default()
        });
        assert_eq!(content.to_document(), json!({ "title": "Hi" }));
    }

    #[test]
    fn test_document_round_trip() {
        let document = json!({
            "title": "Reach Me",
            "links": [{ "type": "email", "link": "mailto:x@y.com", "message": "Email me" }]
        });
        let content = SectionContent::from_document(SectionId::Contact, &document);
        assert_eq!(content.to_document(), document);
    }
}
