//! Typed section documents.
//!
//! Field names follow the stored JSON (camelCase). Fields are tolerant on the
//! way in: `null`, missing, or keyed-map shapes all become ordered lists, list
//! elements that do not fit are skipped, and stray scalars are stringified
//! (see `normalize`).

use serde::{Deserialize, Serialize};

use super::normalize::{image_set, level, list, opt_text, record, text};

// ============================================================================
// Hero / About
// ============================================================================

/// Banner-style content shared by the hero and about sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntroContent {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Rich HTML
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

pub type HeroContent = IntroContent;
pub type AboutContent = IntroContent;

// ============================================================================
// Skills
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsContent {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub categories: Vec<SkillCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillCategory {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "list")]
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    /// Proficiency in percent, always within 0..=100 after normalization
    #[serde(default, deserialize_with = "level")]
    pub level: u8,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectsContent {
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(default, deserialize_with = "text")]
    pub description: String,
    #[serde(default, deserialize_with = "list")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    /// Rich HTML
    #[serde(default, deserialize_with = "text")]
    pub description: String,
    #[serde(default, deserialize_with = "image_set")]
    pub image: ImageSet,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub technologies: Vec<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
}

/// A project's image field: stored either as one URL or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSet {
    Single(String),
    Many(Vec<String>),
}

impl Default for ImageSet {
    fn default() -> Self {
        ImageSet::Single(String::new())
    }
}

impl ImageSet {
    /// Normalize to an ordered list, dropping empty URLs.
    pub fn urls(&self) -> Vec<&str> {
        let all: Vec<&str> = match self {
            ImageSet::Single(url) => vec![url.as_str()],
            ImageSet::Many(urls) => urls.iter().map(|u| u.as_str()).collect(),
        };
        all.into_iter().filter(|u| !u.is_empty()).collect()
    }

    pub fn first(&self) -> Option<&str> {
        self.urls().into_iter().next()
    }

    /// Append an uploaded image. An empty single slot is replaced.
    pub fn push(&mut self, url: String) {
        let mut urls: Vec<String> = self.urls().into_iter().map(str::to_string).collect();
        urls.push(url);
        *self = ImageSet::from_urls(urls);
    }

    /// Remove the image at `index` of `urls()`. Returns false when out of range.
    pub fn remove(&mut self, index: usize) -> bool {
        let mut urls: Vec<String> = self.urls().into_iter().map(str::to_string).collect();
        if index >= urls.len() {
            return false;
        }
        urls.remove(index);
        *self = ImageSet::from_urls(urls);
        true
    }

    /// A single remaining image collapses back to the scalar form.
    pub fn from_urls(mut urls: Vec<String>) -> Self {
        match urls.len() {
            0 => ImageSet::default(),
            1 => ImageSet::Single(urls.remove(0)),
            _ => ImageSet::Many(urls),
        }
    }
}

// ============================================================================
// Experience
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceContent {
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(default, deserialize_with = "text")]
    pub description: String,
    #[serde(default, deserialize_with = "list")]
    pub experiences: Vec<Experience>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(default, deserialize_with = "text")]
    pub company: String,
    #[serde(default, deserialize_with = "text")]
    pub location: String,
    #[serde(default, deserialize_with = "text")]
    pub period: String,
    /// Bullet points; a single stored string becomes one bullet.
    #[serde(default, deserialize_with = "list")]
    pub description: Vec<String>,
    #[serde(default, deserialize_with = "list")]
    pub technologies: Vec<String>,
}

// ============================================================================
// Contact
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactContent {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "record", skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactDetails>,
    #[serde(default, deserialize_with = "list")]
    pub links: Vec<ContactLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactLink {
    #[serde(rename = "type", default)]
    pub kind: LinkKind,
    #[serde(default, deserialize_with = "text")]
    pub link: String,
    #[serde(default, deserialize_with = "text")]
    pub message: String,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    #[default]
    Messenger,
    Instagram,
    Email,
    Telegram,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Messenger => "messenger",
            LinkKind::Instagram => "instagram",
            LinkKind::Email => "email",
            LinkKind::Telegram => "telegram",
        }
    }

    /// Badge shown when a link has no icon.
    pub fn initial(&self) -> char {
        match self {
            LinkKind::Messenger => 'M',
            LinkKind::Instagram => 'I',
            LinkKind::Email => 'E',
            LinkKind::Telegram => 'T',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_set_push_replaces_empty_slot() {
        let mut images = ImageSet::default();
        images.push("https://cdn/a.png".to_string());
        assert_eq!(images, ImageSet::Single("https://cdn/a.png".to_string()));

        images.push("https://cdn/b.png".to_string());
        assert_eq!(images.urls(), vec!["https://cdn/a.png", "https://cdn/b.png"]);
    }

    #[test]
    fn test_image_set_remove_collapses_to_single() {
        let mut images = ImageSet::Many(vec!["a".into(), "b".into()]);
        assert!(images.remove(0));
        assert_eq!(images, ImageSet::Single("b".to_string()));
        assert!(!images.remove(3));
    }

    #[test]
    fn test_image_set_urls_skip_empty() {
        let images = ImageSet::Many(vec!["".into(), "x".into()]);
        assert_eq!(images.urls(), vec!["x"]);
        assert!(ImageSet::default().urls().is_empty());
    }

    #[test]
    fn test_project_serializes_camel_case() {
        let project = Project {
            title: "Site".into(),
            live_url: Some("https://example.com".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["liveUrl"], "https://example.com");
        assert!(value.get("githubUrl").is_none());
    }
}
