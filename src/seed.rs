//! Initialization routine: default registry and starter content.
//!
//! `initialize` overwrites `sections` and `content` wholesale. The server runs
//! it on first start (empty store) and on demand from the admin API.

use serde_json::{Map, Value};

use crate::registry::Section;
use crate::schema::{
    ContactContent, ContactDetails, ContactLink, Experience, ExperienceContent, ImageSet,
    IntroContent, LinkKind, Project, ProjectsContent, SectionContent, SectionId, Skill,
    SkillCategory, SkillsContent, CONTENT_ROOT, REGISTRY_PATH,
};
use crate::store::{DocumentStore, StoreError};

/// Every known section, enabled, named by its display name.
pub fn default_registry() -> Vec<Section> {
    SectionId::ALL
        .into_iter()
        .map(|id| Section {
            id: id.as_str().to_string(),
            name: id.display_name().to_string(),
            enabled: true,
        })
        .collect()
}

pub fn default_content() -> Vec<SectionContent> {
    let skills = ["JavaScript", "TypeScript", "React", "Node.js", "HTML/CSS", "Rust"]
        .into_iter()
        .map(|name| Skill {
            name: name.to_string(),
            level: 80,
            icon: None,
        })
        .collect();

    vec![
        SectionContent::Hero(IntroContent {
            title: Some("Welcome to My Portfolio".into()),
            subtitle: None,
            description: Some("I am a passionate developer creating amazing web experiences.".into()),
            image: None,
        }),
        SectionContent::About(IntroContent {
            title: Some("About Me".into()),
            subtitle: None,
            description: Some(
                "I am a dedicated developer with a passion for creating beautiful and functional web applications."
                    .into(),
            ),
            image: None,
        }),
        SectionContent::Skills(SkillsContent {
            title: Some("My Skills".into()),
            description: Some("Here are some of the technologies I work with:".into()),
            categories: vec![SkillCategory {
                name: String::new(),
                skills,
            }],
        }),
        SectionContent::Projects(ProjectsContent {
            title: "My Projects".into(),
            description: String::new(),
            projects: vec![
                Project {
                    title: "Portfolio Website".into(),
                    description: "A modern, responsive portfolio website with a dynamic admin panel for content management.".into(),
                    image: ImageSet::Single(
                        "https://images.unsplash.com/photo-1460925895917-afdab827c52f?auto=format&fit=crop&w=800&q=80".into(),
                    ),
                    video: None,
                    technologies: vec!["Rust".into(), "Axum".into(), "htmx".into()],
                    live_url: Some("https://your-portfolio.com".into()),
                    github_url: Some("https://github.com/yourusername/portfolio".into()),
                },
                Project {
                    title: "E-commerce Platform".into(),
                    description: "A full-featured e-commerce platform with user authentication, product management, and secure payment processing.".into(),
                    image: ImageSet::Single(
                        "https://images.unsplash.com/photo-1556742049-0cfed4f6a45d?auto=format&fit=crop&w=800&q=80".into(),
                    ),
                    video: None,
                    technologies: vec!["Node.js".into(), "Express".into(), "MongoDB".into(), "Stripe".into()],
                    live_url: Some("https://your-ecommerce.com".into()),
                    github_url: Some("https://github.com/yourusername/ecommerce".into()),
                },
            ],
        }),
        SectionContent::Experience(ExperienceContent {
            title: "Work Experience".into(),
            description: "My professional journey:".into(),
            experiences: vec![Experience {
                title: "Senior Developer".into(),
                company: "Tech Company".into(),
                location: String::new(),
                period: "2020 - Present".into(),
                description: vec!["Leading development of web applications".into()],
                technologies: vec![],
            }],
        }),
        SectionContent::Contact(ContactContent {
            title: Some("Get in Touch".into()),
            description: Some("Feel free to reach out to me through any of these platforms.".into()),
            contact: Some(ContactDetails {
                email: Some("your.email@example.com".into()),
                phone: Some("+1234567890".into()),
                location: Some("Your Location".into()),
            }),
            links: vec![
                ContactLink {
                    kind: LinkKind::Messenger,
                    link: "https://m.me/yourusername".into(),
                    message: "Message me on Messenger".into(),
                    icon: None,
                },
                ContactLink {
                    kind: LinkKind::Instagram,
                    link: "https://instagram.com/yourusername".into(),
                    message: "Follow me on Instagram".into(),
                    icon: None,
                },
                ContactLink {
                    kind: LinkKind::Email,
                    link: "mailto:your.email@example.com".into(),
                    message: "Send me an email".into(),
                    icon: None,
                },
            ],
        }),
    ]
}

/// Write the default registry, then the default content.
pub async fn initialize(store: &DocumentStore) -> Result<(), StoreError> {
    let registry: Map<String, Value> = default_registry()
        .into_iter()
        .map(|section| (section.id.clone(), section.to_document()))
        .collect();

    let content: Map<String, Value> = default_content()
        .into_iter()
        .map(|section| (section.id().as_str().to_string(), section.to_document()))
        .collect();

    store.set(REGISTRY_PATH, Value::Object(registry)).await?;
    store.set(CONTENT_ROOT, Value::Object(content)).await?;

    tracing::info!("Store initialized with default sections and content");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SectionRegistry;
    use serde_json::json;

    #[tokio::test]
    async fn test_initialize_enables_every_section() {
        let store = DocumentStore::in_memory();
        initialize(&store).await.unwrap();

        let registry = SectionRegistry::from_document(&store.get(REGISTRY_PATH).unwrap());
        assert_eq!(registry.enabled_sections(), SectionId::ALL.to_vec());
        assert_eq!(registry.get("hero").unwrap().name, "Hero");
    }

    #[tokio::test]
    async fn test_seeded_content_reads_back_typed() {
        let store = DocumentStore::in_memory();
        initialize(&store).await.unwrap();

        for expected in default_content() {
            let id = expected.id();
            let document = store.get(&id.content_path()).unwrap();
            assert_eq!(SectionContent::try_from_document(id, &document).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_initialize_overwrites_existing_content() {
        let store = DocumentStore::in_memory();
        store.set("content/blog", json!({ "title": "Old" })).await.unwrap();

        initialize(&store).await.unwrap();

        assert!(store.get("content/blog").is_none());
        assert_eq!(
            store.get("content/projects/title"),
            Some(json!("My Projects"))
        );
    }
}
