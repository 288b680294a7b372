//! Section rendering.
//!
//! Renderers are pure functions from typed content to an HTML fragment.
//! `portfolio` wires them to live store subscriptions.
//!
//! ## Sections
//! - `sections`: one renderer per section type, plus contact link resolution
//! - `portfolio`: `SectionView` (one live section) and `PortfolioView`
//!   (registry-gated composition of the public page)

pub mod portfolio;
pub mod sections;

pub use portfolio::{PortfolioView, SectionView};
pub use sections::resolve_link;

use crate::schema::SectionContent;

/// Render one section's fragment.
pub fn render_section(content: &SectionContent) -> String {
    match content {
        SectionContent::Hero(c) => sections::render_hero(c),
        SectionContent::About(c) => sections::render_about(c),
        SectionContent::Skills(c) => sections::render_skills(c),
        SectionContent::Projects(c) => sections::render_projects(c),
        SectionContent::Experience(c) => sections::render_experience(c),
        SectionContent::Contact(c) => sections::render_contact(c),
    }
}

/// Escape text for HTML bodies and double-quoted attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;"
        );
    }
}
