use crate::schema::{
    ContactContent, ContactDetails, ContactLink, Experience, ExperienceContent, IntroContent,
    LinkKind, Project, ProjectsContent, Skill, SkillsContent,
};

use super::html_escape;

const HERO_TITLE: &str = "Welcome to My Portfolio";
const HERO_DESCRIPTION: &str =
    "I am a passionate developer dedicated to creating beautiful and functional web applications.";
const ABOUT_TITLE: &str = "About Me";
const ABOUT_DESCRIPTION: &str =
    "I am a dedicated developer with a passion for creating beautiful and functional web applications.";
const SKILLS_TITLE: &str = "My Skills";
const SKILLS_DESCRIPTION: &str = "Here are some of the technologies and tools I work with.";
const PROJECTS_TITLE: &str = "My Projects";
const EXPERIENCE_TITLE: &str = "Work Experience";
const EXPERIENCE_DESCRIPTION: &str = "My professional journey and achievements.";
const CONTACT_TITLE: &str = "Get in Touch";
const CONTACT_DESCRIPTION: &str = "Feel free to reach out to me through any of these platforms.";

/// Stored value, or `fallback` when absent or empty.
fn or_fallback<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn push_header(html: &mut String, title: &str, description: Option<&str>, rich: bool) {
    html.push_str("<header class=\"section-header\">\n");
    html.push_str(&format!("<h2 class=\"section-title\">{}</h2>\n", html_escape(title)));
    if let Some(description) = description {
        let body = if rich { description.to_string() } else { html_escape(description) };
        html.push_str(&format!("<div class=\"section-description\">{}</div>\n", body));
    }
    html.push_str("</header>\n");
}

fn push_tags(html: &mut String, tags: &[String]) {
    let tags: Vec<&String> = tags.iter().filter(|t| !t.trim().is_empty()).collect();
    if tags.is_empty() {
        return;
    }
    html.push_str("<ul class=\"tags\">");
    for tag in tags {
        html.push_str(&format!("<li class=\"tag\">{}</li>", html_escape(tag)));
    }
    html.push_str("</ul>\n");
}

// ============================================================================
// Hero / About
// ============================================================================

pub fn render_hero(content: &IntroContent) -> String {
    let mut html = String::with_capacity(1024);
    let title = or_fallback(content.title.as_deref(), HERO_TITLE);

    html.push_str("<section id=\"hero\" class=\"section hero\">\n");
    html.push_str("<div class=\"hero-text\">\n");
    if let Some(subtitle) = non_empty(content.subtitle.as_deref()) {
        html.push_str(&format!("<p class=\"hero-subtitle\">{}</p>\n", html_escape(subtitle)));
    }
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(title)));
    html.push_str(&format!(
        "<div class=\"hero-description\">{}</div>\n",
        or_fallback(content.description.as_deref(), HERO_DESCRIPTION)
    ));
    html.push_str("<div class=\"hero-actions\">\n");
    html.push_str("<a class=\"btn btn-primary\" href=\"#contact\">Get in Touch</a>\n");
    html.push_str("<a class=\"btn btn-outline\" href=\"#projects\">View Projects</a>\n");
    html.push_str("</div>\n</div>\n");
    if let Some(image) = non_empty(content.image.as_deref()) {
        html.push_str(&format!(
            "<img class=\"hero-image\" src=\"{}\" alt=\"{}\">\n",
            html_escape(image),
            html_escape(title)
        ));
    }
    html.push_str("</section>\n");
    html
}

pub fn render_about(content: &IntroContent) -> String {
    let mut html = String::with_capacity(1024);
    let title = or_fallback(content.title.as_deref(), ABOUT_TITLE);

    html.push_str("<section id=\"about\" class=\"section about\">\n");
    push_header(&mut html, title, None, false);
    html.push_str("<div class=\"about-body\">\n");
    if let Some(image) = non_empty(content.image.as_deref()) {
        html.push_str(&format!(
            "<img class=\"about-image\" src=\"{}\" alt=\"{}\">\n",
            html_escape(image),
            html_escape(title)
        ));
    }
    if let Some(subtitle) = non_empty(content.subtitle.as_deref()) {
        html.push_str(&format!("<h3>{}</h3>\n", html_escape(subtitle)));
    }
    html.push_str(&format!(
        "<div class=\"about-description\">{}</div>\n",
        or_fallback(content.description.as_deref(), ABOUT_DESCRIPTION)
    ));
    html.push_str("</div>\n</section>\n");
    html
}

// ============================================================================
// Skills
// ============================================================================

pub fn render_skills(content: &SkillsContent) -> String {
    let mut html = String::with_capacity(2048);

    html.push_str("<section id=\"skills\" class=\"section skills\">\n");
    push_header(
        &mut html,
        or_fallback(content.title.as_deref(), SKILLS_TITLE),
        Some(or_fallback(content.description.as_deref(), SKILLS_DESCRIPTION)),
        true,
    );

    for category in &content.categories {
        html.push_str("<div class=\"skill-category\">\n");
        if !category.name.trim().is_empty() {
            html.push_str(&format!("<h3>{}</h3>\n", html_escape(&category.name)));
        }
        html.push_str("<ul class=\"skill-list\">\n");
        for skill in &category.skills {
            push_skill(&mut html, skill);
        }
        html.push_str("</ul>\n</div>\n");
    }

    html.push_str("</section>\n");
    html
}

fn push_skill(html: &mut String, skill: &Skill) {
    let level = skill.level.min(100);
    html.push_str("<li class=\"skill\">\n");
    if let Some(icon) = non_empty(skill.icon.as_deref()) {
        html.push_str(&format!(
            "<img class=\"skill-icon\" src=\"{}\" alt=\"{}\">\n",
            html_escape(icon),
            html_escape(&skill.name)
        ));
    }
    html.push_str(&format!("<span class=\"skill-name\">{}</span>\n", html_escape(&skill.name)));
    html.push_str(&format!("<span class=\"skill-level\">{}%</span>\n", level));
    html.push_str(&format!(
        "<div class=\"skill-bar\"><div class=\"skill-bar-fill\" style=\"width: {}%\"></div></div>\n",
        level
    ));
    html.push_str("</li>\n");
}

// ============================================================================
// Projects
// ============================================================================

pub fn render_projects(content: &ProjectsContent) -> String {
    let mut html = String::with_capacity(4096);
    let description = Some(content.description.as_str()).filter(|d| !d.trim().is_empty());

    html.push_str("<section id=\"projects\" class=\"section projects\">\n");
    push_header(
        &mut html,
        or_fallback(Some(content.title.as_str()), PROJECTS_TITLE),
        description,
        true,
    );
    html.push_str("<div class=\"project-grid\">\n");
    for project in &content.projects {
        push_project(&mut html, project);
    }
    html.push_str("</div>\n</section>\n");
    html
}

fn push_project(html: &mut String, project: &Project) {
    let images = project.image.urls();

    html.push_str("<article class=\"project\">\n");

    if let Some(video) = non_empty(project.video.as_deref()) {
        let poster = images
            .first()
            .map(|p| format!(" poster=\"{}\"", html_escape(p)))
            .unwrap_or_default();
        html.push_str(&format!(
            "<video class=\"project-video\" controls preload=\"metadata\"{}><source src=\"{}\"></video>\n",
            poster,
            html_escape(video)
        ));
    } else if !images.is_empty() {
        html.push_str("<div class=\"carousel\">\n");
        for (index, url) in images.iter().enumerate() {
            let class = if index == 0 { "carousel-item active" } else { "carousel-item" };
            html.push_str(&format!(
                "<img class=\"{}\" data-index=\"{}\" src=\"{}\" alt=\"{}\">\n",
                class,
                index,
                html_escape(url),
                html_escape(&project.title)
            ));
        }
        html.push_str("</div>\n");
    }

    html.push_str(&format!("<h3 class=\"project-title\">{}</h3>\n", html_escape(&project.title)));
    html.push_str(&format!("<div class=\"project-description\">{}</div>\n", project.description));
    push_tags(html, &project.technologies);

    let live = non_empty(project.live_url.as_deref());
    let github = non_empty(project.github_url.as_deref());
    if live.is_some() || github.is_some() {
        html.push_str("<div class=\"project-links\">\n");
        if let Some(url) = live {
            html.push_str(&format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Live Demo</a>\n",
                html_escape(url)
            ));
        }
        if let Some(url) = github {
            html.push_str(&format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">GitHub</a>\n",
                html_escape(url)
            ));
        }
        html.push_str("</div>\n");
    }

    html.push_str("</article>\n");
}

// ============================================================================
// Experience
// ============================================================================

pub fn render_experience(content: &ExperienceContent) -> String {
    let mut html = String::with_capacity(2048);

    html.push_str("<section id=\"experience\" class=\"section experience\">\n");
    push_header(
        &mut html,
        or_fallback(Some(content.title.as_str()), EXPERIENCE_TITLE),
        Some(or_fallback(Some(content.description.as_str()), EXPERIENCE_DESCRIPTION)),
        false,
    );
    html.push_str("<ol class=\"timeline\">\n");
    for experience in &content.experiences {
        push_experience(&mut html, experience);
    }
    html.push_str("</ol>\n</section>\n");
    html
}

fn push_experience(html: &mut String, experience: &Experience) {
    html.push_str("<li class=\"timeline-item\">\n");
    html.push_str(&format!("<h3>{}</h3>\n", html_escape(&experience.title)));

    let meta: Vec<String> = [experience.company.as_str(), experience.location.as_str()]
        .into_iter()
        .filter(|m| !m.trim().is_empty())
        .map(html_escape)
        .collect();
    if !meta.is_empty() {
        html.push_str(&format!("<p class=\"timeline-meta\">{}</p>\n", meta.join(" · ")));
    }
    if !experience.period.trim().is_empty() {
        html.push_str(&format!(
            "<p class=\"timeline-period\">{}</p>\n",
            html_escape(&experience.period)
        ));
    }

    let bullets: Vec<&String> = experience
        .description
        .iter()
        .filter(|b| !b.trim().is_empty())
        .collect();
    if !bullets.is_empty() {
        html.push_str("<ul class=\"timeline-points\">\n");
        for bullet in bullets {
            html.push_str(&format!("<li>{}</li>\n", html_escape(bullet)));
        }
        html.push_str("</ul>\n");
    }
    push_tags(html, &experience.technologies);
    html.push_str("</li>\n");
}

// ============================================================================
// Contact
// ============================================================================

/// Resolve a stored link to its href. Social kinds accept a bare username,
/// an `@handle`, or a profile URL.
pub fn resolve_link(kind: LinkKind, link: &str) -> String {
    let (base, host) = match kind {
        LinkKind::Email => return link.to_string(),
        LinkKind::Messenger => ("https://www.messenger.com/t/", "m.me/"),
        LinkKind::Instagram => ("https://www.instagram.com/", "instagram.com/"),
        LinkKind::Telegram => ("https://t.me/", "t.me/"),
    };

    let mut user = link.trim();
    for scheme in ["https://", "http://"] {
        user = user.strip_prefix(scheme).unwrap_or(user);
    }
    user = user.strip_prefix("www.").unwrap_or(user);
    user = user.strip_prefix(host).unwrap_or(user);
    let user = user.trim_start_matches(['/', '@']).trim_end_matches('/');

    format!("{}{}", base, user)
}

pub fn render_contact(content: &ContactContent) -> String {
    let mut html = String::with_capacity(2048);

    html.push_str("<section id=\"contact\" class=\"section contact\">\n");
    push_header(
        &mut html,
        or_fallback(content.title.as_deref(), CONTACT_TITLE),
        Some(or_fallback(content.description.as_deref(), CONTACT_DESCRIPTION)),
        false,
    );

    if let Some(details) = &content.contact {
        push_contact_details(&mut html, details);
    }

    if !content.links.is_empty() {
        html.push_str("<div class=\"contact-links\">\n<h3>Connect with Me</h3>\n");
        for link in &content.links {
            push_contact_link(&mut html, link);
        }
        html.push_str("</div>\n");
    }

    html.push_str("</section>\n");
    html
}

fn push_contact_details(html: &mut String, details: &ContactDetails) {
    html.push_str("<div class=\"contact-details\">\n");
    if let Some(email) = non_empty(details.email.as_deref()) {
        let email = html_escape(email);
        html.push_str(&format!(
            "<div class=\"contact-card\"><h3>Email</h3><a href=\"mailto:{}\">{}</a></div>\n",
            email, email
        ));
    }
    if let Some(phone) = non_empty(details.phone.as_deref()) {
        let phone = html_escape(phone);
        html.push_str(&format!(
            "<div class=\"contact-card\"><h3>Phone</h3><a href=\"tel:{}\">{}</a></div>\n",
            phone, phone
        ));
    }
    if let Some(location) = non_empty(details.location.as_deref()) {
        html.push_str(&format!(
            "<div class=\"contact-card\"><h3>Location</h3><p>{}</p></div>\n",
            html_escape(location)
        ));
    }
    html.push_str("</div>\n");
}

fn push_contact_link(html: &mut String, link: &ContactLink) {
    html.push_str(&format!(
        "<a class=\"contact-link\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
        html_escape(&resolve_link(link.kind, &link.link))
    ));
    match non_empty(link.icon.as_deref()) {
        Some(icon) => html.push_str(&format!(
            "<img class=\"contact-icon\" src=\"{}\" alt=\"{}\">",
            html_escape(icon),
            link.kind.as_str()
        )),
        None => html.push_str(&format!(
            "<span class=\"contact-badge\">{}</span>",
            link.kind.initial()
        )),
    }
    html.push_str(&format!("<span>{}</span></a>\n", html_escape(&link.message)));
}
