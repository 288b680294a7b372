//! Blob Store
//!
//! Uploaded images and videos live under a media root on disk and are served
//! back under a public base URL. Destination layout:
//!
//! - `images/{section}/{filename}`
//! - `project-images/{filename}`
//! - `skill-icons/{filename}`
//! - `contact-icons/{filename}`
//! - `videos/{timestamp}_{filename}`

use std::fmt;
use std::path::PathBuf;

use crate::schema::SectionId;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("invalid file name '{0}'")]
    InvalidName(String),

    #[error("unknown upload kind '{0}'")]
    UnknownKind(String),

    #[error("section image uploads need a section: {0}")]
    MissingSection(String),

    #[error("failed to store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobPath {
    SectionImage { section: SectionId, filename: String },
    ProjectImage { filename: String },
    SkillIcon { filename: String },
    ContactIcon { filename: String },
    Video { timestamp_ms: i64, filename: String },
}

impl BlobPath {
    pub fn section_image(section: SectionId, filename: &str) -> Result<Self, BlobError> {
        Ok(BlobPath::SectionImage {
            section,
            filename: checked_name(filename)?,
        })
    }

    pub fn project_image(filename: &str) -> Result<Self, BlobError> {
        Ok(BlobPath::ProjectImage { filename: checked_name(filename)? })
    }

    pub fn skill_icon(filename: &str) -> Result<Self, BlobError> {
        Ok(BlobPath::SkillIcon { filename: checked_name(filename)? })
    }

    pub fn contact_icon(filename: &str) -> Result<Self, BlobError> {
        Ok(BlobPath::ContactIcon { filename: checked_name(filename)? })
    }

    /// Videos are prefixed with the upload time so re-uploads never collide.
    pub fn video(filename: &str) -> Result<Self, BlobError> {
        Ok(BlobPath::Video {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            filename: checked_name(filename)?,
        })
    }

    /// Build from the upload endpoint's `kind` / `section` / `filename`.
    pub fn from_parts(kind: &str, section: Option<&str>, filename: &str) -> Result<Self, BlobError> {
        match kind {
            "images" | "section-image" => {
                let section = section
                    .ok_or_else(|| BlobError::MissingSection(filename.to_string()))?
                    .parse::<SectionId>()
                    .map_err(|e| BlobError::MissingSection(e.to_string()))?;
                Self::section_image(section, filename)
            }
            "project-images" | "project-image" => Self::project_image(filename),
            "skill-icons" | "skill-icon" => Self::skill_icon(filename),
            "contact-icons" | "contact-icon" => Self::contact_icon(filename),
            "videos" | "video" => Self::video(filename),
            other => Err(BlobError::UnknownKind(other.to_string())),
        }
    }

    /// Path segments below the media root.
    pub fn segments(&self) -> Vec<String> {
        match self {
            BlobPath::SectionImage { section, filename } => {
                vec!["images".into(), section.as_str().into(), filename.clone()]
            }
            BlobPath::ProjectImage { filename } => vec!["project-images".into(), filename.clone()],
            BlobPath::SkillIcon { filename } => vec!["skill-icons".into(), filename.clone()],
            BlobPath::ContactIcon { filename } => vec!["contact-icons".into(), filename.clone()],
            BlobPath::Video { timestamp_ms, filename } => {
                vec!["videos".into(), format!("{}_{}", timestamp_ms, filename)]
            }
        }
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("/"))
    }
}

fn checked_name(filename: &str) -> Result<String, BlobError> {
    let bad = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
        || filename.chars().any(char::is_control);

    if bad {
        Err(BlobError::InvalidName(filename.to_string()))
    } else {
        Ok(filename.to_string())
    }
}

// ============================================================================
// Local Blob Store
// ============================================================================

/// Filesystem-backed blob store. Files are written under `root` and exposed
/// at `public_base` (served by the web layer).
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn local_path(&self, path: &BlobPath) -> PathBuf {
        path.segments()
            .iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Public URL of a stored blob, each segment percent-encoded.
    pub fn public_url(&self, path: &BlobPath) -> String {
        let encoded: Vec<String> = path
            .segments()
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}", self.public_base.trim_end_matches('/'), encoded.join("/"))
    }

    /// Store `bytes` at `path` (overwriting) and return the public URL.
    pub async fn upload(&self, path: &BlobPath, bytes: &[u8]) -> Result<String, BlobError> {
        let target = self.local_path(path);
        let io_err = |source: std::io::Error| BlobError::Io {
            path: target.clone(),
            source,
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&target, bytes).await.map_err(io_err)?;

        tracing::info!("Stored {} ({} bytes)", path, bytes.len());
        Ok(self.public_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_destination_layout() {
        let path = BlobPath::section_image(SectionId::About, "me.jpg").unwrap();
        assert_eq!(path.to_string(), "images/about/me.jpg");
        assert_eq!(BlobPath::skill_icon("logo.png").unwrap().to_string(), "skill-icons/logo.png");

        let video = BlobPath::Video { timestamp_ms: 1700000000000, filename: "demo.mp4".into() };
        assert_eq!(video.to_string(), "videos/1700000000000_demo.mp4");
    }

    #[test]
    fn test_rejects_traversal_names() {
        assert!(BlobPath::project_image("../etc/passwd").is_err());
        assert!(BlobPath::project_image("..").is_err());
        assert!(BlobPath::contact_icon("").is_err());
        assert!(BlobPath::contact_icon("a\\b.png").is_err());
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(
            BlobPath::from_parts("images", Some("hero"), "h.png").unwrap(),
            BlobPath::SectionImage { section: SectionId::Hero, filename: "h.png".into() }
        );
        assert!(matches!(
            BlobPath::from_parts("images", None, "h.png"),
            Err(BlobError::MissingSection(_))
        ));
        assert!(matches!(
            BlobPath::from_parts("documents", None, "cv.pdf"),
            Err(BlobError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let store = LocalBlobStore::new("/tmp/unused", "/media/");
        let path = BlobPath::project_image("my shot.png").unwrap();
        assert_eq!(store.public_url(&path), "/media/project-images/my%20shot.png");
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = TempDir::new("blobs").unwrap();
        let store = LocalBlobStore::new(dir.path(), "https://cdn.example.com/media");
        let path = BlobPath::skill_icon("logo.png").unwrap();

        let url = store.upload(&path, b"\x89PNG").await.unwrap();

        assert_eq!(url, "https://cdn.example.com/media/skill-icons/logo.png");
        let written = std::fs::read(dir.path().join("skill-icons").join("logo.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
    }
}
