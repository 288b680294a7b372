//! Admin Editor
//!
//! Per-principal editing session. A session moves through
//! `Unauthenticated -> Loading -> Authenticated`; once authenticated the
//! principal selects a section, which loads a one-shot copy of its document
//! into a local draft. Edits touch only the draft. Saving writes the whole
//! draft back to `content/{id}` and raises a transient status message.
//!
//! ## Sections
//! - Session state and save status
//! - Editor operations (select, edit, save, toggle)

pub mod ops;

pub use ops::{ContactEdit, EditError, EditOp, ExperienceEdit, IntroEdit, ProjectsEdit, SkillsEdit};

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::identity::Principal;
use crate::registry::Section;
use crate::schema::{SectionContent, SectionId};
use crate::store::{DocumentStore, StoreError};

/// How long a success message stays visible.
pub const SAVE_STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// Session State
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Unauthenticated,
    Loading,
    Authenticated {
        principal: Principal,
        selected: Option<SectionId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SaveStatus {
    Success {
        message: String,
        #[serde(skip)]
        expires_at: Instant,
    },
    /// Stays until the next save or selection
    Error { message: String },
}

impl SaveStatus {
    pub fn message(&self) -> &str {
        match self {
            SaveStatus::Success { message, .. } | SaveStatus::Error { message } => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SaveStatus::Error { .. })
    }

    fn is_visible(&self, now: Instant) -> bool {
        match self {
            SaveStatus::Success { expires_at, .. } => now < *expires_at,
            SaveStatus::Error { .. } => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("sign-in required")]
    LoginRequired,

    #[error("No section selected")]
    NoSectionSelected,

    #[error("stored {0} content could not be read; saving would overwrite it")]
    UnreadableDocument(SectionId),

    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("failed to save {section}: {source}")]
    Save {
        section: SectionId,
        #[source]
        source: StoreError,
    },

    #[error("failed to update section '{id}': {source}")]
    Registry {
        id: String,
        #[source]
        source: StoreError,
    },
}

// ============================================================================
// Editor
// ============================================================================

#[derive(Debug)]
pub struct AdminEditor {
    state: EditorState,
    draft: Option<SectionContent>,
    status: Option<SaveStatus>,
    /// The draft replaced an unreadable stored document
    degraded: bool,
}

impl Default for AdminEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminEditor {
    pub fn new() -> Self {
        Self {
            state: EditorState::Unauthenticated,
            draft: None,
            status: None,
            degraded: false,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn principal(&self) -> Option<&Principal> {
        match &self.state {
            EditorState::Authenticated { principal, .. } => Some(principal),
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<SectionId> {
        match &self.state {
            EditorState::Authenticated { selected, .. } => *selected,
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&SectionContent> {
        self.draft.as_ref()
    }

    /// Whether the draft stands in for a stored document that could not be
    /// read. Such drafts are never saved.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Identity is being resolved.
    pub fn begin_auth_check(&mut self) {
        self.state = EditorState::Loading;
    }

    /// Settle the identity check. Signed out clears the session and asks the
    /// caller to send the user to sign-in.
    pub fn on_identity(&mut self, principal: Option<Principal>) -> Result<(), EditorError> {
        match principal {
            None => {
                self.state = EditorState::Unauthenticated;
                self.draft = None;
                self.status = None;
                self.degraded = false;
                Err(EditorError::LoginRequired)
            }
            // Same principal keeps its selection and draft
            Some(principal) => {
                if self.principal() != Some(&principal) {
                    self.draft = None;
                    self.status = None;
                    self.degraded = false;
                    self.state = EditorState::Authenticated { principal, selected: None };
                }
                Ok(())
            }
        }
    }

    fn require_auth(&self) -> Result<(), EditorError> {
        match self.state {
            EditorState::Authenticated { .. } => Ok(()),
            _ => Err(EditorError::LoginRequired),
        }
    }

    /// Load a one-shot copy of the section into the draft, discarding any
    /// unsaved edits and the current status.
    pub fn select_section(
        &mut self,
        store: &DocumentStore,
        id: SectionId,
    ) -> Result<&SectionContent, EditorError> {
        self.require_auth()?;

        let document = store.get(&id.content_path()).unwrap_or_default();
        let (draft, degraded) = match SectionContent::try_from_document(id, &document) {
            Ok(content) => (content, false),
            Err(e) => {
                tracing::warn!("Stored {} document is unreadable, saving disabled: {}", id, e);
                (SectionContent::empty(id), true)
            }
        };

        if let EditorState::Authenticated { selected, .. } = &mut self.state {
            *selected = Some(id);
        }
        self.status = None;
        self.degraded = degraded;
        tracing::debug!("Selected {} for editing", id);

        Ok(self.draft.insert(draft))
    }

    pub fn edit(&mut self, op: EditOp) -> Result<&SectionContent, EditorError> {
        self.require_auth()?;
        let draft = self.draft.as_mut().ok_or(EditorError::NoSectionSelected)?;
        op.apply(draft)?;
        Ok(draft)
    }

    /// Write the draft to `content/{id}`. On failure the draft is kept and the
    /// error status persists.
    pub async fn save(&mut self, store: &DocumentStore, now: Instant) -> Result<(), EditorError> {
        self.require_auth()?;

        let (section, document) = match &self.draft {
            Some(draft) => (draft.id(), draft.to_document()),
            None => {
                self.status = Some(SaveStatus::Error {
                    message: EditorError::NoSectionSelected.to_string(),
                });
                return Err(EditorError::NoSectionSelected);
            }
        };

        if self.degraded {
            let err = EditorError::UnreadableDocument(section);
            self.status = Some(SaveStatus::Error { message: err.to_string() });
            return Err(err);
        }

        match store.set(&section.content_path(), document).await {
            Ok(()) => {
                tracing::info!("Saved {} content", section);
                self.status = Some(SaveStatus::Success {
                    message: success_message(section).to_string(),
                    expires_at: now + SAVE_STATUS_TTL,
                });
                Ok(())
            }
            Err(source) => {
                tracing::warn!("Saving {} failed: {}", section, source);
                self.status = Some(SaveStatus::Error {
                    message: format!("Error saving changes: {}", source),
                });
                Err(EditorError::Save { section, source })
            }
        }
    }

    /// Visible status at `now`; success messages lapse after `SAVE_STATUS_TTL`.
    pub fn save_status(&self, now: Instant) -> Option<&SaveStatus> {
        self.status.as_ref().filter(|s| s.is_visible(now))
    }

    /// Flip a registry entry. Only `sections/{id}` is written; content is
    /// never touched.
    pub async fn toggle_section(
        &self,
        store: &DocumentStore,
        id: &str,
        enabled: bool,
    ) -> Result<Section, EditorError> {
        self.require_auth()?;

        let path = format!("{}/{}", crate::schema::REGISTRY_PATH, id);
        let existing = store.get(&path);
        let known = id.parse::<SectionId>().ok();

        if existing.is_none() && known.is_none() {
            return Err(EditorError::UnknownSection(id.to_string()));
        }

        let name = existing
            .as_ref()
            .and_then(|entry| entry.get("name"))
            .and_then(|name| name.as_str())
            .map(str::to_string)
            .or_else(|| known.map(|k| k.display_name().to_string()))
            .unwrap_or_else(|| id.to_string());

        let section = Section {
            id: id.to_string(),
            name,
            enabled,
        };

        store
            .set(&path, section.to_document())
            .await
            .map_err(|source| EditorError::Registry { id: id.to_string(), source })?;

        tracing::info!("Section {} {}", id, if enabled { "enabled" } else { "disabled" });
        Ok(section)
    }
}

fn success_message(section: SectionId) -> &'static str {
    match section {
        SectionId::Projects => "Projects saved successfully!",
        _ => "Changes saved successfully!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SkillCategory, SkillsContent};
    use serde_json::json;
    use tempdir::TempDir;

    fn owner() -> Principal {
        Principal { id: "owner".into() }
    }

    fn signed_in() -> AdminEditor {
        let mut editor = AdminEditor::new();
        editor.begin_auth_check();
        editor.on_identity(Some(owner())).unwrap();
        editor
    }

    #[test]
    fn test_signed_out_requires_login() {
        let mut editor = AdminEditor::new();
        editor.begin_auth_check();
        assert_eq!(editor.state(), &EditorState::Loading);

        let err = editor.on_identity(None).unwrap_err();
        assert!(matches!(err, EditorError::LoginRequired));
        assert_eq!(editor.state(), &EditorState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_operations_require_authentication() {
        let store = DocumentStore::in_memory();
        let mut editor = AdminEditor::new();

        assert!(matches!(
            editor.select_section(&store, SectionId::Hero),
            Err(EditorError::LoginRequired)
        ));
        assert!(matches!(
            editor.toggle_section(&store, "hero", true).await,
            Err(EditorError::LoginRequired)
        ));
        assert!(store.get("sections").is_none());
    }

    #[tokio::test]
    async fn test_select_loads_draft_and_edits_stay_local() {
        let store = DocumentStore::in_memory();
        store
            .set("content/hero", json!({ "title": "Hi", "subtitle": "Dev" }))
            .await
            .unwrap();

        let mut editor = signed_in();
        editor.select_section(&store, SectionId::Hero).unwrap();
        editor
            .edit(EditOp::Hero(IntroEdit::SetTitle { value: Some("Hello".into()) }))
            .unwrap();

        assert_eq!(editor.selected(), Some(SectionId::Hero));
        assert_eq!(store.get("content/hero/title"), Some(json!("Hi")));

        // Re-selecting discards the unsaved edit
        editor.select_section(&store, SectionId::Hero).unwrap();
        let Some(SectionContent::Hero(hero)) = editor.draft() else { panic!("no hero draft") };
        assert_eq!(hero.title.as_deref(), Some("Hi"));
    }

    #[tokio::test]
    async fn test_save_writes_draft_and_status_expires() {
        let store = DocumentStore::in_memory();
        let mut editor = signed_in();
        editor.select_section(&store, SectionId::Skills).unwrap();
        editor.edit(EditOp::Skills(SkillsEdit::AddCategory)).unwrap();
        editor
            .edit(EditOp::Skills(SkillsEdit::RenameCategory { category: 0, name: "Tools".into() }))
            .unwrap();

        let now = Instant::now();
        editor.save(&store, now).await.unwrap();

        let saved = SectionContent::from_document(
            SectionId::Skills,
            &store.get("content/skills").unwrap(),
        );
        assert_eq!(
            saved,
            SectionContent::Skills(SkillsContent {
                categories: vec![SkillCategory { name: "Tools".into(), skills: vec![] }],
                ..Default::default()
            })
        );

        let status = editor.save_status(now).unwrap();
        assert_eq!(status.message(), "Changes saved successfully!");
        assert!(editor.save_status(now + Duration::from_millis(2900)).is_some());
        assert!(editor.save_status(now + SAVE_STATUS_TTL).is_none());
    }

    #[tokio::test]
    async fn test_projects_save_message() {
        let store = DocumentStore::in_memory();
        let mut editor = signed_in();
        editor.select_section(&store, SectionId::Projects).unwrap();

        let now = Instant::now();
        editor.save(&store, now).await.unwrap();
        assert_eq!(editor.save_status(now).unwrap().message(), "Projects saved successfully!");
    }

    #[tokio::test]
    async fn test_save_without_selection() {
        let store = DocumentStore::in_memory();
        let mut editor = signed_in();

        let err = editor.save(&store, Instant::now()).await.unwrap_err();
        assert!(matches!(err, EditorError::NoSectionSelected));
        assert_eq!(editor.save_status(Instant::now()).unwrap().message(), "No section selected");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_draft_and_error() {
        let dir = TempDir::new("editor").unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = DocumentStore::open(blocker.join("store.json")).unwrap();

        let mut editor = signed_in();
        editor.select_section(&store, SectionId::About).unwrap();
        editor
            .edit(EditOp::About(IntroEdit::SetTitle { value: Some("About me".into()) }))
            .unwrap();

        let now = Instant::now();
        assert!(editor.save(&store, now).await.is_err());

        let status = editor.save_status(now + Duration::from_secs(60)).unwrap();
        assert!(status.is_error());
        let Some(SectionContent::About(about)) = editor.draft() else { panic!("draft lost") };
        assert_eq!(about.title.as_deref(), Some("About me"));
        assert!(store.get("content/about").is_none());
    }

    #[tokio::test]
    async fn test_partly_malformed_contact_survives_save() {
        let store = DocumentStore::in_memory();
        store
            .set(
                "content/contact",
                json!({
                    "title": "Reach Me",
                    "links": [
                        { "type": "email", "link": "mailto:me@example.com", "message": "Email me" },
                        { "type": "linkedin", "link": "in/me", "message": "Connect" }
                    ]
                }),
            )
            .await
            .unwrap();

        let mut editor = signed_in();
        editor.select_section(&store, SectionId::Contact).unwrap();
        assert!(!editor.is_degraded());
        editor
            .edit(EditOp::Contact(ContactEdit::SetDescription { value: Some("hi".into()) }))
            .unwrap();
        editor.save(&store, Instant::now()).await.unwrap();

        let saved = store.get("content/contact").unwrap();
        assert_eq!(saved["title"], "Reach Me");
        assert_eq!(saved["description"], "hi");
        assert_eq!(saved["links"][0]["link"], "mailto:me@example.com");
    }

    #[tokio::test]
    async fn test_unreadable_document_is_never_overwritten() {
        let store = DocumentStore::in_memory();
        store.set("content/about", json!("legacy plain text")).await.unwrap();

        let mut editor = signed_in();
        editor.select_section(&store, SectionId::About).unwrap();
        assert!(editor.is_degraded());
        editor
            .edit(EditOp::About(IntroEdit::SetTitle { value: Some("About".into()) }))
            .unwrap();

        let now = Instant::now();
        let err = editor.save(&store, now).await.unwrap_err();
        assert!(matches!(err, EditorError::UnreadableDocument(SectionId::About)));
        assert!(editor.save_status(now).unwrap().is_error());
        assert_eq!(store.get("content/about"), Some(json!("legacy plain text")));

        // A readable section clears the flag
        editor.select_section(&store, SectionId::Hero).unwrap();
        assert!(!editor.is_degraded());
    }

    #[tokio::test]
    async fn test_toggle_only_touches_registry() {
        let store = DocumentStore::in_memory();
        store
            .set("sections/skills", json!({ "name": "My Skills", "enabled": true }))
            .await
            .unwrap();
        store.set("content/skills", json!({ "title": "Skills" })).await.unwrap();

        let editor = signed_in();
        let section = editor.toggle_section(&store, "skills", false).await.unwrap();

        assert_eq!(section.name, "My Skills");
        assert_eq!(
            store.get("sections/skills"),
            Some(json!({ "name": "My Skills", "enabled": false }))
        );
        assert_eq!(store.get("content/skills"), Some(json!({ "title": "Skills" })));
    }

    #[tokio::test]
    async fn test_toggle_unknown_section() {
        let store = DocumentStore::in_memory();
        let editor = signed_in();
        assert!(matches!(
            editor.toggle_section(&store, "blog", true).await,
            Err(EditorError::UnknownSection(_))
        ));
    }
}
