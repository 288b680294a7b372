//! Live views over the document store.
//!
//! A `SectionView` owns the subscription to one section's content and
//! normalizes each publication once. `PortfolioView` owns the registry
//! subscription and mounts or unmounts section views as sections are
//! enabled or disabled.

use std::collections::BTreeMap;

use crate::registry::SectionRegistry;
use crate::schema::{SectionContent, SectionId, REGISTRY_PATH};
use crate::store::{DocumentStore, Subscription};

use super::render_section;

pub struct SectionView {
    subscription: Subscription,
    content: SectionContent,
}

impl SectionView {
    pub fn mount(store: &DocumentStore, id: SectionId) -> Self {
        let mut subscription = store.subscribe(&id.content_path());
        let content = SectionContent::from_document(id, &subscription.latest());
        tracing::debug!("Mounted {} section", id);
        Self { subscription, content }
    }

    pub fn id(&self) -> SectionId {
        self.content.id()
    }

    /// Pull a pending publication, if any. Returns whether content changed.
    pub fn refresh(&mut self) -> bool {
        if !self.subscription.has_changed() {
            return false;
        }
        let document = self.subscription.latest();
        self.content = SectionContent::from_document(self.id(), &document);
        true
    }

    pub fn content(&self) -> &SectionContent {
        &self.content
    }

    pub fn render(&self) -> String {
        render_section(&self.content)
    }

    pub fn unmount(self) {
        tracing::debug!("Unmounted {} section", self.id());
        self.subscription.unsubscribe();
    }
}

/// The public page: every enabled known section, in page order.
pub struct PortfolioView {
    store: DocumentStore,
    registry_subscription: Subscription,
    registry: SectionRegistry,
    sections: BTreeMap<SectionId, SectionView>,
}

impl PortfolioView {
    pub fn mount(store: &DocumentStore) -> Self {
        let mut registry_subscription = store.subscribe(REGISTRY_PATH);
        let registry = SectionRegistry::from_document(&registry_subscription.latest());

        let mut view = Self {
            store: store.clone(),
            registry_subscription,
            registry,
            sections: BTreeMap::new(),
        };
        view.reconcile();
        view
    }

    /// Apply pending registry and content publications.
    pub fn sync(&mut self) {
        if self.registry_subscription.has_changed() {
            self.registry = SectionRegistry::from_document(&self.registry_subscription.latest());
            self.reconcile();
        }
        for view in self.sections.values_mut() {
            view.refresh();
        }
    }

    fn reconcile(&mut self) {
        let enabled = self.registry.enabled_sections();

        let stale: Vec<SectionId> = self
            .sections
            .keys()
            .filter(|id| !enabled.contains(*id))
            .copied()
            .collect();
        for id in stale {
            if let Some(view) = self.sections.remove(&id) {
                view.unmount();
            }
        }

        for id in enabled {
            if !self.sections.contains_key(&id) {
                self.sections.insert(id, SectionView::mount(&self.store, id));
            }
        }
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    /// Mounted sections in page order.
    pub fn mounted(&self) -> Vec<SectionId> {
        self.sections.keys().copied().collect()
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionView> {
        self.sections.get(&id)
    }

    /// Sync, then render every mounted section.
    pub fn render(&mut self) -> String {
        self.sync();
        self.sections.values().map(SectionView::render).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store_with_registry() -> DocumentStore {
        let store = DocumentStore::in_memory();
        store
            .set(
                "sections",
                json!({
                    "contact": { "name": "Contact", "enabled": true },
                    "hero": { "name": "Hero", "enabled": true },
                    "skills": { "name": "Skills", "enabled": false },
                    "blog": { "name": "Blog", "enabled": true }
                }),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_mounts_enabled_sections_in_page_order() {
        let store = store_with_registry().await;
        let view = PortfolioView::mount(&store);

        assert_eq!(view.mounted(), vec![SectionId::Hero, SectionId::Contact]);
        assert!(view.registry().get("blog").is_some());
    }

    #[tokio::test]
    async fn test_toggle_mounts_and_unmounts() {
        let store = store_with_registry().await;
        let mut view = PortfolioView::mount(&store);
        let baseline = store.listener_count();

        store
            .set("sections/skills", json!({ "name": "Skills", "enabled": true }))
            .await
            .unwrap();
        view.sync();
        assert_eq!(
            view.mounted(),
            vec![SectionId::Hero, SectionId::Skills, SectionId::Contact]
        );
        assert_eq!(store.listener_count(), baseline + 1);

        store
            .set("sections/skills", json!({ "name": "Skills", "enabled": false }))
            .await
            .unwrap();
        view.sync();
        assert_eq!(view.mounted(), vec![SectionId::Hero, SectionId::Contact]);
        assert_eq!(store.listener_count(), baseline);
    }

    #[tokio::test]
    async fn test_content_writes_reach_rendered_page() {
        let store = store_with_registry().await;
        let mut view = PortfolioView::mount(&store);
        assert!(view.render().contains("Welcome to My Portfolio"));

        store
            .set("content/hero", json!({ "title": "Hi, I'm Jane" }))
            .await
            .unwrap();

        let html = view.render();
        assert!(html.contains("Hi, I'm Jane"));
        let hero = html.find("id=\"hero\"").unwrap();
        let contact = html.find("id=\"contact\"").unwrap();
        assert!(hero < contact);
    }

    #[tokio::test]
    async fn test_section_view_refresh() {
        let store = DocumentStore::in_memory();
        let mut view = SectionView::mount(&store, SectionId::About);
        assert!(!view.refresh());

        store.set("content/about/title", json!("Me")).await.unwrap();
        assert!(view.refresh());
        let SectionContent::About(about) = view.content() else { panic!("wrong section") };
        assert_eq!(about.title.as_deref(), Some("Me"));

        view.unmount();
        assert_eq!(store.listener_count(), 0);
    }
}
