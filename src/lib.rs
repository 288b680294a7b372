//! Portfolio CMS
//!
//! A single-owner portfolio site backed by a live document store, plus an
//! admin editor for its content.
//!
//! - `store/`: hierarchical JSON document store with path subscriptions
//! - `schema/`: typed section documents and tolerant normalization
//! - `registry`: which sections exist and which are enabled
//! - `render/`: section renderers and the live portfolio view
//! - `editor/`: admin editing session (draft, edits, save, toggles)
//! - `blob`: uploaded images and videos
//! - `identity`: signed-in principal lookup
//! - `seed`: default registry and starter content
//! - `api_server` / `web/` (feature `api`): Axum HTTP surface

pub mod blob;
pub mod config;
pub mod editor;
pub mod identity;
pub mod registry;
pub mod render;
pub mod schema;
pub mod seed;
pub mod store;

#[cfg(feature = "api")]
pub mod api_server;
#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use blob::{BlobError, BlobPath, LocalBlobStore};
pub use config::ServerConfig;
pub use editor::{AdminEditor, EditOp, EditorError, EditorState, SaveStatus};
pub use identity::{IdentityProvider, Principal, StaticTokenIdentity};
pub use registry::{Section, SectionRegistry};
pub use render::{PortfolioView, SectionView};
pub use schema::{SectionContent, SectionId};
pub use store::{subscribe_with, DocumentStore, StoreError, Subscription, SubscriptionHandle};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
