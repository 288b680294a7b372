// Axum API Server Module
//
// Purpose: Public portfolio pages, JSON content API, live updates (SSE), and the
// admin editing API over the document store.
// HTML page handlers live in web::handlers::pages.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
    routing::{get, post, put},
    Router,
};
use futures::Stream;
use moka::future::Cache;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::blob::{BlobError, BlobPath, LocalBlobStore};
use crate::config::ServerConfig;
use crate::editor::{AdminEditor, EditOp, EditorError};
use crate::identity::{IdentityProvider, Principal, StaticTokenIdentity};
use crate::registry::SectionRegistry;
use crate::render::PortfolioView;
use crate::schema::{SectionContent, SectionId, REGISTRY_PATH};
use crate::seed;
use crate::store::{DocumentStore, StoreError};
use crate::web::handlers::pages;

/// Cookie carrying the admin token for browser sessions.
pub const ADMIN_COOKIE: &str = "admin_token";

/// Uploads may carry videos.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// Application State
// ============================================================================

type EditorSessions = FxHashMap<String, Arc<AsyncMutex<AdminEditor>>>;

#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub blobs: LocalBlobStore,
    pub identity: Arc<dyn IdentityProvider>,
    /// Public page view; mounts section subscriptions per the registry
    pub portfolio: Arc<Mutex<PortfolioView>>,
    /// One editor session per principal
    pub editors: Arc<Mutex<EditorSessions>>,
    pub cache: Cache<String, Value>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Opening document store at {}...", config.snapshot_path().display());
        tokio::fs::create_dir_all(&config.data_dir).await?;
        let store = DocumentStore::open(config.snapshot_path())?;

        if config.seed_on_empty && store.get(REGISTRY_PATH).is_none() {
            tracing::info!("No section registry found, seeding default content...");
            seed::initialize(&store).await?;
        }

        tracing::info!("Preparing media directory {}...", config.media_dir.display());
        tokio::fs::create_dir_all(&config.media_dir).await?;
        let blobs = LocalBlobStore::new(&config.media_dir, config.public_media_url.clone());

        let identity: Arc<dyn IdentityProvider> =
            Arc::new(StaticTokenIdentity::new(config.admin_token.clone(), "admin"));

        tracing::info!("Mounting portfolio view...");
        let portfolio = PortfolioView::mount(&store);
        tracing::info!("Mounted sections: {:?}", portfolio.mounted());

        tracing::info!("Initializing Moka cache...");
        let cache = Cache::builder()
            .max_capacity(10_000) // 10K entries
            .time_to_live(Duration::from_secs(300)) // 5 min TTL
            .build();

        Ok(Self {
            store,
            blobs,
            identity,
            portfolio: Arc::new(Mutex::new(portfolio)),
            editors: Arc::new(Mutex::new(FxHashMap::default())),
            cache,
            config: Arc::new(config),
        })
    }

    /// Principal for the request's bearer token or admin cookie.
    pub fn principal(&self, headers: &HeaderMap) -> Option<Principal> {
        self.identity.principal(credentials(headers).as_deref())
    }

    /// The caller's editor session, with identity settled.
    pub(crate) async fn open_editor(
        &self,
        headers: &HeaderMap,
    ) -> Result<OwnedMutexGuard<AdminEditor>, AppError> {
        let principal = self.principal(headers);

        let session = match &principal {
            Some(principal) => {
                let mut editors = self.editors.lock().unwrap_or_else(PoisonError::into_inner);
                editors
                    .entry(principal.id.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(AdminEditor::new())))
                    .clone()
            }
            None => return Err(EditorError::LoginRequired.into()),
        };

        let mut editor = session.lock_owned().await;
        if editor.principal().is_none() {
            editor.begin_auth_check();
        }
        editor.on_identity(principal)?;
        Ok(editor)
    }

    pub(crate) fn registry(&self) -> SectionRegistry {
        SectionRegistry::from_document(&self.store.get(REGISTRY_PATH).unwrap_or_default())
    }

    pub(crate) async fn invalidate_content(&self, id: SectionId) {
        self.cache.invalidate(&content_cache_key(id)).await;
    }
}

/// `Authorization: Bearer <token>`, falling back to the admin cookie.
fn credentials(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(ADMIN_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
}

fn content_cache_key(id: SectionId) -> String {
    format!("content:{}", id)
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_dir);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Public pages (HTML)
        .route("/", get(pages::portfolio_page))
        .route("/sections", get(pages::sections_fragment))
        .route("/sections/:id", get(pages::section_fragment))
        .route("/login", get(pages::login_page).post(pages::login_submit))

        // Admin dashboard (HTML + htmx fragments)
        .route("/admin", get(pages::admin_dashboard))
        .route("/admin/sections/:id/toggle", post(pages::toggle_section_form))
        .route("/admin/save", post(pages::save_form))
        .route("/admin/edit", post(pages::edit_form))
        .route(
            "/admin/upload",
            post(pages::upload_form).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )

        // Public content endpoints (JSON)
        .route("/api/sections", get(list_sections))
        .route("/api/content/:id", get(get_content))
        .route("/api/live/*path", get(live_updates))

        // Admin endpoints (JSON)
        .route("/api/admin/seed", post(seed_store))
        .route("/api/admin/sections/:id", put(set_section_enabled))
        .route("/api/admin/select/:id", post(select_section))
        .route("/api/admin/draft", get(get_draft))
        .route("/api/admin/edit", post(edit_draft))
        .route("/api/admin/save", post(save_draft))
        .route(
            "/api/admin/uploads",
            put(upload_asset).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )

        // Uploaded media
        .nest_service("/media", media)

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Public Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_sections(State(state): State<AppState>) -> Json<Value> {
    let registry = state.registry();
    Json(json!({
        "sections": registry.entries(),
        "enabled": registry.enabled_sections(),
    }))
}

async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_section(&id)?;
    let cache_key = content_cache_key(id);

    // Check cache
    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for {}", cache_key);
        return Ok(Json(cached));
    }

    let document = state.store.get(&id.content_path()).unwrap_or_default();
    let content = SectionContent::from_document(id, &document);
    let result = serde_json::to_value(&content)
        .map_err(|e| AppError::Internal(format!("Failed to encode {}: {}", id, e)))?;

    state.cache.insert(cache_key, result.clone()).await;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct LiveParams {
    /// SSE event name; pages watching several paths tell them apart by it
    event: Option<String>,
}

/// One event with the current value, then one per publication. Events are
/// named `document` unless `?event=` names them otherwise.
async fn live_updates(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<LiveParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.store.subscribe(&path);
    let event = live_event_name(params.event);
    tracing::debug!("Live subscriber on /{} ({})", subscription.path(), event);

    let stream = async_stream::stream! {
        let current = subscription.latest();
        yield Ok::<_, Infallible>(Event::default().event(&event).data(current.to_string()));

        while subscription.changed().await.is_ok() {
            let document = subscription.latest();
            yield Ok::<_, Infallible>(Event::default().event(&event).data(document.to_string()));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn live_event_name(requested: Option<String>) -> String {
    requested
        .filter(|name| {
            !name.is_empty()
                && name.len() <= 32
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
        .unwrap_or_else(|| "document".to_string())
}

// ============================================================================
// Admin Endpoint Handlers
// ============================================================================

async fn seed_store(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    state
        .principal(&headers)
        .ok_or_else(|| AppError::Unauthorized("sign-in required".to_string()))?;

    seed::initialize(&state.store).await?;
    state.cache.invalidate_all();

    Ok(Json(json!({ "status": "initialized" })))
}

#[derive(Debug, Deserialize)]
struct EnabledBody {
    enabled: bool,
}

async fn set_section_enabled(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<EnabledBody>,
) -> Result<Json<Value>, AppError> {
    let editor = state.open_editor(&headers).await?;
    let section = editor.toggle_section(&state.store, &id, body.enabled).await?;
    Ok(Json(json!({ "section": section })))
}

async fn select_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_section(&id)?;
    let mut editor = state.open_editor(&headers).await?;
    editor.select_section(&state.store, id)?;
    Ok(Json(draft_body(&editor)))
}

async fn get_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let editor = state.open_editor(&headers).await?;
    Ok(Json(draft_body(&editor)))
}

async fn edit_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(op): Json<EditOp>,
) -> Result<Json<Value>, AppError> {
    let mut editor = state.open_editor(&headers).await?;
    editor.edit(op)?;
    Ok(Json(draft_body(&editor)))
}

async fn save_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let mut editor = state.open_editor(&headers).await?;
    editor.save(&state.store, Instant::now()).await?;
    if let Some(id) = editor.selected() {
        state.invalidate_content(id).await;
    }
    Ok(Json(draft_body(&editor)))
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    kind: String,
    filename: String,
    section: Option<String>,
}

/// Store the request body as a blob. Runs outside the editor lock; the
/// returned URL enters a draft through a later edit.
async fn upload_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    state
        .principal(&headers)
        .ok_or_else(|| AppError::Unauthorized("sign-in required".to_string()))?;

    let path = BlobPath::from_parts(&params.kind, params.section.as_deref(), &params.filename)?;
    let url = state.blobs.upload(&path, &body).await.map_err(|e| {
        tracing::warn!("Upload of {} failed: {}", path, e);
        AppError::from(e)
    })?;

    Ok(Json(json!({
        "url": url,
        "path": path.to_string(),
        "bytes": body.len(),
    })))
}

pub(crate) fn draft_body(editor: &AdminEditor) -> Value {
    json!({
        "principal": editor.principal().map(|p| p.id.clone()),
        "selected": editor.selected(),
        "draft": editor.draft(),
        "status": editor.save_status(Instant::now()),
        "degraded": editor.is_degraded(),
    })
}

pub(crate) fn parse_section(id: &str) -> Result<SectionId, AppError> {
    id.parse::<SectionId>()
        .map_err(|e| AppError::NotFound(e.to_string()))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<EditorError> for AppError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::LoginRequired => AppError::Unauthorized(err.to_string()),
            EditorError::NoSectionSelected | EditorError::UnreadableDocument(_) => {
                AppError::Conflict(err.to_string())
            }
            EditorError::UnknownSection(_) => AppError::NotFound(err.to_string()),
            EditorError::Edit(_) => AppError::BadRequest(err.to_string()),
            EditorError::Save { .. } | EditorError::Registry { .. } => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidPath(_) => AppError::BadRequest(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::Io { .. } => AppError::Internal(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_credentials_from_bearer_or_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(credentials(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; admin_token=abc123"));
        assert_eq!(credentials(&headers).as_deref(), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(credentials(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_live_event_name() {
        assert_eq!(live_event_name(None), "document");
        assert_eq!(live_event_name(Some("registry".into())), "registry");
        assert_eq!(live_event_name(Some("bad\nname".into())), "document");
        assert_eq!(live_event_name(Some(String::new())), "document");
    }

    #[test]
    fn test_error_status_codes() {
        let response = AppError::from(EditorError::LoginRequired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::from(EditorError::NoSectionSelected).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::from(BlobError::UnknownKind("pdf".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
