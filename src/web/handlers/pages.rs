// Page handlers for HTML rendering with Askama
//
// Form posts from the admin dashboard answer htmx requests with a fragment
// and plain browser posts with a redirect back to the dashboard.

use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_htmx::HxRequest;
use serde::Deserialize;
use std::sync::PoisonError;
use std::time::Instant;

use crate::api_server::{parse_section, AppError, AppState, ADMIN_COOKIE};
use crate::blob::BlobPath;
use crate::editor::{AdminEditor, EditorError, SaveStatus};
use crate::registry::Section;
use crate::render::{html_escape, render_section};
use crate::schema::{SectionContent, SectionId};
use crate::web::forms::{edit_from_form, upload_target};

/// Editor forms post an edit and swap the returned panel in place.
const FORM_ATTRS: &str = "method=\"post\" action=\"/admin/edit\" \
    hx-post=\"/admin/edit\" hx-target=\"#editor-panel\" hx-swap=\"outerHTML\"";

const UPLOAD_ATTRS: &str = "method=\"post\" action=\"/admin/upload\" enctype=\"multipart/form-data\" \
    hx-post=\"/admin/upload\" hx-encoding=\"multipart/form-data\" \
    hx-target=\"#editor-panel\" hx-swap=\"outerHTML\"";

pub struct NavItem {
    pub id: String,
    pub name: String,
    pub active: bool,
}

fn render_page<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        format!("Template error: {}", e)
    }))
}

// ============================================================================
// Portfolio Page
// ============================================================================

/// A mounted section and its current markup. On the page each one follows
/// its content path over SSE and reloads itself from `/sections/{id}`.
pub struct LiveSection {
    pub id: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "pages/portfolio.html")]
pub struct PortfolioTemplate {
    pub title: String,
    pub nav: Vec<NavItem>,
    pub sections: Vec<LiveSection>,
    pub oob: bool,
}

/// Section list swapped into the page when the registry publishes. The nav
/// rides along as an out-of-band swap.
#[derive(Template)]
#[template(path = "pages/sections.html")]
pub struct SectionsTemplate {
    pub nav: Vec<NavItem>,
    pub sections: Vec<LiveSection>,
    pub oob: bool,
}

fn live_sections(state: &AppState) -> (Vec<NavItem>, Vec<LiveSection>) {
    let mut view = state.portfolio.lock().unwrap_or_else(PoisonError::into_inner);
    view.sync();

    let mut nav = Vec::new();
    let mut sections = Vec::new();
    for id in view.mounted() {
        let Some(section) = view.section(id) else { continue };
        nav.push(NavItem {
            id: id.as_str().to_string(),
            name: view
                .registry()
                .get(id.as_str())
                .map(|s| s.name.clone())
                .unwrap_or_else(|| id.display_name().to_string()),
            active: false,
        });
        sections.push(LiveSection {
            id: id.as_str().to_string(),
            html: section.render(),
        });
    }
    (nav, sections)
}

pub async fn portfolio_page(State(state): State<AppState>) -> impl IntoResponse {
    let (nav, sections) = live_sections(&state);

    render_page(&PortfolioTemplate {
        title: "Portfolio".to_string(),
        nav,
        sections,
        oob: false,
    })
}

pub async fn sections_fragment(State(state): State<AppState>) -> impl IntoResponse {
    let (nav, sections) = live_sections(&state);
    render_page(&SectionsTemplate { nav, sections, oob: true })
}

/// One section's current markup, fetched when its content publishes.
pub async fn section_fragment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_section(&id)?;

    let mut view = state.portfolio.lock().unwrap_or_else(PoisonError::into_inner);
    view.sync();
    view.section(id)
        .map(|section| Html(section.render()))
        .ok_or_else(|| AppError::NotFound(format!("Section {} is not enabled", id)))
}

// ============================================================================
// Login
// ============================================================================

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub token: String,
}

pub async fn login_page() -> impl IntoResponse {
    render_page(&LoginTemplate { error: None })
}

/// Exchange the admin token for a session cookie.
pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.identity.principal(Some(&form.token)) {
        Some(principal) => {
            tracing::info!("Admin sign-in for {}", principal.id);
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Strict",
                ADMIN_COOKIE,
                form.token.trim()
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to("/admin")).into_response()
        }
        None => {
            tracing::warn!("Rejected admin sign-in");
            let page = render_page(&LoginTemplate {
                error: Some("Invalid admin token".to_string()),
            });
            (StatusCode::UNAUTHORIZED, page).into_response()
        }
    }
}

// ============================================================================
// Admin Dashboard
// ============================================================================

#[derive(Template)]
#[template(path = "pages/admin.html")]
pub struct AdminTemplate {
    pub principal: String,
    pub sections: Vec<Section>,
    pub editable: Vec<NavItem>,
    pub panel_html: String,
}

/// Forms for the selected draft beside its live preview. Every form answers
/// with a fresh panel.
#[derive(Template)]
#[template(path = "pages/editor_panel.html")]
pub struct EditorPanelTemplate {
    pub section: String,
    pub section_name: String,
    pub draft: SectionContent,
    pub contact_email: String,
    pub contact_phone: String,
    pub contact_location: String,
    pub preview_html: String,
    pub status_html: String,
    pub notice: Option<String>,
    pub degraded: bool,
    pub form_attrs: &'static str,
    pub upload_attrs: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub section: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub enabled: bool,
}

/// Open the caller's editor, or send them to sign-in.
async fn editor_or_login(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<tokio::sync::OwnedMutexGuard<AdminEditor>, Response> {
    match state.open_editor(headers).await {
        Ok(editor) => Ok(editor),
        Err(AppError::Unauthorized(_)) => {
            Err(Redirect::to(&state.config.login_url).into_response())
        }
        Err(e) => Err(e.into_response()),
    }
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let mut editor = match editor_or_login(&state, &headers).await {
        Ok(editor) => editor,
        Err(response) => return response,
    };

    if let Some(section) = query.section {
        let selected = parse_section(&section)
            .and_then(|id| editor.select_section(&state.store, id).map(|_| ()).map_err(AppError::from));
        if let Err(e) = selected {
            return e.into_response();
        }
    }

    let template = AdminTemplate {
        principal: editor.principal().map(|p| p.id.clone()).unwrap_or_default(),
        sections: state.registry().entries().to_vec(),
        editable: SectionId::ALL
            .into_iter()
            .map(|id| NavItem {
                id: id.as_str().to_string(),
                name: id.display_name().to_string(),
                active: editor.selected() == Some(id),
            })
            .collect(),
        panel_html: editor_panel(&editor, None),
    };

    render_page(&template).into_response()
}

pub async fn toggle_section_form(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Response {
    let editor = match editor_or_login(&state, &headers).await {
        Ok(editor) => editor,
        Err(response) => return response,
    };

    match editor.toggle_section(&state.store, &id, form.enabled).await {
        Ok(section) if is_htmx => Html(section_row(&section)).into_response(),
        Ok(_) => Redirect::to("/admin").into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

pub async fn save_form(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    headers: HeaderMap,
) -> Response {
    let mut editor = match editor_or_login(&state, &headers).await {
        Ok(editor) => editor,
        Err(response) => return response,
    };

    let now = Instant::now();
    if editor.save(&state.store, now).await.is_ok() {
        if let Some(id) = editor.selected() {
            state.invalidate_content(id).await;
        }
    }

    // Failures are reported through the save status
    if is_htmx {
        Html(status_fragment(editor.save_status(now))).into_response()
    } else {
        Redirect::to("/admin").into_response()
    }
}

/// Apply one editor form to the caller's draft.
pub async fn edit_form(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let mut editor = match editor_or_login(&state, &headers).await {
        Ok(editor) => editor,
        Err(response) => return response,
    };

    let notice = apply_form_edit(&mut editor, fields).err();
    panel_response(&editor, is_htmx, notice)
}

/// Store an uploaded file, then apply the form's edit with the file's URL.
/// The upload runs before the editor is locked.
pub async fn upload_form(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if state.principal(&headers).is_none() {
        return Redirect::to(&state.config.login_url).into_response();
    }

    let received = receive_upload(&state, multipart).await;

    let mut editor = match editor_or_login(&state, &headers).await {
        Ok(editor) => editor,
        Err(response) => return response,
    };

    let notice = match received {
        Ok(fields) => apply_form_edit(&mut editor, fields).err(),
        Err(notice) => {
            tracing::warn!("Rejected upload: {}", notice);
            Some(notice)
        }
    };
    panel_response(&editor, is_htmx, notice)
}

/// Read the upload form, store its file, and return the remaining fields
/// with the file's URL under the edit's target field.
async fn receive_upload(state: &AppState, mut multipart: Multipart) -> Result<Vec<(String, String)>, String> {
    let mut fields = Vec::new();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| e.to_string())?;
            file = Some((filename, bytes));
        } else {
            let value = field.text().await.map_err(|e| e.to_string())?;
            fields.push((name, value));
        }
    }

    let (filename, bytes) = file.ok_or_else(|| "no file was uploaded".to_string())?;

    let mut kind = None;
    let mut section = None;
    fields.retain(|(name, value)| match name.as_str() {
        "kind" => {
            kind = Some(value.clone());
            false
        }
        "section" => {
            section = Some(value.clone());
            false
        }
        _ => true,
    });

    let kind = kind.ok_or_else(|| "upload form has no kind".to_string())?;
    let path = BlobPath::from_parts(&kind, section.as_deref(), &filename).map_err(|e| e.to_string())?;
    let url = state.blobs.upload(&path, &bytes).await.map_err(|e| {
        tracing::warn!("Upload of {} failed: {}", path, e);
        e.to_string()
    })?;
    tracing::debug!("Stored {} ({} bytes)", path, bytes.len());

    let op = fields
        .iter()
        .find(|(name, _)| name == "op")
        .map(|(_, op)| op.as_str())
        .unwrap_or_default();
    fields.push((upload_target(op).to_string(), url));
    Ok(fields)
}

/// Rejections come back as the message shown above the forms.
fn apply_form_edit(editor: &mut AdminEditor, fields: Vec<(String, String)>) -> Result<(), String> {
    let draft = editor
        .draft()
        .ok_or_else(|| EditorError::NoSectionSelected.to_string())?;
    let result = edit_from_form(draft, fields)
        .map_err(|e| e.to_string())
        .and_then(|op| editor.edit(op).map(|_| ()).map_err(|e| e.to_string()));

    if let Err(notice) = &result {
        tracing::warn!("Rejected draft edit: {}", notice);
    }
    result
}

fn panel_response(editor: &AdminEditor, is_htmx: bool, notice: Option<String>) -> Response {
    if is_htmx {
        return Html(editor_panel(editor, notice)).into_response();
    }

    match (notice, editor.selected()) {
        (Some(notice), _) => AppError::BadRequest(notice).into_response(),
        (None, Some(id)) => Redirect::to(&format!("/admin?section={}", id.as_str())).into_response(),
        (None, None) => Redirect::to("/admin").into_response(),
    }
}

// ============================================================================
// Fragments
// ============================================================================

/// Registry table row, swapped in place after a toggle.
pub fn section_row(section: &Section) -> String {
    let id = html_escape(&section.id);
    let (state, action, next) = if section.enabled {
        ("Enabled", "Disable", "false")
    } else {
        ("Disabled", "Enable", "true")
    };

    format!(
        "<tr id=\"section-row-{id}\">\
         <td>{name}</td><td class=\"state\">{state}</td>\
         <td><form method=\"post\" action=\"/admin/sections/{id}/toggle\" \
         hx-post=\"/admin/sections/{id}/toggle\" hx-target=\"#section-row-{id}\" hx-swap=\"outerHTML\">\
         <input type=\"hidden\" name=\"enabled\" value=\"{next}\">\
         <button type=\"submit\">{action}</button></form></td></tr>",
        id = id,
        name = html_escape(&section.name),
        state = state,
        next = next,
        action = action,
    )
}

/// The editor panel for the selected draft, or a prompt to pick one.
pub fn editor_panel(editor: &AdminEditor, notice: Option<String>) -> String {
    let (Some(id), Some(draft)) = (editor.selected(), editor.draft()) else {
        return "<div id=\"editor-panel\"><p>Select a section to edit.</p></div>".to_string();
    };

    let details = match draft {
        SectionContent::Contact(contact) => contact.contact.clone().unwrap_or_default(),
        _ => Default::default(),
    };

    let template = EditorPanelTemplate {
        section: id.as_str().to_string(),
        section_name: id.display_name().to_string(),
        draft: draft.clone(),
        contact_email: details.email.unwrap_or_default(),
        contact_phone: details.phone.unwrap_or_default(),
        contact_location: details.location.unwrap_or_default(),
        preview_html: render_section(draft),
        status_html: status_fragment(editor.save_status(Instant::now())),
        notice,
        degraded: editor.is_degraded(),
        form_attrs: FORM_ATTRS,
        upload_attrs: UPLOAD_ATTRS,
    };
    render_page(&template).0
}

pub fn status_fragment(status: Option<&SaveStatus>) -> String {
    match status {
        Some(status) => {
            let class = if status.is_error() { "status error" } else { "status success" };
            format!(
                "<div id=\"save-status\" class=\"{}\" role=\"status\">{}</div>",
                class,
                html_escape(status.message())
            )
        }
        None => "<div id=\"save-status\" role=\"status\"></div>".to_string(),
    }
}
