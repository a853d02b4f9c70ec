//! Axum route handlers for the Render API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::filename::FilenameHint;
use crate::layout::{PageBreak, PageItem};
use crate::models::cv::CvData;
use crate::models::style::{StyleSettings, StyleUpdate};
use crate::render::{Template, TemplateInfo};
use crate::state::AppState;
use crate::store::StoredDocument;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub template: Option<String>,
    pub cv: CvData,
    #[serde(default)]
    pub style: Option<StyleSettings>,
    /// Applied in order on top of the effective style.
    #[serde(default)]
    pub style_updates: Vec<StyleUpdate>,
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub svg: String,
    pub items: Vec<PageItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub document_id: Uuid,
    pub template: String,
    pub paginated: bool,
    pub preview: bool,
    pub page_count: usize,
    pub page_breaks: Vec<PageBreak>,
    /// The discovered pages; a continuous document is returned as one page.
    pub pages: Vec<PageBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub document_id: Uuid,
    pub template: String,
    pub paginated: bool,
    pub preview: bool,
    pub page_count: usize,
    pub page_breaks: Vec<PageBreak>,
    pub filename_hint: FilenameHint,
    pub created_at: DateTime<Utc>,
}

impl DocumentSummary {
    fn from_stored(stored: &StoredDocument) -> Self {
        let doc = &stored.document;
        Self {
            document_id: stored.id,
            template: doc.template.clone(),
            paginated: !doc.pages.is_empty(),
            preview: doc.preview,
            page_count: doc.page_count(),
            page_breaks: doc.page_breaks.clone(),
            filename_hint: stored.hint.clone(),
            created_at: stored.created_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared render path
// ────────────────────────────────────────────────────────────────────────────

/// Style updates land on the explicit style, else the CV's embedded style,
/// else the variant default. Rejected updates leave the style unchanged.
fn effective_style(template: &dyn Template, request: &RenderRequest) -> Option<StyleSettings> {
    if request.style_updates.is_empty() {
        return request.style.clone();
    }
    let mut style = request
        .style
        .clone()
        .or_else(|| request.cv.style_settings.clone())
        .unwrap_or_else(|| template.default_style().clone());
    for update in &request.style_updates {
        if !style.apply(update) {
            debug!("Ignored style update {:?}", update);
        }
    }
    Some(style)
}

/// Renders off the async runtime and stores the result. Fields set in `hint`
/// win over those derived from the CV.
pub(crate) async fn render_and_store(
    state: &AppState,
    request: RenderRequest,
    hint: FilenameHint,
) -> Result<Arc<StoredDocument>, AppError> {
    let template = state
        .templates
        .get_or_default(request.template.as_deref())
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Unknown template '{}'",
                request.template.as_deref().unwrap_or_default()
            ))
        })?;

    let style = effective_style(template.as_ref(), &request);
    let hint = hint.or(&FilenameHint::from_cv(&request.cv));
    let RenderRequest { cv, preview, .. } = request;

    let renderer = template.clone();
    let document = tokio::task::spawn_blocking(move || renderer.render(&cv, style.as_ref(), preview))
        .await
        .context("Render task panicked")?;

    let page_count = document.page_count();
    let template_id = document.template.clone();
    let stored = state.documents.insert(document, hint).await;
    info!(
        "Rendered document {} with template {}: {} pages (preview={})",
        stored.id, template_id, page_count, preview
    );
    Ok(stored)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/templates
pub async fn handle_list_templates(State(state): State<AppState>) -> Json<Vec<TemplateInfo>> {
    Json(state.templates.list())
}

/// POST /api/v1/render
///
/// Renders the CV with the requested template and keeps the result for
/// later export.
pub async fn handle_render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    let stored = render_and_store(&state, request, FilenameHint::default()).await?;
    let doc = &stored.document;

    let pages = if doc.pages.is_empty() {
        vec![PageBody {
            index: 0,
            width: doc.root.width,
            height: doc.root.height,
            svg: doc.root.svg.clone(),
            items: Vec::new(),
        }]
    } else {
        doc.pages
            .iter()
            .map(|p| PageBody {
                index: p.index,
                width: p.surface.width,
                height: p.surface.height,
                svg: p.surface.svg.clone(),
                items: p.items.clone(),
            })
            .collect()
    };

    Ok(Json(RenderResponse {
        document_id: stored.id,
        template: doc.template.clone(),
        paginated: !doc.pages.is_empty(),
        preview: doc.preview,
        page_count: doc.page_count(),
        page_breaks: doc.page_breaks.clone(),
        pages,
    }))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentSummary>, AppError> {
    let stored = state
        .documents
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;
    Ok(Json(DocumentSummary::from_stored(&stored)))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
