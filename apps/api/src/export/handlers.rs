//! Axum route handlers for the Export API.
//!
//! Successful exports answer with the artifact bytes as an attachment;
//! failures answer with the usual `{error}` body.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::filename::FilenameHint;
use crate::export::{ExportArtifact, ExportError, ExportFormat};
use crate::public::{is_valid_slug, PublicError};
use crate::render::handlers::{render_and_store, RenderRequest};
use crate::state::AppState;

const EXPORT_PAGES_HEADER: HeaderName = HeaderName::from_static("x-export-pages");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(flatten)]
    pub render: RenderRequest,
    #[serde(default)]
    pub hint: FilenameHint,
}

fn parse_format(raw: &str) -> Result<ExportFormat, AppError> {
    raw.parse().map_err(AppError::Validation)
}

fn ensure_supported(state: &AppState, format: ExportFormat) -> Result<(), AppError> {
    if format == ExportFormat::Docx && !state.exporter.docx_enabled() {
        return Err(ExportError::ConverterUnavailable.into());
    }
    Ok(())
}

fn artifact_response(artifact: ExportArtifact) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", artifact.filename))
        .context("Derived filename is not a valid header value")?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.format.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
            (EXPORT_PAGES_HEADER, HeaderValue::from(artifact.pages)),
        ],
        artifact.bytes,
    )
        .into_response())
}

async fn export_stored(
    state: &AppState,
    id: Uuid,
    format: ExportFormat,
    hint: &FilenameHint,
) -> Result<Response, AppError> {
    let outcome = state.exporter.export(&state.documents, id, format, hint).await;
    debug!(
        "Export report: {}",
        serde_json::to_string(&outcome.report).unwrap_or_default()
    );
    artifact_response(outcome.result?)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/documents/:id/export/:format
///
/// Body is an optional filename hint; unset fields fall back to the CV.
pub async fn handle_export_document(
    State(state): State<AppState>,
    Path((id, format)): Path<(Uuid, String)>,
    hint: Option<Json<FilenameHint>>,
) -> Result<Response, AppError> {
    let format = parse_format(&format)?;
    ensure_supported(&state, format)?;
    let hint = hint.map(|Json(h)| h).unwrap_or_default();
    export_stored(&state, id, format, &hint).await
}

/// POST /api/v1/export/:format
///
/// Render and export in one call.
pub async fn handle_render_export(
    State(state): State<AppState>,
    Path(format): Path<String>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let format = parse_format(&format)?;
    ensure_supported(&state, format)?;

    let ExportRequest { mut render, hint } = request;
    render.preview = false;
    let stored = render_and_store(&state, render, FilenameHint::default()).await?;
    export_stored(&state, stored.id, format, &hint).await
}

/// GET /api/v1/public/:slug/export/:format
///
/// Fetches a published CV by slug and exports it with its own template.
pub async fn handle_public_export(
    State(state): State<AppState>,
    Path((slug, format)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let format = parse_format(&format)?;
    let source = state
        .cv_source
        .clone()
        .ok_or_else(|| AppError::ServiceUnavailable("Public CV lookup is not configured".to_string()))?;
    if !is_valid_slug(&slug) {
        return Err(AppError::Validation(format!("Invalid slug '{slug}'")));
    }
    ensure_supported(&state, format)?;

    let public = source.fetch(&slug).await.map_err(|e| match e {
        PublicError::NotFound(_) => AppError::NotFound(e.to_string()),
        other => AppError::Upstream(other.to_string()),
    })?;

    let hint = public.filename_hint();
    let template = public.template.filter(|id| {
        let known = state.templates.get(id).is_some();
        if !known {
            warn!("Public CV '{}' names unknown template '{}'; using the default", slug, id);
        }
        known
    });

    let request = RenderRequest {
        template,
        cv: public.cv,
        style: None,
        style_updates: Vec::new(),
        preview: false,
    };
    let stored = render_and_store(&state, request, hint).await?;
    export_stored(&state, stored.id, format, &FilenameHint::default()).await
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::export::raster::fakes::{BlankRasterizer, FailingRasterizer};
    use crate::export::Exporter;
    use crate::models::cv::CvData;
    use crate::public::{CvSource, PublicCv};
    use crate::routes::build_router;

    struct FixedSource;

    #[async_trait]
    impl CvSource for FixedSource {
        async fn fetch(&self, slug: &str) -> Result<PublicCv, PublicError> {
            if slug != "ada" {
                return Err(PublicError::NotFound(slug.to_string()));
            }
            let mut cv = CvData::default();
            cv.personal_info.full_name = "Ada Lovelace".to_string();
            Ok(PublicCv { template: Some("no-such-template".to_string()), cv, title: None, id: Some(5) })
        }
    }

    fn cv() -> Value {
        json!({ "personalInfo": { "fullName": "Ada Lovelace" } })
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn render(state: &AppState, template: &str) -> String {
        let response = build_router(state.clone())
            .oneshot(post("/api/v1/render", json!({ "template": template, "cv": cv() })))
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        body["documentId"].as_str().unwrap().to_string()
    }

    fn header<'a>(response: &'a Response, name: &str) -> &'a str {
        response.headers().get(name).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_export_stored_document_as_pdf() {
        let state = AppState::for_tests();
        let id = render(&state, "classic").await;

        let response = build_router(state)
            .oneshot(post(&format!("/api/v1/documents/{id}/export/pdf"), json!({ "title": "My Resume!!", "resourceId": 42 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-type"), "application/pdf");
        assert_eq!(header(&response, "content-disposition"), "attachment; filename=\"my-resume-42.pdf\"");
        assert_eq!(header(&response, "x-export-pages"), "1");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_without_body_uses_cv_name() {
        let state = AppState::for_tests();
        let id = render(&state, "web").await;
        let response = build_router(state)
            .oneshot(Request::post(format!("/api/v1/documents/{id}/export/png")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-disposition"), "attachment; filename=\"ada-lovelace.png\"");
    }

    #[tokio::test]
    async fn test_unknown_format_and_missing_document() {
        let state = AppState::for_tests();
        let id = render(&state, "classic").await;

        let response = build_router(state.clone())
            .oneshot(Request::post(format!("/api/v1/documents/{id}/export/tiff")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = build_router(state)
            .oneshot(Request::post(format!("/api/v1/documents/{}/export/pdf", Uuid::new_v4())).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_docx_without_converter_is_unavailable() {
        let response = build_router(AppState::for_tests())
            .oneshot(post("/api/v1/export/docx", json!({ "cv": cv() })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_render_export_in_one_call() {
        let response = build_router(AppState::for_tests())
            .oneshot(post("/api/v1/export/pdf", json!({ "template": "modern", "cv": cv(), "hint": { "resourceId": 8 } })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-disposition"), "attachment; filename=\"ada-lovelace-8.pdf\"");
    }

    #[tokio::test]
    async fn test_rasterization_failure_is_reported() {
        let state = AppState::with_exporter(Exporter::new(Arc::new(FailingRasterizer), None, 1.0), None);
        let response = build_router(state)
            .oneshot(post("/api/v1/export/png", json!({ "cv": cv() })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "RASTERIZATION_FAILED");
    }

    #[tokio::test]
    async fn test_public_export() {
        let state = AppState::with_exporter(
            Exporter::new(Arc::new(BlankRasterizer), None, 1.0),
            Some(Arc::new(FixedSource)),
        );

        let response = build_router(state.clone())
            .oneshot(Request::get("/api/v1/public/ada/export/pdf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header(&response, "content-disposition"), "attachment; filename=\"ada-lovelace-5.pdf\"");

        let response = build_router(state)
            .oneshot(Request::get("/api/v1/public/bob/export/pdf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_export_requires_lookup_service() {
        let response = build_router(AppState::for_tests())
            .oneshot(Request::get("/api/v1/public/ada/export/pdf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
