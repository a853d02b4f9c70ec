//! Export pipeline: rendered document → downloadable artifact.
//!
//! PDF and PNG rasterize the document's pages one after another and hand
//! each bitmap to the encoder before the next page is rasterized; a document
//! without pages is rasterized once from its root surface. DOCX sends the
//! markup rendition to a remote converter. Every attempt yields an
//! [`ExportReport`], success or not.
pub mod docx;
pub mod filename;
pub mod handlers;
pub mod images;
pub mod pdf;
pub mod png;
pub mod raster;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use resvg::tiny_skia::Pixmap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::render::{RenderedDocument, Surface};
use crate::store::DocumentStore;

use docx::DocxConverter;
use filename::{derive_filename, FilenameHint};
use images::{ImageFetcher, ImageSet};
use raster::Rasterizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Png,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Png => "PNG",
            ExportFormat::Docx => "DOCX",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(format!("unsupported export format '{other}'")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Document {0} not found")]
    MissingRenderTarget(Uuid),

    #[error("{format} export failed: {message}")]
    Rasterization { format: ExportFormat, message: String },

    #[error("{0}")]
    RemoteConversion(String),

    #[error("DOCX export is not configured")]
    ConverterUnavailable,

    #[error("Encoding error: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub filename: String,
    pub bytes: Bytes,
    pub pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Success,
    Failure,
}

/// What happened during one export attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub document_id: Uuid,
    pub format: ExportFormat,
    pub status: ExportStatus,
    pub filename: Option<String>,
    pub pages: usize,
    pub bytes: usize,
    pub message: Option<String>,
}

pub struct ExportOutcome {
    pub report: ExportReport,
    pub result: Result<ExportArtifact, ExportError>,
}

// ────────────────────────────────────────────────────────────────────────────
// Per-document serialization
// ────────────────────────────────────────────────────────────────────────────

/// One async mutex per document id. Idle entries are pruned on acquire.
#[derive(Clone, Default)]
pub struct ExportLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ExportLocks {
    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Documents with an export running or waiting.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Exporter
// ────────────────────────────────────────────────────────────────────────────

pub struct Exporter {
    rasterizer: Arc<dyn Rasterizer>,
    docx: Option<Arc<dyn DocxConverter>>,
    /// Without one, remote images render empty.
    images: Option<ImageFetcher>,
    scale: f32,
    locks: ExportLocks,
}

impl Exporter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, docx: Option<Arc<dyn DocxConverter>>, scale: f32) -> Self {
        Self {
            rasterizer,
            docx,
            images: None,
            scale,
            locks: ExportLocks::default(),
        }
    }

    pub fn with_image_fetcher(mut self, fetcher: ImageFetcher) -> Self {
        self.images = Some(fetcher);
        self
    }

    pub fn docx_enabled(&self) -> bool {
        self.docx.is_some()
    }

    pub fn active_exports(&self) -> usize {
        self.locks.active()
    }

    /// Exports document `id` as `format`. Exports of the same document run
    /// one at a time. Never panics on a missing document; the outcome carries
    /// the error instead.
    pub async fn export(
        &self,
        store: &DocumentStore,
        id: Uuid,
        format: ExportFormat,
        hint: &FilenameHint,
    ) -> ExportOutcome {
        let _guard = self.locks.acquire(id).await;
        let result = self.run(store, id, format, hint).await;

        let report = match &result {
            Ok(artifact) => {
                info!(
                    "Exported document {} as {}: {} pages, {} bytes, filename={}",
                    id,
                    format,
                    artifact.pages,
                    artifact.bytes.len(),
                    artifact.filename
                );
                ExportReport {
                    document_id: id,
                    format,
                    status: ExportStatus::Success,
                    filename: Some(artifact.filename.clone()),
                    pages: artifact.pages,
                    bytes: artifact.bytes.len(),
                    message: None,
                }
            }
            Err(e) => {
                warn!("Export of document {} as {} failed: {}", id, format, e);
                ExportReport {
                    document_id: id,
                    format,
                    status: ExportStatus::Failure,
                    filename: None,
                    pages: 0,
                    bytes: 0,
                    message: Some(e.to_string()),
                }
            }
        };

        ExportOutcome { report, result }
    }

    async fn run(
        &self,
        store: &DocumentStore,
        id: Uuid,
        format: ExportFormat,
        hint: &FilenameHint,
    ) -> Result<ExportArtifact, ExportError> {
        let stored = store
            .get(id)
            .await
            .ok_or(ExportError::MissingRenderTarget(id))?;
        let filename = derive_filename(&hint.clone().or(&stored.hint), format);
        let document = &stored.document;

        let bytes = match format {
            ExportFormat::Pdf => {
                let fit = if document.pages.is_empty() { pdf::PageFit::Flow } else { pdf::PageFit::A4 };
                let mut writer = pdf::PdfWriter::new(fit);
                self.rasterize_each(document, format, |bitmap| writer.push(&bitmap)).await?;
                writer.finish()?
            }
            ExportFormat::Png if document.pages.is_empty() => {
                let mut root = None;
                self.rasterize_each(document, format, |bitmap| {
                    root = Some(bitmap);
                    Ok(())
                })
                .await?;
                let root = root.ok_or_else(|| ExportError::Encoding("root surface produced no bitmap".to_string()))?;
                png::encode(&root)?
            }
            ExportFormat::Png => {
                let sizes: Vec<(u32, u32)> = surfaces(document).iter().map(|s| (s.width, s.height)).collect();
                let mut stitcher = png::Stitcher::new(png::plan_stitch(&sizes, self.scale))?;
                self.rasterize_each(document, format, |bitmap| stitcher.push(&bitmap)).await?;
                stitcher.finish()?
            }
            ExportFormat::Docx => {
                let converter = self.docx.as_ref().ok_or(ExportError::ConverterUnavailable)?;
                converter
                    .convert(&document.markup, &filename)
                    .await
                    .map_err(|e| ExportError::RemoteConversion(e.user_message()))?
                    .to_vec()
            }
        };

        Ok(ExportArtifact {
            format,
            filename,
            bytes: Bytes::from(bytes),
            pages: document.page_count(),
        })
    }

    /// Rasterizes pages in source order and passes each bitmap to `sink`,
    /// which consumes it before the next page is rasterized. The first
    /// failure aborts the export.
    async fn rasterize_each<F>(&self, document: &RenderedDocument, format: ExportFormat, mut sink: F) -> Result<(), ExportError>
    where
        F: FnMut(Pixmap) -> Result<(), ExportError> + Send,
    {
        let surfaces = surfaces(document);
        let images = self.prefetch_images(&surfaces).await;
        let total = surfaces.len();
        for (index, surface) in surfaces.into_iter().enumerate() {
            debug!("Rasterizing page {}/{} for {}", index + 1, total, format);
            let bitmap = self
                .rasterizer
                .rasterize(surface, self.scale, &images)
                .await
                .map_err(|e| ExportError::Rasterization {
                    format,
                    message: format!("could not render page {} of {}: {}", index + 1, total, e),
                })?;
            sink(bitmap)?;
        }
        Ok(())
    }

    async fn prefetch_images(&self, surfaces: &[&Surface]) -> ImageSet {
        let Some(fetcher) = &self.images else {
            return ImageSet::default();
        };
        let images = fetcher.prefetch(surfaces.iter().map(|s| s.svg.as_str())).await;
        if !images.is_empty() {
            debug!("Prefetched {} images", images.len());
        }
        images
    }
}

/// The page surfaces, or the root when there are none.
fn surfaces(document: &RenderedDocument) -> Vec<&Surface> {
    if document.pages.is_empty() {
        vec![&document.root]
    } else {
        document.pages.iter().map(|p| &p.surface).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use std::time::Duration;

    use axum::routing::get;
    use axum::Router;
    use resvg::tiny_skia::Color;

    use super::docx::DocxError;
    use super::raster::fakes::{BlankRasterizer, FailingRasterizer, RecordingRasterizer};
    use super::raster::ResvgRasterizer;
    use super::*;
    use crate::render::PageSurface;

    const W: u32 = 20;
    const H: u32 = 28;

    fn surface(height: u32) -> Surface {
        Surface { width: W, height, svg: String::new() }
    }

    fn document(pages: usize) -> RenderedDocument {
        RenderedDocument {
            template: "classic".to_string(),
            preview: false,
            pages: (0..pages)
                .map(|index| PageSurface { index, surface: surface(H + index as u32), items: Vec::new() })
                .collect(),
            root: surface(H * pages.max(1) as u32),
            page_breaks: Vec::new(),
            markup: "<html><body>cv</body></html>".to_string(),
        }
    }

    fn exporter(rasterizer: Arc<dyn Rasterizer>) -> Exporter {
        Exporter::new(rasterizer, None, 1.0)
    }

    fn hint() -> FilenameHint {
        FilenameHint { title: Some("My Resume!!".to_string()), resource_id: Some(42), ..Default::default() }
    }

    struct EchoDocx;

    #[async_trait]
    impl DocxConverter for EchoDocx {
        async fn convert(&self, html: &str, filename: &str) -> Result<Bytes, DocxError> {
            Ok(Bytes::from(format!("{filename}:{html}")))
        }
    }

    struct RejectingDocx;

    #[async_trait]
    impl DocxConverter for RejectingDocx {
        async fn convert(&self, _html: &str, _filename: &str) -> Result<Bytes, DocxError> {
            Err(DocxError::Server { status: 422, message: "unsupported markup".to_string() })
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!(" docx ".parse::<ExportFormat>(), Ok(ExportFormat::Docx));
        assert!("svg".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Png.extension(), "png");
    }

    #[tokio::test]
    async fn test_missing_document_is_reported_not_raised() {
        let store = DocumentStore::new(4);
        let id = Uuid::new_v4();
        let outcome = exporter(Arc::new(BlankRasterizer)).export(&store, id, ExportFormat::Pdf, &hint()).await;

        assert!(matches!(outcome.result, Err(ExportError::MissingRenderTarget(missing)) if missing == id));
        assert_eq!(outcome.report.status, ExportStatus::Failure);
        assert!(outcome.report.filename.is_none());
    }

    #[tokio::test]
    async fn test_pdf_has_one_page_per_rendered_page() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(3), FilenameHint::default()).await;
        let outcome = exporter(Arc::new(BlankRasterizer)).export(&store, stored.id, ExportFormat::Pdf, &hint()).await;

        let artifact = outcome.result.unwrap();
        assert_eq!(artifact.filename, "my-resume-42.pdf");
        assert_eq!(artifact.pages, 3);
        let pdf = lopdf::Document::load_mem(&artifact.bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 3);
        assert_eq!(outcome.report.status, ExportStatus::Success);
        assert_eq!(outcome.report.bytes, artifact.bytes.len());
    }

    #[tokio::test]
    async fn test_png_stacks_pages_in_order() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(2), FilenameHint::default()).await;
        let recording = Arc::new(RecordingRasterizer::default());
        let outcome = exporter(recording.clone()).export(&store, stored.id, ExportFormat::Png, &hint()).await;

        let artifact = outcome.result.unwrap();
        let png = Pixmap::decode_png(&artifact.bytes).unwrap();
        assert_eq!((png.width(), png.height()), (W, H + H + 1));
        assert_eq!(recording.heights(), vec![H, H + 1]);
        assert_eq!(recording.peak(), 1);
    }

    #[tokio::test]
    async fn test_document_without_pages_rasterizes_root_once() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(0), FilenameHint::default()).await;
        let recording = Arc::new(RecordingRasterizer::default());
        let exporter = exporter(recording.clone());

        let pdf = exporter.export(&store, stored.id, ExportFormat::Pdf, &hint()).await.result.unwrap();
        let doc = lopdf::Document::load_mem(&pdf.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let png = exporter.export(&store, stored.id, ExportFormat::Png, &hint()).await.result.unwrap();
        let decoded = Pixmap::decode_png(&png.bytes).unwrap();
        assert_eq!(decoded.height(), H);
        assert_eq!(recording.heights(), vec![H, H]);
    }

    #[tokio::test]
    async fn test_rasterization_failure_leaves_no_artifact() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(2), FilenameHint::default()).await;
        let outcome = exporter(Arc::new(FailingRasterizer)).export(&store, stored.id, ExportFormat::Png, &hint()).await;

        match outcome.result {
            Err(ExportError::Rasterization { format, message }) => {
                assert_eq!(format, ExportFormat::Png);
                assert!(message.contains("page 1 of 2"));
            }
            other => panic!("expected rasterization error, got {:?}", other.map(|a| a.filename)),
        }
        assert_eq!(outcome.report.status, ExportStatus::Failure);
        assert_eq!(outcome.report.bytes, 0);
        assert!(outcome.report.message.unwrap().starts_with("PNG export failed"));
    }

    #[tokio::test]
    async fn test_docx_without_converter_is_unavailable() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(1), FilenameHint::default()).await;
        let outcome = exporter(Arc::new(BlankRasterizer)).export(&store, stored.id, ExportFormat::Docx, &hint()).await;
        assert!(matches!(outcome.result, Err(ExportError::ConverterUnavailable)));
    }

    #[tokio::test]
    async fn test_docx_sends_markup_and_filename() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(1), FilenameHint::default()).await;
        let exporter = Exporter::new(Arc::new(BlankRasterizer), Some(Arc::new(EchoDocx)), 1.0);
        let artifact = exporter
            .export(&store, stored.id, ExportFormat::Docx, &hint())
            .await
            .result
            .unwrap();
        assert_eq!(&artifact.bytes[..], b"my-resume-42.docx:<html><body>cv</body></html>");
    }

    #[tokio::test]
    async fn test_docx_failure_surfaces_server_message() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(1), FilenameHint::default()).await;
        let exporter = Exporter::new(Arc::new(BlankRasterizer), Some(Arc::new(RejectingDocx)), 1.0);
        let outcome = exporter.export(&store, stored.id, ExportFormat::Docx, &hint()).await;
        assert!(matches!(outcome.result, Err(ExportError::RemoteConversion(ref m)) if m == "unsupported markup"));
    }

    #[tokio::test]
    async fn test_stored_hint_fills_missing_request_fields() {
        let store = DocumentStore::new(4);
        let stored_hint = FilenameHint { title: Some("Ada Lovelace".to_string()), ..Default::default() };
        let stored = store.insert(document(1), stored_hint).await;
        let artifact = exporter(Arc::new(BlankRasterizer))
            .export(&store, stored.id, ExportFormat::Pdf, &FilenameHint::default())
            .await
            .result
            .unwrap();
        assert_eq!(artifact.filename, "ada-lovelace.pdf");
    }

    #[tokio::test]
    async fn test_same_document_exports_are_serialized() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(2), FilenameHint::default()).await;
        let recording = Arc::new(RecordingRasterizer::default());
        let exporter = exporter(recording.clone());
        let hint = hint();

        let (a, b) = tokio::join!(
            exporter.export(&store, stored.id, ExportFormat::Pdf, &hint),
            exporter.export(&store, stored.id, ExportFormat::Png, &hint),
        );
        assert!(a.result.is_ok() && b.result.is_ok());
        assert_eq!(recording.peak(), 1);
        assert_eq!(exporter.active_exports(), 0);
    }

    #[tokio::test]
    async fn test_different_documents_export_concurrently() {
        let store = DocumentStore::new(4);
        let first = store.insert(document(2), FilenameHint::default()).await;
        let second = store.insert(document(2), FilenameHint::default()).await;
        let recording = Arc::new(RecordingRasterizer::default());
        let exporter = exporter(recording.clone());
        let hint = hint();

        let (a, b) = tokio::join!(
            exporter.export(&store, first.id, ExportFormat::Pdf, &hint),
            exporter.export(&store, second.id, ExportFormat::Pdf, &hint),
        );
        assert!(a.result.is_ok() && b.result.is_ok());
        assert_eq!(recording.peak(), 2);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_export_future_is_send() {
        let store = DocumentStore::new(4);
        let stored = store.insert(document(2), FilenameHint::default()).await;
        let exporter = exporter(Arc::new(BlankRasterizer));
        let hint = hint();

        let export = exporter.export(&store, stored.id, ExportFormat::Png, &hint);
        assert_send(&export);
        assert!(export.await.result.is_ok());
    }

    #[tokio::test]
    async fn test_each_bitmap_is_consumed_before_the_next_page() {
        let recording = Arc::new(RecordingRasterizer::default());
        let exporter = exporter(recording.clone());
        let doc = document(4);

        // (pages rasterized so far, height of the delivered bitmap)
        let mut deliveries = Vec::new();
        exporter
            .rasterize_each(&doc, ExportFormat::Pdf, |bitmap| {
                deliveries.push((recording.heights().len(), bitmap.height()));
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(deliveries, vec![(1, H), (2, H + 1), (3, H + 2), (4, H + 3)]);
    }

    #[tokio::test]
    async fn test_encoder_failure_stops_rasterizing() {
        let recording = Arc::new(RecordingRasterizer::default());
        let exporter = exporter(recording.clone());
        let result = exporter
            .rasterize_each(&document(3), ExportFormat::Pdf, |_| Err(ExportError::Encoding("disk full".to_string())))
            .await;
        assert!(matches!(result, Err(ExportError::Encoding(_))));
        assert_eq!(recording.heights().len(), 1);
    }

    fn red_png() -> Vec<u8> {
        let mut red = Pixmap::new(10, 10).unwrap();
        red.fill(Color::from_rgba8(255, 0, 0, 255));
        red.encode_png().unwrap()
    }

    fn photo_document(href: &str) -> RenderedDocument {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{W}" height="{H}" viewBox="0 0 {W} {H}"><image x="0" y="0" width="{W}" height="{W}" xlink:href="{href}"/></svg>"#
        );
        let mut doc = document(1);
        doc.pages[0].surface = Surface { width: W, height: H, svg };
        doc
    }

    #[tokio::test]
    async fn test_remote_images_reach_the_exported_png() {
        let app = Router::new().route("/red.png", get(|| async { red_png() }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let store = DocumentStore::new(4);
        let stored = store.insert(photo_document(&format!("http://{addr}/red.png")), FilenameHint::default()).await;
        let red_pixels = |bytes: &[u8]| {
            let png = Pixmap::decode_png(bytes).unwrap();
            png.pixels().iter().filter(|p| p.red() > 200 && p.green() < 50).count()
        };

        let fetcher = ImageFetcher::new(Duration::from_secs(5), 1 << 20).unwrap();
        let with_images = Exporter::new(Arc::new(ResvgRasterizer::new(None)), None, 1.0).with_image_fetcher(fetcher);
        let artifact = with_images.export(&store, stored.id, ExportFormat::Png, &hint()).await.result.unwrap();
        assert!(red_pixels(&artifact.bytes[..]) > 300);

        let without = Exporter::new(Arc::new(ResvgRasterizer::new(None)), None, 1.0);
        let artifact = without.export(&store, stored.id, ExportFormat::Png, &hint()).await.result.unwrap();
        assert_eq!(red_pixels(&artifact.bytes[..]), 0);
    }
}
