use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::export::docx::{DocxConverter, RemoteDocxConverter};
use crate::export::images::ImageFetcher;
use crate::export::raster::ResvgRasterizer;
use crate::export::Exporter;
use crate::public::{CvSource, HttpCvSource};
use crate::render::TemplateRegistry;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub templates: Arc<TemplateRegistry>,
    pub documents: DocumentStore,
    pub exporter: Arc<Exporter>,
    /// Slug lookup service. Public exports answer 503 without one.
    pub cv_source: Option<Arc<dyn CvSource>>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let rasterizer = ResvgRasterizer::new(config.font_dir.as_deref());
        info!("Rasterizer ready with {} font faces", rasterizer.face_count());

        let docx: Option<Arc<dyn DocxConverter>> = match &config.docx_converter_url {
            Some(url) => {
                let converter = RemoteDocxConverter::new(
                    url,
                    Duration::from_secs(config.docx_timeout_secs),
                    config.docx_max_attempts,
                )
                .context("Failed to build DOCX converter client")?;
                info!("DOCX converter at {url}");
                Some(Arc::new(converter))
            }
            None => {
                info!("DOCX_CONVERTER_URL not set; DOCX export disabled");
                None
            }
        };

        let images = ImageFetcher::new(
            Duration::from_secs(config.image_fetch_timeout_secs),
            config.image_max_bytes,
        )
        .context("Failed to build image fetch client")?;

        let cv_source: Option<Arc<dyn CvSource>> = match &config.public_api_url {
            Some(url) => Some(Arc::new(
                HttpCvSource::new(url).context("Failed to build public lookup client")?,
            )),
            None => None,
        };

        Ok(Self {
            templates: Arc::new(TemplateRegistry::builtin()),
            documents: DocumentStore::new(config.document_cache_capacity),
            exporter: Arc::new(
                Exporter::new(Arc::new(rasterizer), docx, config.export_scale).with_image_fetcher(images),
            ),
            cv_source,
            config,
        })
    }
}

#[cfg(test)]
impl AppState {
    /// Blank rasterizer, no DOCX converter, no public lookup.
    pub fn for_tests() -> Self {
        use crate::export::raster::fakes::BlankRasterizer;

        Self::with_exporter(Exporter::new(Arc::new(BlankRasterizer), None, 1.0), None)
    }

    pub fn with_exporter(exporter: Exporter, cv_source: Option<Arc<dyn CvSource>>) -> Self {
        let config = Config::from_lookup(|_| None).expect("default config");
        Self {
            templates: Arc::new(TemplateRegistry::builtin()),
            documents: DocumentStore::new(config.document_cache_capacity),
            exporter: Arc::new(exporter),
            cv_source,
            config,
        }
    }
}
