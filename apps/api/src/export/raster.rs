//! SVG surface → bitmap, via resvg.
//!
//! Image hrefs resolve from `data:` URLs and the prefetched [`ImageSet`]
//! only; usvg's default resolver would read local files.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use tracing::{debug, info};

use crate::render::Surface;

use super::images::ImageSet;

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Renders `surface` at `scale` device pixels per CSS pixel. Remote
    /// images come from `images`; hrefs missing there render empty.
    async fn rasterize(&self, surface: &Surface, scale: f32, images: &ImageSet) -> Result<Pixmap>;
}

/// Resolves `data:` hrefs the usvg way and every other href from `images`.
/// Never touches the filesystem.
fn image_resolver(images: ImageSet) -> usvg::ImageHrefResolver<'static> {
    let sniff = usvg::ImageHrefResolver::default_data_resolver();
    usvg::ImageHrefResolver {
        resolve_data: usvg::ImageHrefResolver::default_data_resolver(),
        resolve_string: Box::new(move |href: &str, opt: &usvg::Options| {
            let data = images.get(href)?;
            // "text/plain" makes usvg sniff the format from magic bytes
            sniff("text/plain", data, opt)
        }),
    }
}

/// Bitmap size for a surface at `scale`.
pub fn scaled_size(surface: &Surface, scale: f32) -> (u32, u32) {
    let w = (surface.width as f32 * scale).ceil() as u32;
    let h = (surface.height as f32 * scale).ceil() as u32;
    (w, h)
}

pub struct ResvgRasterizer {
    fonts: Arc<usvg::fontdb::Database>,
}

impl ResvgRasterizer {
    /// System fonts plus everything under `font_dir`.
    pub fn new(font_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = font_dir {
            let before = db.len();
            db.load_fonts_dir(dir);
            info!("Loaded {} font faces from {}", db.len() - before, dir.display());
        }
        Self { fonts: Arc::new(db) }
    }

    pub fn face_count(&self) -> usize {
        self.fonts.len()
    }

    fn render_svg(&self, svg: &str, (width, height): (u32, u32), scale: f32, images: ImageSet) -> Result<Pixmap> {
        let mut opt = usvg::Options::default();
        opt.fontdb = self.fonts.clone();
        opt.shape_rendering = usvg::ShapeRendering::GeometricPrecision;
        opt.text_rendering = usvg::TextRendering::GeometricPrecision;
        opt.image_href_resolver = image_resolver(images);

        let tree = usvg::Tree::from_str(svg, &opt).context("Failed to parse page SVG")?;

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("Cannot allocate a {width}x{height} bitmap"))?;
        pixmap.fill(Color::WHITE);
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

#[async_trait]
impl Rasterizer for ResvgRasterizer {
    async fn rasterize(&self, surface: &Surface, scale: f32, images: &ImageSet) -> Result<Pixmap> {
        let size = scaled_size(surface, scale);
        debug!("Rasterizing {}x{} surface at {scale}x", surface.width, surface.height);

        let fonts = self.fonts.clone();
        let svg = surface.svg.clone();
        let images = images.clone();
        tokio::task::spawn_blocking(move || ResvgRasterizer { fonts }.render_svg(&svg, size, scale, images))
            .await
            .context("Rasterizer task panicked")?
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test doubles
// ────────────────────────────────────────────────────────────────────────────


// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
