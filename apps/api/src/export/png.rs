//! Page bitmaps → one vertically stitched PNG.

use resvg::tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use super::ExportError;

/// Canvas size and each page's vertical offset, in device pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchPlan {
    pub width: u32,
    pub height: u32,
    pub offsets: Vec<u32>,
}

/// Plans a stitch from page sizes in CSS pixels. Each page occupies
/// `ceil(scale · height)` device rows, the same size the rasterizer gives its
/// bitmap, so pages neither overlap nor get clipped at fractional scales.
pub fn plan_stitch(pages: &[(u32, u32)], scale: f32) -> StitchPlan {
    let mut offsets = Vec::with_capacity(pages.len());
    let mut top = 0u32;
    for &(_, h) in pages {
        offsets.push(top);
        top += (h as f32 * scale).ceil() as u32;
    }
    let widest = pages.iter().map(|&(w, _)| w).max().unwrap_or(0);
    StitchPlan {
        width: (widest as f32 * scale).ceil() as u32,
        height: top,
        offsets,
    }
}

/// Draws page bitmaps onto a preallocated canvas as they arrive, so callers
/// can drop each bitmap before rasterizing the next.
pub struct Stitcher {
    canvas: Pixmap,
    offsets: std::vec::IntoIter<u32>,
}

impl Stitcher {
    pub fn new(plan: StitchPlan) -> Result<Self, ExportError> {
        let mut canvas = Pixmap::new(plan.width, plan.height)
            .ok_or_else(|| ExportError::Encoding("empty PNG canvas".to_string()))?;
        canvas.fill(Color::WHITE);
        Ok(Self { canvas, offsets: plan.offsets.into_iter() })
    }

    /// Draws the next page below the previous one.
    pub fn push(&mut self, bitmap: &Pixmap) -> Result<(), ExportError> {
        let offset = self
            .offsets
            .next()
            .ok_or_else(|| ExportError::Encoding("more pages than the stitch plan holds".to_string()))?;
        self.canvas.draw_pixmap(
            0,
            offset as i32,
            bitmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    pub fn finish(self) -> Result<Vec<u8>, ExportError> {
        encode(&self.canvas)
    }
}

pub fn encode(bitmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    bitmap
        .encode_png()
        .map_err(|e| ExportError::Encoding(format!("PNG encoding failed: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
