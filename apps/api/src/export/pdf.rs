//! Page bitmaps → multi-page PDF.
//!
//! Each bitmap becomes one page holding a single full-width image XObject.
//! Page order follows push order. Pages are compressed and written as they
//! arrive; only the compressed stream outlives the bitmap.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use resvg::tiny_skia::Pixmap;

use super::ExportError;

pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;

const IMAGE_NAME: Name<'static> = Name(b"Im1");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFit {
    /// Fixed A4 media box; image spans the width, anchored at the top.
    A4,
    /// A4 width; page height follows the image's aspect ratio.
    Flow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub media: (f32, f32),
    /// x, y, width, height in PDF user space (origin bottom-left).
    pub image: [f32; 4],
}

pub fn page_geometry((bitmap_w, bitmap_h): (u32, u32), fit: PageFit) -> PageGeometry {
    let draw_w = A4_WIDTH_PT;
    let draw_h = A4_WIDTH_PT * bitmap_h as f32 / bitmap_w.max(1) as f32;
    match fit {
        PageFit::A4 => PageGeometry {
            media: (A4_WIDTH_PT, A4_HEIGHT_PT),
            image: [0.0, A4_HEIGHT_PT - draw_h, draw_w, draw_h],
        },
        PageFit::Flow => PageGeometry {
            media: (A4_WIDTH_PT, draw_h),
            image: [0.0, 0.0, draw_w, draw_h],
        },
    }
}

pub struct PdfWriter {
    pdf: Pdf,
    fit: PageFit,
    page_tree_id: Ref,
    page_ids: Vec<Ref>,
    next_id: i32,
}

impl PdfWriter {
    pub fn new(fit: PageFit) -> Self {
        Self {
            pdf: Pdf::new(),
            fit,
            page_tree_id: Ref::new(2),
            page_ids: Vec::new(),
            next_id: 3,
        }
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Appends one page showing `bitmap`.
    pub fn push(&mut self, bitmap: &Pixmap) -> Result<(), ExportError> {
        let page_id = self.alloc();
        let content_id = self.alloc();
        let image_id = self.alloc();

        let geometry = page_geometry((bitmap.width(), bitmap.height()), self.fit);
        let pixels = compress_rgb(bitmap)?;

        let mut image = self.pdf.image_xobject(image_id, &pixels);
        image.filter(Filter::FlateDecode);
        image.width(bitmap.width() as i32);
        image.height(bitmap.height() as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        let [x, y, w, h] = geometry.image;
        let mut content = Content::new();
        content.save_state();
        content.transform([w, 0.0, 0.0, h, x, y]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        self.pdf.stream(content_id, &content.finish());

        let mut page = self.pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, geometry.media.0, geometry.media.1));
        page.parent(self.page_tree_id);
        page.contents(content_id);
        page.resources().x_objects().pair(IMAGE_NAME, image_id);
        page.finish();

        self.page_ids.push(page_id);
        Ok(())
    }

    /// Writes the page tree and catalog. Fails when no page was pushed.
    pub fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        if self.page_ids.is_empty() {
            return Err(ExportError::Encoding("no pages to write".to_string()));
        }
        self.pdf
            .pages(self.page_tree_id)
            .kids(self.page_ids.iter().copied())
            .count(self.page_ids.len() as i32);
        self.pdf.catalog(Ref::new(1)).pages(self.page_tree_id);
        Ok(self.pdf.finish())
    }
}

/// Drops alpha and zlib-compresses. Bitmaps are rendered onto an opaque white
/// fill, so premultiplied and straight RGB coincide.
fn compress_rgb(bitmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let mut row = Vec::with_capacity(bitmap.width() as usize * 3);
    for pixels in bitmap.data().chunks_exact(bitmap.width().max(1) as usize * 4) {
        row.clear();
        row.extend(pixels.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]));
        encoder
            .write_all(&row)
            .map_err(|e| ExportError::Encoding(format!("image compression failed: {e}")))?;
    }
    encoder
        .finish()
        .map_err(|e| ExportError::Encoding(format!("image compression failed: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object};

    fn bitmap(w: u32, h: u32) -> Pixmap {
        let mut p = Pixmap::new(w, h).unwrap();
        p.fill(resvg::tiny_skia::Color::WHITE);
        p
    }

    fn assemble(bitmaps: &[Pixmap], fit: PageFit) -> Result<Vec<u8>, ExportError> {
        let mut writer = PdfWriter::new(fit);
        for bitmap in bitmaps {
            writer.push(bitmap)?;
        }
        writer.finish()
    }

    fn number(o: &Object) -> f32 {
        match o {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            other => panic!("not a number: {other:?}"),
        }
    }

    fn image_heights(doc: &Document) -> Vec<i64> {
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let page = doc.get_dictionary(page_id).unwrap();
                let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
                let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
                let image_ref = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
                let image = doc.get_object(image_ref).unwrap().as_stream().unwrap();
                image.dict.get(b"Height").unwrap().as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_one_pdf_page_per_bitmap_in_order() {
        let bitmaps = vec![bitmap(20, 28), bitmap(20, 29), bitmap(20, 30)];
        let bytes = assemble(&bitmaps, PageFit::A4).unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
        assert_eq!(image_heights(&doc), vec![28, 29, 30]);
    }

    #[test]
    fn test_a4_media_box() {
        let bytes = assemble(&[bitmap(794, 1123)], PageFit::A4).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let media = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(number)
            .collect::<Vec<_>>();
        assert!((media[2] - A4_WIDTH_PT).abs() < 0.01);
        assert!((media[3] - A4_HEIGHT_PT).abs() < 0.01);
    }

    #[test]
    fn test_geometry_anchors_top_and_keeps_aspect() {
        let g = page_geometry((794, 1123), PageFit::A4);
        assert_eq!(g.media, (A4_WIDTH_PT, A4_HEIGHT_PT));
        let [x, y, w, h] = g.image;
        assert_eq!(x, 0.0);
        assert_eq!(w, A4_WIDTH_PT);
        assert!((h - A4_WIDTH_PT * 1123.0 / 794.0).abs() < 0.001);
        assert!((y + h - A4_HEIGHT_PT).abs() < 0.001);

        let short = page_geometry((100, 50), PageFit::A4);
        assert!((short.image[3] - A4_WIDTH_PT / 2.0).abs() < 0.001);
        assert!(short.image[1] > 0.0);
    }

    #[test]
    fn test_flow_page_follows_image_height() {
        let g = page_geometry((794, 2400), PageFit::Flow);
        assert!((g.media.1 - A4_WIDTH_PT * 2400.0 / 794.0).abs() < 0.001);
        assert_eq!(g.image[1], 0.0);
        assert_eq!(g.image[3], g.media.1);
    }

    #[test]
    fn test_no_bitmaps_is_an_error() {
        assert!(matches!(assemble(&[], PageFit::A4), Err(ExportError::Encoding(_))));
    }
}
