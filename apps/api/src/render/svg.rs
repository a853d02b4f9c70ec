//! SVG painter: placed blocks + page decorations → SVG documents.
//!
//! Each page is painted as a body fragment first so the same fragment can be
//! wrapped as a standalone page or nested into the stacked root surface.

use std::fmt::Write as _;

use crate::layout::{DrawOp, PageItem, PlacedBlock, TextAnchor};

use super::theme::{PageBorder, Theme};
use super::Surface;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// A paginated column to paint at an origin on the page.
pub struct ColumnPaint<'a> {
    pub x: f32,
    pub y: f32,
    pub blocks: &'a [PlacedBlock],
}

/// Everything needed to paint one page body.
pub struct PagePaint<'a> {
    pub theme: &'a Theme,
    pub index: usize,
    pub count: usize,
    pub width: f32,
    pub height: f32,
    pub columns: Vec<ColumnPaint<'a>>,
    /// Full-height band behind a sidebar column: (x, width).
    pub sidebar_band: Option<(f32, f32)>,
    pub numbered: bool,
}

/// Image hrefs the painters emit: http(s) URLs and inline `data:image/`
/// URLs. Paths and other schemes never reach a surface.
pub fn is_embeddable_image(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    ["http://", "https://", "data:image/"].iter().any(|scheme| lower.starts_with(scheme))
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Two decimals, trailing zeros dropped.
pub fn num(v: f32) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn paint_attrs(fill: &Option<String>, stroke: &Option<String>, stroke_width: f32) -> String {
    let mut attrs = format!(" fill=\"{}\"", fill.as_deref().unwrap_or("none"));
    if let Some(stroke) = stroke {
        let _ = write!(attrs, " stroke=\"{}\" stroke-width=\"{}\"", stroke, num(stroke_width));
    }
    attrs
}

struct Painter {
    id_prefix: String,
    defs: String,
    body: String,
    clip_count: usize,
}

impl Painter {
    fn new(page: usize) -> Self {
        Self {
            id_prefix: format!("p{page}"),
            defs: String::new(),
            body: String::new(),
            clip_count: 0,
        }
    }

    fn op(&mut self, op: &DrawOp) {
        match op {
            DrawOp::Text {
                x,
                y,
                text,
                style,
                anchor,
            } => {
                if text.is_empty() {
                    return;
                }
                let _ = write!(
                    self.body,
                    "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\"",
                    num(*x),
                    num(*y),
                    escape(&style.font),
                    num(style.size),
                    style.color
                );
                if style.bold {
                    self.body.push_str(" font-weight=\"700\"");
                }
                if style.italic {
                    self.body.push_str(" font-style=\"italic\"");
                }
                if style.opacity < 1.0 {
                    let _ = write!(self.body, " fill-opacity=\"{}\"", num(style.opacity));
                }
                match anchor {
                    TextAnchor::Start => {}
                    TextAnchor::Middle => self.body.push_str(" text-anchor=\"middle\""),
                    TextAnchor::End => self.body.push_str(" text-anchor=\"end\""),
                }
                let _ = write!(self.body, ">{}</text>", escape(text));
            }
            DrawOp::Rect {
                x,
                y,
                w,
                h,
                radius,
                fill,
                stroke,
                stroke_width,
            } => {
                let _ = write!(
                    self.body,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
                    num(*x),
                    num(*y),
                    num(w.max(0.0)),
                    num(h.max(0.0))
                );
                if *radius > 0.0 {
                    let _ = write!(self.body, " rx=\"{}\"", num(*radius));
                }
                let _ = write!(self.body, "{}/>", paint_attrs(fill, stroke, *stroke_width));
            }
            DrawOp::Circle {
                cx,
                cy,
                r,
                fill,
                stroke,
                stroke_width,
            } => {
                let _ = write!(
                    self.body,
                    "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"{}/>",
                    num(*cx),
                    num(*cy),
                    num(*r),
                    paint_attrs(fill, stroke, *stroke_width)
                );
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => {
                let _ = write!(
                    self.body,
                    "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
                    num(*x1),
                    num(*y1),
                    num(*x2),
                    num(*y2),
                    color,
                    num(*width)
                );
            }
            DrawOp::Polygon {
                points,
                fill,
                stroke,
                stroke_width,
            } => {
                let points: Vec<String> = points
                    .iter()
                    .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
                    .collect();
                let _ = write!(
                    self.body,
                    "<polygon points=\"{}\"{}/>",
                    points.join(" "),
                    paint_attrs(fill, stroke, *stroke_width)
                );
            }
            DrawOp::Image {
                x,
                y,
                w,
                h,
                href,
                circular,
            } => {
                let clip = if *circular {
                    self.clip_count += 1;
                    let id = format!("{}-clip{}", self.id_prefix, self.clip_count);
                    let _ = write!(
                        self.defs,
                        "<clipPath id=\"{}\"><circle cx=\"{}\" cy=\"{}\" r=\"{}\"/></clipPath>",
                        id,
                        num(x + w / 2.0),
                        num(y + h / 2.0),
                        num(w.min(*h) / 2.0)
                    );
                    format!(" clip-path=\"url(#{id})\"")
                } else {
                    String::new()
                };
                let _ = write!(
                    self.body,
                    "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" xlink:href=\"{}\"{}/>",
                    num(*x),
                    num(*y),
                    num(*w),
                    num(*h),
                    escape(href),
                    clip
                );
            }
        }
    }

    fn block(&mut self, block: &PlacedBlock, dx: f32, dy: f32) {
        match &block.item {
            PageItem::Entry { section, id } if !id.is_empty() => {
                let _ = write!(
                    self.body,
                    "<g data-section=\"{}\" data-entry-id=\"{}\">",
                    section.as_str(),
                    escape(id)
                );
            }
            PageItem::Entry { section, .. }
            | PageItem::Heading { section }
            | PageItem::List { section } => {
                let _ = write!(self.body, "<g data-section=\"{}\">", section.as_str());
            }
            PageItem::Header => self.body.push_str("<g data-item=\"header\">"),
            PageItem::Summary => self.body.push_str("<g data-item=\"summary\">"),
        }
        for op in &block.ops {
            self.op(&op.translated(dx, dy));
        }
        self.body.push_str("</g>");
    }

    fn finish(self) -> String {
        if self.defs.is_empty() {
            self.body
        } else {
            format!("<defs>{}</defs>{}", self.defs, self.body)
        }
    }
}

fn rect(x: f32, y: f32, w: f32, h: f32, fill: Option<&str>, stroke: Option<(&str, f32)>) -> DrawOp {
    DrawOp::Rect {
        x,
        y,
        w,
        h,
        radius: 0.0,
        fill: fill.map(str::to_string),
        stroke: stroke.map(|(c, _)| c.to_string()),
        stroke_width: stroke.map(|(_, w)| w).unwrap_or(0.0),
    }
}

/// Paints one page body (no outer `<svg>` element).
pub fn page_body(page: &PagePaint<'_>) -> String {
    let theme = page.theme;
    let (w, h) = (page.width, page.height);
    let mut painter = Painter::new(page.index);

    painter.op(&rect(0.0, 0.0, w, h, Some(theme.background.as_str()), None));
    if let PageBorder::Image { url } = &theme.border {
        let _ = write!(
            painter.body,
            "<image x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" xlink:href=\"{}\"/>",
            num(w),
            num(h),
            escape(url)
        );
    }
    if let Some((x, band_width)) = page.sidebar_band {
        painter.op(&rect(x, 0.0, band_width, h, Some(theme.sidebar.as_str()), None));
    }

    for column in &page.columns {
        for block in column.blocks {
            painter.block(block, column.x, column.y);
        }
    }

    match &theme.border {
        PageBorder::Single { color } => {
            painter.op(&rect(6.0, 6.0, w - 12.0, h - 12.0, None, Some((color.as_str(), 3.0))));
        }
        PageBorder::Multi { colors } => {
            for (i, color) in colors.iter().enumerate() {
                let inset = 4.0 + i as f32 * 5.0;
                painter.op(&rect(inset, inset, w - 2.0 * inset, h - 2.0 * inset, None, Some((color.as_str(), 2.0))));
            }
        }
        PageBorder::None | PageBorder::Image { .. } => {}
    }

    if page.numbered {
        let _ = write!(
            painter.body,
            "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"9\" fill=\"{}\" text-anchor=\"middle\">{} / {}</text>",
            num(w / 2.0),
            num(h - theme.margin_bottom / 2.0),
            escape(&theme.body_font),
            theme.secondary,
            page.index + 1,
            page.count
        );
    }

    painter.finish()
}

/// Wraps a body fragment as a standalone SVG document.
pub fn document(width: u32, height: u32, body: &str) -> Surface {
    Surface {
        width,
        height,
        svg: format!(
            "<svg xmlns=\"{SVG_NS}\" xmlns:xlink=\"{XLINK_NS}\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">{body}</svg>"
        ),
    }
}

/// Stacks page bodies vertically into one surface.
pub fn stacked(width: u32, page_height: u32, bodies: &[String]) -> Surface {
    let height = page_height * bodies.len().max(1) as u32;
    let mut inner = String::new();
    for (i, body) in bodies.iter().enumerate() {
        let _ = write!(
            inner,
            "<svg x=\"0\" y=\"{}\" width=\"{width}\" height=\"{page_height}\" viewBox=\"0 0 {width} {page_height}\">{body}</svg>",
            i as u32 * page_height
        );
    }
    document(width, height, &inner)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
