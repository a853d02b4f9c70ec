//! Column pagination: flows measured blocks into page-height columns.
//!
//! Page boundaries are computed here, up front, from the page-height budget;
//! nothing downstream has to discover them. A block is a stack of rows; rows
//! are indivisible, blocks split only between rows.
//!
//! # Break rules
//! - A block that does not fit the remaining space but fits an empty page starts
//!   a new page.
//! - A block taller than a page is split at row boundaries; the tails are marked
//!   `continued`.
//! - `keep_with_next` blocks (section headings) move to the next page together
//!   with the first row of the block that follows them.

use serde::Serialize;

use crate::models::cv::SectionId;

// ────────────────────────────────────────────────────────────────────────────
// Display list
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// CSS family list.
    pub font: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: String,
    pub opacity: f32,
}

/// One paint operation. Coordinates are relative to the enclosing row until the
/// row is placed, then relative to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
        anchor: TextAnchor,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        fill: Option<String>,
        stroke: Option<String>,
        stroke_width: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: Option<String>,
        stroke: Option<String>,
        stroke_width: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
        width: f32,
    },
    Polygon {
        points: Vec<(f32, f32)>,
        fill: Option<String>,
        stroke: Option<String>,
        stroke_width: f32,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        href: String,
        circular: bool,
    },
}

impl DrawOp {
    pub fn translated(&self, dx: f32, dy: f32) -> DrawOp {
        match self {
            DrawOp::Text {
                x,
                y,
                text,
                style,
                anchor,
            } => DrawOp::Text {
                x: x + dx,
                y: y + dy,
                text: text.clone(),
                style: style.clone(),
                anchor: *anchor,
            },
            DrawOp::Rect {
                x,
                y,
                w,
                h,
                radius,
                fill,
                stroke,
                stroke_width,
            } => DrawOp::Rect {
                x: x + dx,
                y: y + dy,
                w: *w,
                h: *h,
                radius: *radius,
                fill: fill.clone(),
                stroke: stroke.clone(),
                stroke_width: *stroke_width,
            },
            DrawOp::Circle {
                cx,
                cy,
                r,
                fill,
                stroke,
                stroke_width,
            } => DrawOp::Circle {
                cx: cx + dx,
                cy: cy + dy,
                r: *r,
                fill: fill.clone(),
                stroke: stroke.clone(),
                stroke_width: *stroke_width,
            },
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => DrawOp::Line {
                x1: x1 + dx,
                y1: y1 + dy,
                x2: x2 + dx,
                y2: y2 + dy,
                color: color.clone(),
                width: *width,
            },
            DrawOp::Polygon {
                points,
                fill,
                stroke,
                stroke_width,
            } => DrawOp::Polygon {
                points: points.iter().map(|(x, y)| (x + dx, y + dy)).collect(),
                fill: fill.clone(),
                stroke: stroke.clone(),
                stroke_width: *stroke_width,
            },
            DrawOp::Image {
                x,
                y,
                w,
                h,
                href,
                circular,
            } => DrawOp::Image {
                x: x + dx,
                y: y + dy,
                w: *w,
                h: *h,
                href: href.clone(),
                circular: *circular,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blocks
// ────────────────────────────────────────────────────────────────────────────

/// What a placed block represents; used as a render anchor and in page summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageItem {
    Header,
    Summary,
    Heading { section: SectionId },
    Entry { section: SectionId, id: String },
    List { section: SectionId },
}

/// An indivisible horizontal strip of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub item: PageItem,
    pub rows: Vec<Row>,
    /// Gap below the block; dropped at a page bottom.
    pub space_after: f32,
    pub keep_with_next: bool,
}

impl Block {
    pub fn new(item: PageItem) -> Self {
        Self {
            item,
            rows: Vec::new(),
            space_after: 0.0,
            keep_with_next: false,
        }
    }

    pub fn height(&self) -> f32 {
        self.rows.iter().map(|r| r.height).sum()
    }

    fn first_row_height(&self) -> f32 {
        self.rows.first().map(|r| r.height).unwrap_or(0.0)
    }
}

/// A block (or block piece) positioned in a column.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub item: PageItem,
    /// Offset from the column top.
    pub y: f32,
    pub height: f32,
    /// Ops relative to the column origin.
    pub ops: Vec<DrawOp>,
    /// True for the tail of a block split across pages.
    pub continued: bool,
}

/// Where a page break fell in the unbroken column flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreak {
    /// Index of the page that starts at this break.
    pub page: usize,
    /// Distance from the start of the flow.
    pub flow_offset: f32,
    /// The item whose content opens the new page.
    pub opens_with: PageItem,
}

/// Usable column height per page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCapacity {
    pub first: f32,
    pub rest: f32,
}

impl PageCapacity {
    pub fn uniform(height: f32) -> Self {
        Self {
            first: height,
            rest: height,
        }
    }

    pub fn for_page(&self, page: usize) -> f32 {
        if page == 0 {
            self.first
        } else {
            self.rest
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    pub pages: Vec<Vec<PlacedBlock>>,
    pub breaks: Vec<PageBreak>,
    /// Height consumed on each page.
    pub used: Vec<f32>,
}

impl ColumnLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pagination
// ────────────────────────────────────────────────────────────────────────────

struct Cursor {
    layout: ColumnLayout,
    capacity: PageCapacity,
    page: usize,
    y: f32,
    /// Bottom of the last placed row; trailing gaps are not counted as used.
    content_end: f32,
    flow: f32,
}

impl Cursor {
    fn remaining(&self) -> f32 {
        self.capacity.for_page(self.page) - self.y
    }

    fn new_page(&mut self, opens_with: &PageItem) {
        self.layout.used[self.page] = self.content_end;
        self.page += 1;
        self.y = 0.0;
        self.content_end = 0.0;
        self.layout.pages.push(Vec::new());
        self.layout.used.push(0.0);
        self.layout.breaks.push(PageBreak {
            page: self.page,
            flow_offset: self.flow,
            opens_with: opens_with.clone(),
        });
    }

    fn flush(&mut self, item: &PageItem, top: f32, ops: Vec<DrawOp>, continued: bool) {
        if top >= self.y && ops.is_empty() {
            return;
        }
        self.layout.pages[self.page].push(PlacedBlock {
            item: item.clone(),
            y: top,
            height: self.y - top,
            ops,
            continued,
        });
    }
}

/// Paginates a column. Always yields at least one (possibly empty) page.
pub fn paginate(blocks: Vec<Block>, capacity: PageCapacity) -> ColumnLayout {
    let mut cursor = Cursor {
        layout: ColumnLayout {
            pages: vec![Vec::new()],
            breaks: Vec::new(),
            used: vec![0.0],
        },
        capacity,
        page: 0,
        y: 0.0,
        content_end: 0.0,
        flow: 0.0,
    };

    let next_first_rows: Vec<f32> = blocks
        .iter()
        .skip(1)
        .map(|b| b.first_row_height())
        .chain(std::iter::once(0.0))
        .collect();

    for (block, next_first_row) in blocks.into_iter().zip(next_first_rows) {
        if block.rows.is_empty() {
            continue;
        }

        let height = block.height();
        let needed = if block.keep_with_next {
            height + next_first_row
        } else {
            height
        };

        // Whole block goes to the next page if it fits there but not here.
        if needed > cursor.remaining() && needed <= cursor.capacity.for_page(cursor.page + 1) {
            cursor.new_page(&block.item);
        }

        let mut top = cursor.y;
        let mut ops = Vec::new();
        let mut continued = false;

        for row in block.rows {
            if cursor.y > top && row.height > cursor.remaining() {
                let piece = std::mem::take(&mut ops);
                cursor.flush(&block.item, top, piece, continued);
                cursor.new_page(&block.item);
                top = 0.0;
                continued = true;
            } else if cursor.y > 0.0 && cursor.y == top && row.height > cursor.remaining() {
                // First row of an oversized block on a partly filled page.
                cursor.new_page(&block.item);
                top = 0.0;
            }
            ops.extend(row.ops.iter().map(|op| op.translated(0.0, cursor.y)));
            cursor.y += row.height;
            cursor.content_end = cursor.y;
            cursor.flow += row.height;
        }
        cursor.flush(&block.item, top, ops, continued);

        let gap = block.space_after.min(cursor.remaining().max(0.0));
        cursor.y += gap;
        cursor.flow += block.space_after;
    }

    let page = cursor.page;
    cursor.layout.used[page] = cursor.content_end;
    cursor.layout
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
