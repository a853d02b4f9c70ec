//! Template rendering: CV data + style → A4 page surfaces.
//!
//! Every variant implements [`Template`]; the [`TemplateRegistry`] maps
//! variant identifiers onto implementations. A render is a pure function of
//! its inputs: it never fetches, never persists, and never mutates the CV.

pub mod compose;
pub mod dates;
pub mod handlers;
pub mod markup;
pub mod registry;
pub mod svg;
pub mod theme;

use serde::Serialize;

use crate::layout::{PageBreak, PageItem};
use crate::models::cv::CvData;
use crate::models::style::StyleSettings;

pub use dates::MonthStyle;
pub use registry::TemplateRegistry;

/// An SVG document with its pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub svg: String,
}

/// One discrete A4 page of a paginated render.
#[derive(Debug, Clone)]
pub struct PageSurface {
    pub index: usize,
    pub surface: Surface,
    /// Items painted on this page, in paint order.
    pub items: Vec<PageItem>,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub template: String,
    pub preview: bool,
    /// Explicit page surfaces. Empty for variants that do not paginate.
    pub pages: Vec<PageSurface>,
    /// The whole document as one surface (pages stacked, or the continuous flow).
    pub root: Surface,
    pub page_breaks: Vec<PageBreak>,
    /// HTML rendition with page-break markers.
    pub markup: String,
}

impl RenderedDocument {
    /// Pages an export will produce: the discovered pages, or one for the root.
    pub fn page_count(&self) -> usize {
        self.pages.len().max(1)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub paginated: bool,
    pub month_style: MonthStyle,
    pub columns: u8,
}

/// One layout variant.
pub trait Template: Send + Sync {
    fn info(&self) -> TemplateInfo;

    /// Style used when the caller supplies none.
    fn default_style(&self) -> &StyleSettings;

    /// Renders `data`. `style` absent → the CV's embedded style, then the
    /// variant's default. `preview` renders the first page only, unnumbered.
    fn render(&self, data: &CvData, style: Option<&StyleSettings>, preview: bool) -> RenderedDocument;
}
