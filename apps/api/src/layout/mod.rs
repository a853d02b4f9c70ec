// Layout engine: font metrics, measured blocks and up-front pagination.
// Templates compose blocks; `paginate` decides page boundaries before anything is painted.

pub mod font_metrics;
pub mod paginate;

pub use font_metrics::{css_font_stack, mm_to_px, FontMetrics, PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
pub use paginate::{
    paginate, Block, ColumnLayout, DrawOp, PageBreak, PageCapacity, PageItem, PlacedBlock, Row,
    TextAnchor, TextStyle,
};
