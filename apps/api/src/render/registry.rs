//! The built-in layout variants and the identifier → template registry.
//!
//! Variants differ in arrangement (one column, sidebar, continuous), header
//! kind, timeline rail, month-label style and default style. All of them share
//! one composition and pagination path.

use std::collections::HashMap;
use std::sync::Arc;

use crate::layout::{
    paginate, Block, ColumnLayout, PageBreak, PageCapacity, PageItem, PAGE_HEIGHT_PX, PAGE_WIDTH_PX,
};
use crate::models::cv::{CvData, SectionId};
use crate::models::style::{
    Align, BorderMode, BulletStyle, Capitalization, IconFill, IconFrame, MarkerStyle,
    SectionIconStyle, StyleSettings,
};

use super::compose::{Composer, HeaderKind};
use super::dates::MonthStyle;
use super::markup::render_markup;
use super::svg::{self, ColumnPaint, PagePaint};
use super::theme::Theme;
use super::{PageSurface, RenderedDocument, Surface, Template, TemplateInfo};

pub const DEFAULT_TEMPLATE: &str = "classic";

/// Room kept free above the bottom margin for the page number.
const FOOTER_HEIGHT: f32 = 18.0;
const COLUMN_GAP: f32 = 24.0;

/// Sections a sidebar variant moves into its narrow column.
const SIDEBAR_SECTIONS: [SectionId; 4] = [
    SectionId::Skills,
    SectionId::Languages,
    SectionId::Interests,
    SectionId::Certifications,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arrangement {
    Single,
    /// `ratio` is the sidebar's share of the content width.
    Sidebar { side: Side, ratio: f32 },
    /// One unbroken surface; no page markers.
    Continuous,
}

#[derive(Debug, Clone)]
pub struct VariantSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub arrangement: Arrangement,
    pub header: HeaderKind,
    pub timeline: bool,
    pub month_style: MonthStyle,
    pub style: StyleSettings,
}

fn style(edit: impl FnOnce(&mut StyleSettings)) -> StyleSettings {
    let mut s = StyleSettings::default();
    edit(&mut s);
    s
}

fn single(id: &'static str, name: &'static str, header: HeaderKind, month_style: MonthStyle, style: StyleSettings) -> VariantSpec {
    VariantSpec {
        id,
        name,
        arrangement: Arrangement::Single,
        header,
        timeline: false,
        month_style,
        style,
    }
}

fn sidebar(id: &'static str, name: &'static str, side: Side, ratio: f32, month_style: MonthStyle, style: StyleSettings) -> VariantSpec {
    VariantSpec {
        id,
        name,
        arrangement: Arrangement::Sidebar { side, ratio },
        header: HeaderKind::NameOnly,
        timeline: false,
        month_style,
        style,
    }
}

pub fn builtin_variants() -> Vec<VariantSpec> {
    use HeaderKind::{Banner, Split, Stacked};
    use MonthStyle::{Long, Short};

    vec![
        single("classic", "Classic", Stacked, Short, style(|s| s.align = Align::Center)),
        single(
            "modern",
            "Modern",
            Split,
            Short,
            style(|s| {
                s.accent_color = "#0ea5e9".to_string();
                s.heading_font = "montserrat".to_string();
                s.section_icon_style = SectionIconStyle::Circle;
            }),
        ),
        single(
            "minimal",
            "Minimal",
            Stacked,
            Long,
            style(|s| {
                s.accent_color = "#111827".to_string();
                s.headings_line = false;
                s.icon_fill = IconFill::None;
                s.accent_job_title = false;
            }),
        ),
        single(
            "professional",
            "Professional",
            Stacked,
            Short,
            style(|s| {
                s.accent_color = "#1e3a8a".to_string();
                s.body_font = "lato".to_string();
                s.heading_font = "lato".to_string();
                s.capitalization = Capitalization::Uppercase;
                s.heading_font_size = 16.0;
            }),
        ),
        single(
            "executive",
            "Executive",
            Banner,
            Long,
            style(|s| {
                s.accent_color = "#0f172a".to_string();
                s.heading_font = "merriweather".to_string();
                s.margin_top = 12.0;
            }),
        ),
        sidebar(
            "creative",
            "Creative",
            Side::Left,
            0.34,
            Short,
            style(|s| {
                s.accent_color = "#db2777".to_string();
                s.sidebar_color = "#fdf2f8".to_string();
                s.marker_style = MarkerStyle::Bubbles;
                s.icon_frame = IconFrame::Circle;
                s.accent_name = true;
            }),
        ),
        single(
            "elegant",
            "Elegant",
            Stacked,
            Long,
            style(|s| {
                s.align = Align::Center;
                s.accent_color = "#7c3aed".to_string();
                s.body_font = "eb-garamond".to_string();
                s.heading_font = "eb-garamond".to_string();
                s.border_mode = BorderMode::Single;
            }),
        ),
        single(
            "compact",
            "Compact",
            Stacked,
            Short,
            style(|s| {
                s.body_font_size = 10.0;
                s.heading_font_size = 14.0;
                s.line_height = 1.25;
                s.margin_left = 10.0;
                s.margin_right = 10.0;
                s.margin_top = 10.0;
                s.margin_bottom = 10.0;
                s.entry_spacing = 6.0;
                s.description_indent = 6.0;
            }),
        ),
        VariantSpec {
            timeline: true,
            ..single(
                "timeline",
                "Timeline",
                Stacked,
                Short,
                style(|s| {
                    s.accent_color = "#059669".to_string();
                    s.border_color = "#a7f3d0".to_string();
                }),
            )
        },
        sidebar("sidebar-left", "Sidebar (left)", Side::Left, 0.32, Short, style(|_| {})),
        sidebar(
            "sidebar-right",
            "Sidebar (right)",
            Side::Right,
            0.32,
            Short,
            style(|s| s.marker_style = MarkerStyle::Bars),
        ),
        single(
            "banner",
            "Banner",
            Banner,
            Short,
            style(|s| {
                s.accent_color = "#ea580c".to_string();
                s.icon_fill = IconFill::Filled;
            }),
        ),
        single(
            "academic",
            "Academic",
            Stacked,
            Long,
            style(|s| {
                s.align = Align::Center;
                s.accent_color = "#374151".to_string();
                s.body_font = "computer-modern".to_string();
                s.heading_font = "computer-modern".to_string();
                s.page_numbers = true;
            }),
        ),
        single(
            "technical",
            "Technical",
            Split,
            Short,
            style(|s| {
                s.accent_color = "#16a34a".to_string();
                s.body_font = "source-sans-pro".to_string();
                s.bullet_style = BulletStyle::Arrow;
                s.marker_style = MarkerStyle::Bars;
                s.section_icon_style = SectionIconStyle::Square;
            }),
        ),
        VariantSpec {
            arrangement: Arrangement::Continuous,
            ..single("web", "Web page", Stacked, Short, style(|_| {}))
        },
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Column flow
// ────────────────────────────────────────────────────────────────────────────

struct Flow {
    main: ColumnLayout,
    main_x: f32,
    side: Option<(ColumnLayout, f32)>,
    band: Option<(f32, f32)>,
    top: f32,
}

impl Flow {
    /// One break per page after the first, ordered by page. Where both
    /// columns break onto the same page the main column's break is kept.
    fn page_breaks(&self) -> Vec<PageBreak> {
        let mut breaks = self.main.breaks.clone();
        if let Some((side, _)) = &self.side {
            for side_break in &side.breaks {
                if !breaks.iter().any(|b| b.page == side_break.page) {
                    breaks.push(side_break.clone());
                }
            }
            breaks.sort_by_key(|b| b.page);
        }
        breaks
    }

    fn compose(spec: &VariantSpec, theme: &Theme, data: &CvData, sections: &[SectionId], capacity: PageCapacity) -> Flow {
        let page_width = PAGE_WIDTH_PX as f32;
        let content_width = page_width - theme.margin_left - theme.margin_right;

        match spec.arrangement {
            Arrangement::Single | Arrangement::Continuous => {
                let composer = Composer::new(theme, spec.month_style, content_width, spec.timeline);
                let mut blocks: Vec<Block> = vec![composer.header(data, spec.header)];
                blocks.extend(composer.summary(data));
                for section in sections {
                    blocks.extend(composer.section(data, *section));
                }
                Flow {
                    main: paginate(blocks, capacity),
                    main_x: theme.margin_left,
                    side: None,
                    band: None,
                    top: theme.margin_top,
                }
            }
            Arrangement::Sidebar { side, ratio } => {
                let side_width = content_width * ratio;
                let main_width = content_width - side_width - COLUMN_GAP;
                let (main_x, side_x, band) = match side {
                    Side::Left => {
                        let band_width = theme.margin_left + side_width + COLUMN_GAP / 2.0;
                        (
                            theme.margin_left + side_width + COLUMN_GAP,
                            theme.margin_left,
                            (0.0, band_width),
                        )
                    }
                    Side::Right => {
                        let side_x = theme.margin_left + main_width + COLUMN_GAP;
                        let band_x = side_x - COLUMN_GAP / 2.0;
                        (theme.margin_left, side_x, (band_x, page_width - band_x))
                    }
                };

                let main = Composer::new(theme, spec.month_style, main_width, spec.timeline);
                let narrow = Composer::new(theme, spec.month_style, side_width, false);

                let mut main_blocks: Vec<Block> = vec![main.header(data, spec.header)];
                main_blocks.extend(main.summary(data));
                let mut side_blocks: Vec<Block> = narrow.contact_column(data).into_iter().collect();
                for section in sections {
                    if SIDEBAR_SECTIONS.contains(section) {
                        side_blocks.extend(narrow.section(data, *section));
                    } else {
                        main_blocks.extend(main.section(data, *section));
                    }
                }

                Flow {
                    main: paginate(main_blocks, capacity),
                    main_x,
                    side: Some((paginate(side_blocks, capacity), side_x)),
                    band: Some(band),
                    top: theme.margin_top,
                }
            }
        }
    }

    fn page_count(&self) -> usize {
        let side = self.side.as_ref().map(|(l, _)| l.page_count()).unwrap_or(0);
        self.main.page_count().max(side)
    }

    fn columns_for(&self, page: usize) -> Vec<ColumnPaint<'_>> {
        let mut columns = Vec::with_capacity(2);
        if let Some((layout, x)) = &self.side {
            columns.push(ColumnPaint {
                x: *x,
                y: self.top,
                blocks: layout.pages.get(page).map(Vec::as_slice).unwrap_or(&[]),
            });
        }
        columns.push(ColumnPaint {
            x: self.main_x,
            y: self.top,
            blocks: self.main.pages.get(page).map(Vec::as_slice).unwrap_or(&[]),
        });
        columns
    }

    fn items_for(&self, page: usize) -> Vec<PageItem> {
        self.columns_for(page)
            .iter()
            .flat_map(|c| c.blocks.iter().map(|b| b.item.clone()))
            .collect()
    }
}

fn resolve_theme(spec: &VariantSpec, data: &CvData, style: Option<&StyleSettings>) -> Theme {
    Theme::resolve(style.or(data.style_settings.as_ref()), &spec.style)
}

fn info_for(spec: &VariantSpec) -> TemplateInfo {
    TemplateInfo {
        id: spec.id,
        name: spec.name,
        paginated: spec.arrangement != Arrangement::Continuous,
        month_style: spec.month_style,
        columns: if matches!(spec.arrangement, Arrangement::Sidebar { .. }) { 2 } else { 1 },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Template implementations
// ────────────────────────────────────────────────────────────────────────────

/// A4 pages with explicit page surfaces.
pub struct PagedTemplate {
    spec: VariantSpec,
}

impl Template for PagedTemplate {
    fn info(&self) -> TemplateInfo {
        info_for(&self.spec)
    }

    fn default_style(&self) -> &StyleSettings {
        &self.spec.style
    }

    fn render(&self, data: &CvData, style: Option<&StyleSettings>, preview: bool) -> RenderedDocument {
        let theme = resolve_theme(&self.spec, data, style);
        let sections = data.visible_sections();
        let numbered = theme.page_numbers && !preview;
        let footer = if numbered { FOOTER_HEIGHT } else { 0.0 };
        let usable = PAGE_HEIGHT_PX as f32 - theme.margin_top - theme.margin_bottom - footer;
        let capacity = PageCapacity::uniform(usable.max(1.0));

        let flow = Flow::compose(&self.spec, &theme, data, &sections, capacity);
        let count = if preview { 1 } else { flow.page_count() };

        let mut pages = Vec::with_capacity(count);
        let mut bodies = Vec::with_capacity(count);
        for index in 0..count {
            let body = svg::page_body(&PagePaint {
                theme: &theme,
                index,
                count,
                width: PAGE_WIDTH_PX as f32,
                height: PAGE_HEIGHT_PX as f32,
                columns: flow.columns_for(index),
                sidebar_band: flow.band,
                numbered,
            });
            pages.push(PageSurface {
                index,
                surface: svg::document(PAGE_WIDTH_PX, PAGE_HEIGHT_PX, &body),
                items: flow.items_for(index),
            });
            bodies.push(body);
        }

        let page_breaks = if preview { Vec::new() } else { flow.page_breaks() };
        let break_items: Vec<PageItem> = page_breaks.iter().map(|b| b.opens_with.clone()).collect();

        RenderedDocument {
            template: self.spec.id.to_string(),
            preview,
            root: svg::stacked(PAGE_WIDTH_PX, PAGE_HEIGHT_PX, &bodies),
            pages,
            page_breaks,
            markup: render_markup(data, &theme, self.spec.month_style, &sections, &break_items),
        }
    }
}

/// One continuous surface sized to its content. Exports fall back to the root.
pub struct ContinuousTemplate {
    spec: VariantSpec,
}

impl Template for ContinuousTemplate {
    fn info(&self) -> TemplateInfo {
        info_for(&self.spec)
    }

    fn default_style(&self) -> &StyleSettings {
        &self.spec.style
    }

    fn render(&self, data: &CvData, style: Option<&StyleSettings>, preview: bool) -> RenderedDocument {
        let theme = resolve_theme(&self.spec, data, style);
        let sections = data.visible_sections();
        let flow = Flow::compose(
            &self.spec,
            &theme,
            data,
            &sections,
            PageCapacity::uniform(f32::INFINITY),
        );

        let used = flow.main.used.first().copied().unwrap_or(0.0);
        let height = (theme.margin_top + used + theme.margin_bottom).ceil().max(1.0) as u32;
        let body = svg::page_body(&PagePaint {
            theme: &theme,
            index: 0,
            count: 1,
            width: PAGE_WIDTH_PX as f32,
            height: height as f32,
            columns: flow.columns_for(0),
            sidebar_band: None,
            numbered: false,
        });
        let root: Surface = svg::document(PAGE_WIDTH_PX, height, &body);

        RenderedDocument {
            template: self.spec.id.to_string(),
            preview,
            pages: Vec::new(),
            root,
            page_breaks: Vec::new(),
            markup: render_markup(data, &theme, self.spec.month_style, &sections, &[]),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

pub struct TemplateRegistry {
    order: Vec<&'static str>,
    templates: HashMap<&'static str, Arc<dyn Template>>,
}

impl TemplateRegistry {
    pub fn new(variants: Vec<VariantSpec>) -> Self {
        let mut order = Vec::with_capacity(variants.len());
        let mut templates: HashMap<&'static str, Arc<dyn Template>> = HashMap::new();
        for spec in variants {
            let id = spec.id;
            let template: Arc<dyn Template> = match spec.arrangement {
                Arrangement::Continuous => Arc::new(ContinuousTemplate { spec }),
                _ => Arc::new(PagedTemplate { spec }),
            };
            if templates.insert(id, template).is_none() {
                order.push(id);
            }
        }
        Self { order, templates }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_variants())
    }

    /// Case-insensitive lookup.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Template>> {
        let key = id.trim().to_ascii_lowercase();
        self.templates.get(key.as_str()).cloned()
    }

    /// Lookup with the default variant for an absent identifier.
    pub fn get_or_default(&self, id: Option<&str>) -> Option<Arc<dyn Template>> {
        match id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => self.get(id),
            None => self.get(DEFAULT_TEMPLATE),
        }
    }

    pub fn list(&self) -> Vec<TemplateInfo> {
        self.order
            .iter()
            .filter_map(|id| self.templates.get(id))
            .map(|t| t.info())
            .collect()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{CertificationEntry, ExperienceEntry, LanguageEntry};

    fn experience(id: &str) -> ExperienceEntry {
        ExperienceEntry {
            id: id.to_string(),
            company: format!("Company {id}"),
            position: "Engineer".to_string(),
            start_date: "2019-02".to_string(),
            end_date: "2021-11".to_string(),
            description: "Built and operated services.".to_string(),
            highlights: vec!["Shipped things".to_string()],
            ..Default::default()
        }
    }

    fn cv_with_experience(n: usize) -> CvData {
        let mut cv = CvData::default();
        cv.personal_info.full_name = "Jane Doe".to_string();
        cv.personal_info.job_title = "Engineer".to_string();
        cv.experience = (1..=n).map(|i| experience(&format!("exp-{i}"))).collect();
        cv
    }

    fn long_cv() -> CvData {
        let mut cv = cv_with_experience(30);
        for e in &mut cv.experience {
            e.highlights = (0..4)
                .map(|i| format!("Highlight {i} describing measurable impact on a production system"))
                .collect();
        }
        cv
    }

    #[test]
    fn test_registry_has_fifteen_distinct_variants() {
        let registry = TemplateRegistry::builtin();
        let infos = registry.list();
        assert_eq!(infos.len(), 15);
        let mut ids: Vec<&str> = infos.iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 15);
        assert_eq!(infos.iter().filter(|i| !i.paginated).count(), 1);
    }

    #[test]
    fn test_lookup_is_case_insensitive_with_default() {
        let registry = TemplateRegistry::builtin();
        assert!(registry.get(" Sidebar-Left ").is_some());
        assert!(registry.get("nope").is_none());
        let default = registry.get_or_default(None).expect("default template");
        assert_eq!(default.info().id, DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_every_variant_renders_minimal_cv() {
        let registry = TemplateRegistry::builtin();
        let mut cv = CvData::default();
        cv.personal_info.full_name = "Solo".to_string();
        for info in registry.list() {
            let template = registry.get(info.id).expect("registered");
            let doc = template.render(&cv, None, false);
            assert_eq!(doc.template, info.id);
            assert!(doc.root.svg.contains("Solo"), "{} lost the name", info.id);
            if info.paginated {
                assert_eq!(doc.pages.len(), 1, "{}", info.id);
            } else {
                assert!(doc.pages.is_empty());
            }
        }
    }

    #[test]
    fn test_three_experiences_no_certifications_heading() {
        let registry = TemplateRegistry::builtin();
        let cv = cv_with_experience(3);
        assert!(cv.section_order.contains(&"certifications".to_string()));
        for info in registry.list() {
            let doc = registry.get(info.id).expect("registered").render(&cv, None, false);
            let svg = &doc.root.svg;
            for id in ["exp-1", "exp-2", "exp-3"] {
                assert_eq!(
                    svg.matches(&format!("data-entry-id=\"{id}\"")).count(),
                    1,
                    "{}: {id}",
                    info.id
                );
            }
            assert!(!svg.contains("data-section=\"certifications\""), "{}", info.id);
            assert!(!doc.markup.contains("id=\"certifications\""));
        }
    }

    #[test]
    fn test_blank_skills_render_no_heading() {
        let registry = TemplateRegistry::builtin();
        let mut cv = cv_with_experience(1);
        cv.skills.technical = vec![" ".to_string(), String::new()];
        for id in ["classic", "sidebar-left"] {
            let doc = registry.get(id).expect("registered").render(&cv, None, false);
            assert!(!doc.root.svg.contains("data-section=\"skills\""), "{id}");
            assert!(!doc.markup.contains("id=\"skills\""), "{id}");
        }
    }

    #[test]
    fn test_sections_follow_order_and_hidden_sections_are_skipped() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("classic").expect("classic");
        let mut cv = cv_with_experience(1);
        cv.languages.push(LanguageEntry {
            id: "lang-1".to_string(),
            name: "Spanish".to_string(),
            ..Default::default()
        });
        cv.section_order = vec!["languages".to_string(), "experience".to_string()];
        let svg = template.render(&cv, None, false).root.svg;
        let languages = svg.find("data-section=\"languages\"").expect("languages rendered");
        let experience = svg.find("data-section=\"experience\"").expect("experience rendered");
        assert!(languages < experience);

        cv.hidden_sections = vec!["languages".to_string()];
        let svg = template.render(&cv, None, false).root.svg;
        assert!(!svg.contains("data-section=\"languages\""));

        cv.hidden_sections.clear();
        cv.section_order = vec!["experience".to_string()];
        let svg = template.render(&cv, None, false).root.svg;
        assert!(!svg.contains("data-section=\"languages\""));
    }

    #[test]
    fn test_long_cv_paginates_without_overflow() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("classic").expect("classic");
        let doc = template.render(&long_cv(), None, false);
        assert!(doc.pages.len() > 1);
        assert_eq!(doc.page_breaks.len(), doc.pages.len() - 1);
        assert_eq!(doc.root.height, PAGE_HEIGHT_PX * doc.pages.len() as u32);
        for (i, page) in doc.pages.iter().enumerate() {
            assert_eq!(page.index, i);
            assert_eq!((page.surface.width, page.surface.height), (PAGE_WIDTH_PX, PAGE_HEIGHT_PX));
            assert!(!page.items.is_empty());
        }
        assert!(doc.markup.contains("page-break-before"));
    }

    #[test]
    fn test_sidebar_columns_paginate_independently() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("sidebar-right").expect("sidebar-right");
        let mut cv = long_cv();
        cv.skills.technical = vec!["Rust".to_string()];
        let doc = template.render(&cv, None, false);
        assert!(doc.pages.len() > 1);
        assert!(doc.pages[0]
            .items
            .contains(&PageItem::List { section: SectionId::Skills }));
        assert!(doc.pages[0].surface.svg.contains("data-section=\"skills\""));
    }

    #[test]
    fn test_sidebar_overflow_reports_every_break() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("sidebar-left").expect("sidebar-left");
        let mut cv = cv_with_experience(1);
        cv.certifications = (1..=80)
            .map(|i| CertificationEntry {
                id: format!("cert-{i}"),
                name: format!("Certification {i}"),
                issuer: "Issuing Body".to_string(),
                date: "2020-05".to_string(),
                ..Default::default()
            })
            .collect();

        let doc = template.render(&cv, None, false);
        assert!(doc.pages.len() > 1);
        let pages: Vec<usize> = doc.page_breaks.iter().map(|b| b.page).collect();
        assert_eq!(pages, (1..doc.pages.len()).collect::<Vec<_>>());
        assert!(doc.page_breaks.iter().all(|b| matches!(
            b.opens_with,
            PageItem::Entry { section: SectionId::Certifications, .. }
        )));
        assert_eq!(doc.markup.matches("page-break-before").count(), doc.pages.len() - 1);
    }

    #[test]
    fn test_preview_renders_first_page_without_numbers() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("academic").expect("academic");
        assert!(template.default_style().page_numbers);

        let full = template.render(&long_cv(), None, false);
        assert!(full.pages.len() > 1);
        assert!(full.pages[0].surface.svg.contains(&format!(">1 / {}</text>", full.pages.len())));

        let preview = template.render(&long_cv(), None, true);
        assert!(preview.preview);
        assert_eq!(preview.pages.len(), 1);
        assert!(preview.page_breaks.is_empty());
        assert!(!preview.pages[0].surface.svg.contains(" / "));
    }

    #[test]
    fn test_continuous_variant_has_no_pages_and_tall_root() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("web").expect("web");
        let doc = template.render(&long_cv(), None, false);
        assert!(doc.pages.is_empty());
        assert_eq!(doc.page_count(), 1);
        assert!(doc.root.height > PAGE_HEIGHT_PX);
        assert_eq!(doc.root.width, PAGE_WIDTH_PX);
    }

    #[test]
    fn test_image_border_vs_single_border() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("classic").expect("classic");
        let cv = cv_with_experience(1);
        let url = "https://cdn.example.com/paper.png";

        let image = StyleSettings {
            border_mode: BorderMode::Image,
            background_image_url: url.to_string(),
            ..template.default_style().clone()
        };
        let svg = template.render(&cv, Some(&image), false).pages[0].surface.svg.clone();
        assert!(svg.contains(&format!("xlink:href=\"{url}\"")));

        let single = StyleSettings {
            border_mode: BorderMode::Single,
            ..image
        };
        let svg = template.render(&cv, Some(&single), false).pages[0].surface.svg.clone();
        assert!(!svg.contains(url));
        assert!(svg.contains(&format!("stroke=\"{}\" stroke-width=\"3\"", single.accent_color)));
    }

    #[test]
    fn test_embedded_style_used_when_none_given() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("classic").expect("classic");
        let mut cv = cv_with_experience(1);
        cv.style_settings = Some(StyleSettings {
            border_mode: BorderMode::Single,
            accent_color: "#abcdef".to_string(),
            ..Default::default()
        });
        let svg = template.render(&cv, None, false).root.svg;
        assert!(svg.contains("stroke=\"#abcdef\" stroke-width=\"3\""));
    }
}
