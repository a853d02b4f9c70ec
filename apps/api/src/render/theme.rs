//! Resolves a style record into the concrete values the painters use.
//!
//! Stored styles are clamped on read here. Accent flags are applied one target
//! at a time; no flag affects any other target.

use crate::layout::{css_font_stack, mm_to_px, FontMetrics};
use crate::models::style::{
    Align, BorderMode, BulletStyle, Capitalization, ColorMode, EntryListStyle,
    IconFill, IconFrame, MarkerStyle, SectionIconStyle, StyleSettings,
};

use super::svg::is_embeddable_image;

#[derive(Debug, Clone, PartialEq)]
pub enum PageBorder {
    None,
    Single { color: String },
    Multi { colors: Vec<String> },
    Image { url: String },
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub body_font: String,
    pub heading_font: String,
    pub body_metrics: FontMetrics,
    pub heading_metrics: FontMetrics,
    pub body_size: f32,
    pub heading_size: f32,
    pub line_height: f32,
    pub capitalization: Capitalization,

    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub entry_spacing: f32,
    pub description_indent: f32,

    pub accent: String,
    pub text: String,
    pub secondary: String,
    pub background: String,
    pub sidebar: String,

    pub name_color: String,
    pub job_title_color: String,
    pub heading_color: String,
    pub rule_color: String,
    pub header_icon_color: String,
    pub link_icon_color: String,
    pub marker_color: String,
    pub date_color: String,
    pub date_opacity: f32,
    pub border: PageBorder,

    pub icon_fill: IconFill,
    pub icon_frame: IconFrame,
    pub icon_size: f32,
    pub section_icon: SectionIconStyle,
    pub marker_style: MarkerStyle,
    pub bullet_style: BulletStyle,
    pub entry_list_style: EntryListStyle,

    pub align: Align,
    pub headings_line: bool,
    pub name_bold: bool,
    pub page_numbers: bool,
    pub show_email: bool,
}

fn pick(flag: bool, accent: &str, otherwise: &str) -> String {
    if flag {
        accent.to_string()
    } else {
        otherwise.to_string()
    }
}

impl Theme {
    /// Builds the theme for one render.
    ///
    /// `style` absent → the variant's `defaults` are used as-is. In basic color
    /// mode only the accent comes from `style`; the other colors stay at the
    /// variant's defaults.
    pub fn resolve(style: Option<&StyleSettings>, defaults: &StyleSettings) -> Theme {
        let defaults = defaults.clamped(&StyleSettings::default());
        let s = match style {
            Some(style) => style.clamped(&defaults),
            None => defaults.clone(),
        };

        let palette = match s.color_mode {
            ColorMode::Advanced => &s,
            ColorMode::Basic => &defaults,
        };
        let accent = s.accent_color.clone();
        let text = palette.text_color.clone();
        let secondary = palette.secondary_color.clone();
        let border_color = palette.border_color.clone();

        let border = match s.border_mode {
            BorderMode::None => PageBorder::None,
            BorderMode::Single => PageBorder::Single {
                color: accent.clone(),
            },
            BorderMode::Multi => PageBorder::Multi {
                colors: vec![accent.clone(), border_color.clone(), secondary.clone()],
            },
            BorderMode::Image if is_embeddable_image(&s.background_image_url) => PageBorder::Image {
                url: s.background_image_url.clone(),
            },
            BorderMode::Image => PageBorder::None,
        };

        Theme {
            body_font: css_font_stack(&s.body_font),
            heading_font: css_font_stack(&s.heading_font),
            body_metrics: FontMetrics::for_identifier(&s.body_font),
            heading_metrics: FontMetrics::for_identifier(&s.heading_font),
            body_size: s.body_font_size,
            heading_size: s.heading_font_size,
            line_height: s.line_height,
            capitalization: s.capitalization,

            margin_left: mm_to_px(s.margin_left),
            margin_right: mm_to_px(s.margin_right),
            margin_top: mm_to_px(s.margin_top),
            margin_bottom: mm_to_px(s.margin_bottom),
            entry_spacing: s.entry_spacing,
            description_indent: s.description_indent,

            name_color: pick(s.accent_name, &accent, &text),
            job_title_color: pick(s.accent_job_title, &accent, &secondary),
            heading_color: pick(s.accent_headings, &accent, &text),
            rule_color: pick(s.accent_headings_underline, &accent, &border_color),
            header_icon_color: pick(s.accent_header_icons, &accent, &secondary),
            link_icon_color: pick(s.accent_link_icons, &accent, &secondary),
            marker_color: pick(s.accent_markers, &accent, &text),
            date_color: pick(s.accent_dates, &accent, &secondary),
            date_opacity: s.date_opacity,
            border,

            background: palette.background_color.clone(),
            sidebar: palette.sidebar_color.clone(),
            accent,
            text,
            secondary,

            icon_fill: s.icon_fill,
            icon_frame: s.icon_frame,
            icon_size: s.icon_size.px(),
            section_icon: s.section_icon_style,
            marker_style: s.marker_style,
            bullet_style: s.bullet_style,
            entry_list_style: s.entry_list_style,

            align: s.align,
            headings_line: s.headings_line,
            name_bold: s.name_bold,
            page_numbers: s.page_numbers,
            show_email: s.show_email,
        }
    }

    /// Applies heading capitalization.
    pub fn heading_text(&self, raw: &str) -> String {
        match self.capitalization {
            Capitalization::Uppercase => raw.to_uppercase(),
            Capitalization::Capitalize => raw
                .split(' ')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<String>>()
                .join(" "),
        }
    }

    /// Height of one body text line.
    pub fn body_line(&self) -> f32 {
        self.body_size * self.line_height
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
