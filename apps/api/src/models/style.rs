//! Style Settings: the visual configuration record for a rendered CV.
//!
//! Numeric fields carry a closed range each. Values are clamped when they are
//! written through `set_numeric` and clamped again on read via `clamped()`,
//! because persisted records may predate a range change.
//! Colors are stored as `#rrggbb` (lowercase); shorthand `abc` expands on write.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capitalization {
    #[default]
    Capitalize,
    Uppercase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Only the accent color is taken from the record; the rest come from the template.
    #[default]
    Basic,
    /// All six color fields are honored.
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderMode {
    #[default]
    None,
    Single,
    Multi,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconFill {
    None,
    #[default]
    Outline,
    Filled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconFrame {
    #[default]
    None,
    Circle,
    Square,
    Rounded,
    Diamond,
    Hexagon,
    Octagon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconSize {
    Xs,
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

impl IconSize {
    /// Edge length of the icon box in layout pixels.
    pub fn px(self) -> f32 {
        match self {
            IconSize::Xs => 10.0,
            IconSize::Sm => 12.0,
            IconSize::Md => 14.0,
            IconSize::Lg => 16.0,
            IconSize::Xl => 18.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionIconStyle {
    #[default]
    None,
    Outline,
    Filled,
    Circle,
    Square,
}

/// Proficiency marker rendering for languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    #[default]
    Dots,
    Bars,
    Bubbles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletStyle {
    #[default]
    Disc,
    Circle,
    Square,
    Dash,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryListStyle {
    #[default]
    Bullet,
    Hyphen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

// ────────────────────────────────────────────────────────────────────────────
// Field handles and ranges
// ────────────────────────────────────────────────────────────────────────────

/// Closed numeric interval a style field must lie in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f32,
    pub max: f32,
}

impl NumericRange {
    /// Clamps to the nearest boundary. Non-finite input collapses to `min`.
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumericField {
    BodyFontSize,
    HeadingFontSize,
    LineHeight,
    MarginLeft,
    MarginRight,
    MarginTop,
    MarginBottom,
    EntrySpacing,
    DescriptionIndent,
    DateOpacity,
}

impl NumericField {
    pub const ALL: [NumericField; 10] = [
        NumericField::BodyFontSize,
        NumericField::HeadingFontSize,
        NumericField::LineHeight,
        NumericField::MarginLeft,
        NumericField::MarginRight,
        NumericField::MarginTop,
        NumericField::MarginBottom,
        NumericField::EntrySpacing,
        NumericField::DescriptionIndent,
        NumericField::DateOpacity,
    ];

    pub fn range(self) -> NumericRange {
        let (min, max) = match self {
            NumericField::BodyFontSize => (10.0, 16.0),
            NumericField::HeadingFontSize => (14.0, 26.0),
            NumericField::LineHeight => (1.0, 1.8),
            NumericField::MarginLeft
            | NumericField::MarginRight
            | NumericField::MarginTop
            | NumericField::MarginBottom => (8.0, 24.0),
            NumericField::EntrySpacing => (4.0, 28.0),
            NumericField::DescriptionIndent => (0.0, 32.0),
            NumericField::DateOpacity => (0.2, 1.0),
        };
        NumericRange { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorField {
    Accent,
    Text,
    Background,
    Sidebar,
    Border,
    Secondary,
}

impl ColorField {
    pub const ALL: [ColorField; 6] = [
        ColorField::Accent,
        ColorField::Text,
        ColorField::Background,
        ColorField::Sidebar,
        ColorField::Border,
        ColorField::Secondary,
    ];
}

/// One edit from the editing surface (a slider move, a color pick).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StyleUpdate {
    Numeric { field: NumericField, value: f32 },
    Color { field: ColorField, value: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Style record
// ────────────────────────────────────────────────────────────────────────────

/// Full visual configuration of a rendered CV.
///
/// Every field has a default so partially persisted records deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSettings {
    // typography
    pub body_font: String,
    pub heading_font: String,
    /// px, 10–16
    pub body_font_size: f32,
    /// px, 14–26
    pub heading_font_size: f32,
    pub line_height: f32,
    pub capitalization: Capitalization,

    // spacing (margins in mm, the rest in px)
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub entry_spacing: f32,
    pub description_indent: f32,

    // color
    pub color_mode: ColorMode,
    pub border_mode: BorderMode,
    pub accent_color: String,
    pub text_color: String,
    pub background_color: String,
    pub sidebar_color: String,
    pub border_color: String,
    pub secondary_color: String,
    pub background_image_url: String,
    pub accent_name: bool,
    pub accent_job_title: bool,
    pub accent_headings: bool,
    pub accent_headings_underline: bool,
    pub accent_header_icons: bool,
    pub accent_markers: bool,
    pub accent_dates: bool,
    pub accent_link_icons: bool,
    /// Opacity of dates and locations, 0.2–1.
    pub date_opacity: f32,

    // iconography
    pub icon_fill: IconFill,
    pub icon_frame: IconFrame,
    pub icon_size: IconSize,
    pub section_icon_style: SectionIconStyle,
    pub marker_style: MarkerStyle,
    pub bullet_style: BulletStyle,
    pub entry_list_style: EntryListStyle,

    // layout
    pub align: Align,
    pub headings_line: bool,
    pub name_bold: bool,
    pub page_numbers: bool,
    pub show_email: bool,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            body_font: "inter".to_string(),
            heading_font: "inter".to_string(),
            body_font_size: 12.0,
            heading_font_size: 18.0,
            line_height: 1.4,
            capitalization: Capitalization::Capitalize,
            margin_left: 16.0,
            margin_right: 16.0,
            margin_top: 14.0,
            margin_bottom: 14.0,
            entry_spacing: 12.0,
            description_indent: 12.0,
            color_mode: ColorMode::Basic,
            border_mode: BorderMode::None,
            accent_color: "#2563eb".to_string(),
            text_color: "#1f2937".to_string(),
            background_color: "#ffffff".to_string(),
            sidebar_color: "#f3f4f6".to_string(),
            border_color: "#93c5fd".to_string(),
            secondary_color: "#6b7280".to_string(),
            background_image_url: String::new(),
            accent_name: false,
            accent_job_title: true,
            accent_headings: true,
            accent_headings_underline: true,
            accent_header_icons: true,
            accent_markers: true,
            accent_dates: false,
            accent_link_icons: true,
            date_opacity: 0.8,
            icon_fill: IconFill::Outline,
            icon_frame: IconFrame::None,
            icon_size: IconSize::Md,
            section_icon_style: SectionIconStyle::None,
            marker_style: MarkerStyle::Dots,
            bullet_style: BulletStyle::Disc,
            entry_list_style: EntryListStyle::Bullet,
            align: Align::Left,
            headings_line: true,
            name_bold: true,
            page_numbers: false,
            show_email: true,
        }
    }
}

impl StyleSettings {
    pub fn numeric(&self, field: NumericField) -> f32 {
        match field {
            NumericField::BodyFontSize => self.body_font_size,
            NumericField::HeadingFontSize => self.heading_font_size,
            NumericField::LineHeight => self.line_height,
            NumericField::MarginLeft => self.margin_left,
            NumericField::MarginRight => self.margin_right,
            NumericField::MarginTop => self.margin_top,
            NumericField::MarginBottom => self.margin_bottom,
            NumericField::EntrySpacing => self.entry_spacing,
            NumericField::DescriptionIndent => self.description_indent,
            NumericField::DateOpacity => self.date_opacity,
        }
    }

    fn numeric_mut(&mut self, field: NumericField) -> &mut f32 {
        match field {
            NumericField::BodyFontSize => &mut self.body_font_size,
            NumericField::HeadingFontSize => &mut self.heading_font_size,
            NumericField::LineHeight => &mut self.line_height,
            NumericField::MarginLeft => &mut self.margin_left,
            NumericField::MarginRight => &mut self.margin_right,
            NumericField::MarginTop => &mut self.margin_top,
            NumericField::MarginBottom => &mut self.margin_bottom,
            NumericField::EntrySpacing => &mut self.entry_spacing,
            NumericField::DescriptionIndent => &mut self.description_indent,
            NumericField::DateOpacity => &mut self.date_opacity,
        }
    }

    /// Writes a numeric field, clamped to its range. Returns the stored value.
    pub fn set_numeric(&mut self, field: NumericField, value: f32) -> f32 {
        let clamped = field.range().clamp(value);
        *self.numeric_mut(field) = clamped;
        clamped
    }

    pub fn color(&self, field: ColorField) -> &str {
        match field {
            ColorField::Accent => &self.accent_color,
            ColorField::Text => &self.text_color,
            ColorField::Background => &self.background_color,
            ColorField::Sidebar => &self.sidebar_color,
            ColorField::Border => &self.border_color,
            ColorField::Secondary => &self.secondary_color,
        }
    }

    fn color_mut(&mut self, field: ColorField) -> &mut String {
        match field {
            ColorField::Accent => &mut self.accent_color,
            ColorField::Text => &mut self.text_color,
            ColorField::Background => &mut self.background_color,
            ColorField::Sidebar => &mut self.sidebar_color,
            ColorField::Border => &mut self.border_color,
            ColorField::Secondary => &mut self.secondary_color,
        }
    }

    /// Writes a color field after normalization.
    ///
    /// Returns `false` and leaves the stored value untouched when `raw` is not a
    /// 3- or 6-digit hex color.
    pub fn set_color(&mut self, field: ColorField, raw: &str) -> bool {
        let normalized = normalize_hex(raw);
        if normalized.is_empty() {
            return false;
        }
        *self.color_mut(field) = normalized;
        true
    }

    /// Applies one edit. Returns `false` when the edit was rejected (an
    /// unparseable color); numeric edits are always accepted after clamping.
    pub fn apply(&mut self, update: &StyleUpdate) -> bool {
        match update {
            StyleUpdate::Numeric { field, value } => {
                self.set_numeric(*field, *value);
                true
            }
            StyleUpdate::Color { field, value } => self.set_color(*field, value),
        }
    }

    /// Returns a copy with every numeric field clamped into range and every color
    /// normalized. Colors that fail to normalize are replaced from `fallback`.
    pub fn clamped(&self, fallback: &StyleSettings) -> StyleSettings {
        let mut out = self.clone();
        for field in NumericField::ALL {
            out.set_numeric(field, self.numeric(field));
        }
        for field in ColorField::ALL {
            if !out.set_color(field, self.color(field)) {
                let replacement = normalize_hex(fallback.color(field));
                *out.color_mut(field) = replacement;
            }
        }
        out.background_image_url = self.background_image_url.trim().to_string();
        out
    }
}

/// Normalizes a hex color to `#rrggbb` lowercase.
///
/// Accepts an optional leading `#` and 3-digit shorthand. Anything else yields
/// an empty string.
pub fn normalize_hex(raw: &str) -> String {
    let digits = raw.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return String::new();
    }
    match digits.len() {
        3 => {
            let mut out = String::with_capacity(7);
            out.push('#');
            for c in digits.chars() {
                let c = c.to_ascii_lowercase();
                out.push(c);
                out.push(c);
            }
            out
        }
        6 => format!("#{}", digits.to_ascii_lowercase()),
        _ => String::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
