//! Block composition: CV content → measured rows of draw ops.
//!
//! Everything here works in column coordinates (x from the column's left edge,
//! y from the row top). The paginator stacks rows; the painter turns ops into
//! SVG. Composition never looks at page geometry except for full-bleed header
//! bands, which deliberately paint outside the column.

use crate::layout::{Block, DrawOp, FontMetrics, PageItem, Row, TextAnchor, TextStyle, PAGE_WIDTH_PX};
use crate::models::cv::{
    CertificationEntry, CvData, EducationEntry, ExperienceEntry, LanguageEntry, PersonalField,
    ProjectEntry, SectionId,
};
use crate::models::style::{
    Align, BulletStyle, EntryListStyle, IconFill, IconFrame, MarkerStyle, SectionIconStyle,
};

use super::dates::{format_date, format_date_range, MonthStyle};
use super::svg::is_embeddable_image;
use super::theme::Theme;

const PHOTO_SIZE: f32 = 72.0;
const PHOTO_GAP: f32 = 16.0;
const TIMELINE_GUTTER: f32 = 18.0;
const TIMELINE_RAIL_X: f32 = 5.0;
/// Width reserved for a list marker in front of a bullet line.
const MARKER_COLUMN: f32 = 12.0;
const CONTACT_GAP: f32 = 14.0;
const INLINE_SEPARATOR: &str = " · ";
const WHITE: &str = "#ffffff";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// Name, title and a contact line stacked in the configured alignment.
    Stacked,
    /// Name and title on the left, contacts stacked on the right.
    Split,
    /// `Stacked` on a full-bleed accent band.
    Banner,
    /// Name and title only; contacts live in a sidebar.
    NameOnly,
}

pub struct Composer<'a> {
    theme: &'a Theme,
    month: MonthStyle,
    width: f32,
    timeline: bool,
}

#[derive(Clone)]
struct Paint {
    fill: Option<String>,
    stroke: Option<String>,
}

impl<'a> Composer<'a> {
    pub fn new(theme: &'a Theme, month: MonthStyle, width: f32, timeline: bool) -> Self {
        Self {
            theme,
            month,
            width,
            timeline,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Text primitives
    // ────────────────────────────────────────────────────────────────────────

    fn body_style(&self, color: &str) -> TextStyle {
        TextStyle {
            font: self.theme.body_font.clone(),
            size: self.theme.body_size,
            bold: false,
            italic: false,
            color: color.to_string(),
            opacity: 1.0,
        }
    }

    fn heading_style(&self, color: &str, size: f32, bold: bool) -> TextStyle {
        TextStyle {
            font: self.theme.heading_font.clone(),
            size,
            bold,
            italic: false,
            color: color.to_string(),
            opacity: 1.0,
        }
    }

    fn date_style(&self) -> TextStyle {
        TextStyle {
            size: self.theme.body_size * 0.92,
            opacity: self.theme.date_opacity,
            ..self.body_style(&self.theme.date_color)
        }
    }

    fn metrics_for(&self, style: &TextStyle) -> &FontMetrics {
        if style.font == self.theme.heading_font {
            &self.theme.heading_metrics
        } else {
            &self.theme.body_metrics
        }
    }

    fn measure(&self, text: &str, style: &TextStyle) -> f32 {
        self.metrics_for(style)
            .measure_px(text, style.size, style.bold)
    }

    fn line_height(&self, style: &TextStyle) -> f32 {
        style.size * self.theme.line_height
    }

    fn baseline(&self, style: &TextStyle, row_height: f32) -> f32 {
        row_height / 2.0 + style.size * 0.35
    }

    fn text_op(&self, text: impl Into<String>, style: &TextStyle, x: f32, y: f32, anchor: TextAnchor) -> DrawOp {
        DrawOp::Text {
            x,
            y,
            text: text.into(),
            style: style.clone(),
            anchor,
        }
    }

    fn line(&self, text: impl Into<String>, style: &TextStyle, x: f32, anchor: TextAnchor) -> Row {
        let height = self.line_height(style);
        Row {
            height,
            ops: vec![self.text_op(text, style, x, self.baseline(style, height), anchor)],
        }
    }

    /// Wrapped paragraph starting at `x`, one row per printed line.
    fn paragraph(&self, text: &str, style: &TextStyle, x: f32) -> Vec<Row> {
        let max_width = (self.width - x).max(1.0);
        self.metrics_for(style)
            .wrap(text, style.size, style.bold, max_width)
            .into_iter()
            .map(|line| self.line(line, style, x, TextAnchor::Start))
            .collect()
    }

    /// Left text wrapped beside an end-anchored right text on the first row.
    fn split_rows(&self, left: &str, left_style: &TextStyle, right: &str, right_style: &TextStyle, x: f32) -> Vec<Row> {
        let right_width = if right.is_empty() {
            0.0
        } else {
            self.measure(right, right_style) + 8.0
        };
        let max_width = (self.width - x - right_width).max(1.0);
        let mut lines = self
            .metrics_for(left_style)
            .wrap(left, left_style.size, left_style.bold, max_width);
        if lines.is_empty() && !right.is_empty() {
            lines.push(String::new());
        }

        let mut rows = Vec::with_capacity(lines.len());
        for (i, text) in lines.into_iter().enumerate() {
            let mut height = self.line_height(left_style);
            if i == 0 && !right.is_empty() {
                height = height.max(self.line_height(right_style));
            }
            let baseline = self.baseline(left_style, height);
            let mut ops = Vec::new();
            if !text.is_empty() {
                ops.push(self.text_op(text, left_style, x, baseline, TextAnchor::Start));
            }
            if i == 0 && !right.is_empty() {
                ops.push(self.text_op(right, right_style, self.width, baseline, TextAnchor::End));
            }
            rows.push(Row { height, ops });
        }
        rows
    }

    fn entry_x(&self) -> f32 {
        if self.timeline {
            TIMELINE_GUTTER
        } else {
            0.0
        }
    }

    fn entry_block(&self, item: PageItem, mut rows: Vec<Row>) -> Block {
        if self.timeline {
            self.add_rail(&mut rows);
        }
        let mut block = Block::new(item);
        block.rows = rows;
        block.space_after = self.theme.entry_spacing;
        block
    }

    fn add_rail(&self, rows: &mut [Row]) {
        for (i, row) in rows.iter_mut().enumerate() {
            row.ops.insert(
                0,
                DrawOp::Line {
                    x1: TIMELINE_RAIL_X,
                    y1: 0.0,
                    x2: TIMELINE_RAIL_X,
                    y2: row.height,
                    color: self.theme.rule_color.clone(),
                    width: 1.5,
                },
            );
            if i == 0 {
                row.ops.push(DrawOp::Circle {
                    cx: TIMELINE_RAIL_X,
                    cy: row.height / 2.0,
                    r: 4.0,
                    fill: Some(self.theme.marker_color.clone()),
                    stroke: Some(self.theme.background.clone()),
                    stroke_width: 1.5,
                });
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Header
    // ────────────────────────────────────────────────────────────────────────

    pub fn header(&self, data: &CvData, kind: HeaderKind) -> Block {
        let mut block = Block::new(PageItem::Header);
        block.rows = match kind {
            HeaderKind::Split => self.split_header(data),
            HeaderKind::Banner => self.banner_header(data),
            HeaderKind::Stacked | HeaderKind::NameOnly => {
                self.stacked_header(data, kind == HeaderKind::Stacked, None)
            }
        };
        block.space_after = self.theme.entry_spacing + 8.0;
        block
    }

    fn name_style(&self, color: &str) -> TextStyle {
        self.heading_style(color, self.theme.heading_size * 1.6, self.theme.name_bold)
    }

    fn title_style(&self, color: &str) -> TextStyle {
        TextStyle {
            size: self.theme.body_size * 1.25,
            ..self.body_style(color)
        }
    }

    /// `on_band` recolors every header element to white.
    fn stacked_header(&self, data: &CvData, with_contacts: bool, on_band: Option<&str>) -> Vec<Row> {
        let info = &data.personal_info;
        let photo = info.profile_picture.trim();
        let has_photo = is_embeddable_image(photo);
        let align = self.theme.align;

        let (mut left, mut right) = (0.0, self.width);
        let mut rows = Vec::new();
        if has_photo {
            match align {
                Align::Left => left = PHOTO_SIZE + PHOTO_GAP,
                Align::Right => right = self.width - PHOTO_SIZE - PHOTO_GAP,
                Align::Center => rows.push(Row {
                    height: PHOTO_SIZE + 8.0,
                    ops: vec![self.photo_op(photo, (self.width - PHOTO_SIZE) / 2.0)],
                }),
            }
        }
        let (x, anchor) = match align {
            Align::Left => (left, TextAnchor::Start),
            Align::Center => ((left + right) / 2.0, TextAnchor::Middle),
            Align::Right => (right, TextAnchor::End),
        };

        let name_color = on_band.unwrap_or(&self.theme.name_color);
        let title_color = on_band.unwrap_or(&self.theme.job_title_color);
        let text_top = rows.len();

        if !info.full_name.trim().is_empty() {
            rows.push(self.line(info.full_name.trim(), &self.name_style(name_color), x, anchor));
        }
        if !info.job_title.trim().is_empty() {
            rows.push(self.line(info.job_title.trim(), &self.title_style(title_color), x, anchor));
        }
        if with_contacts {
            rows.extend(self.contact_lines(data, left, right - left, align, on_band));
        }

        if has_photo && align != Align::Center {
            let text_height: f32 = rows[text_top..].iter().map(|r| r.height).sum();
            if text_height < PHOTO_SIZE {
                rows.push(Row {
                    height: PHOTO_SIZE - text_height,
                    ops: Vec::new(),
                });
            }
            let photo_x = if align == Align::Left { 0.0 } else { self.width - PHOTO_SIZE };
            let photo_op = self.photo_op(photo, photo_x);
            match rows.get_mut(text_top) {
                Some(row) => row.ops.insert(0, photo_op),
                None => rows.push(Row {
                    height: PHOTO_SIZE,
                    ops: vec![photo_op],
                }),
            }
        }
        rows
    }

    fn banner_header(&self, data: &CvData) -> Vec<Row> {
        let mut rows = self.stacked_header(data, true, Some(WHITE));
        rows.push(Row {
            height: 12.0,
            ops: Vec::new(),
        });
        let height: f32 = rows.iter().map(|r| r.height).sum();
        let band = DrawOp::Rect {
            x: -self.theme.margin_left,
            y: -self.theme.margin_top,
            w: PAGE_WIDTH_PX as f32,
            h: height + self.theme.margin_top,
            radius: 0.0,
            fill: Some(self.theme.accent.clone()),
            stroke: None,
            stroke_width: 0.0,
        };
        if let Some(first) = rows.first_mut() {
            first.ops.insert(0, band);
        }
        rows
    }

    fn split_header(&self, data: &CvData) -> Vec<Row> {
        let info = &data.personal_info;
        let mut left: Vec<(String, TextStyle)> = Vec::new();
        if !info.full_name.trim().is_empty() {
            left.push((info.full_name.trim().to_string(), self.name_style(&self.theme.name_color)));
        }
        if !info.job_title.trim().is_empty() {
            left.push((
                info.job_title.trim().to_string(),
                self.title_style(&self.theme.job_title_color),
            ));
        }
        let contacts = data.contact_fields(self.theme.show_email);
        let contact_style = self.contact_style(None);

        let count = left.len().max(contacts.len());
        let mut rows = Vec::with_capacity(count);
        for i in 0..count {
            let left_height = left.get(i).map(|(_, s)| self.line_height(s)).unwrap_or(0.0);
            let right_height = if i < contacts.len() {
                self.line_height(&contact_style).max(self.theme.icon_size + 4.0)
            } else {
                0.0
            };
            let height = left_height.max(right_height);
            let mut ops = Vec::new();
            if let Some((text, style)) = left.get(i) {
                ops.push(self.text_op(text.clone(), style, 0.0, self.baseline(style, height), TextAnchor::Start));
            }
            if let Some((field, value)) = contacts.get(i) {
                let text_width = self.measure(value, &contact_style);
                let icon_width = self.icon_width();
                let start = self.width - text_width - icon_width;
                ops.extend(self.contact_icon(*field, start, height / 2.0, None));
                ops.push(self.text_op(
                    *value,
                    &contact_style,
                    self.width,
                    self.baseline(&contact_style, height),
                    TextAnchor::End,
                ));
            }
            rows.push(Row { height, ops });
        }
        rows
    }

    fn photo_op(&self, href: &str, x: f32) -> DrawOp {
        DrawOp::Image {
            x,
            y: 0.0,
            w: PHOTO_SIZE,
            h: PHOTO_SIZE,
            href: href.to_string(),
            circular: true,
        }
    }

    fn contact_style(&self, on_band: Option<&str>) -> TextStyle {
        TextStyle {
            size: self.theme.body_size * 0.92,
            ..self.body_style(on_band.unwrap_or(&self.theme.text))
        }
    }

    fn icon_width(&self) -> f32 {
        if self.theme.icon_fill == IconFill::None {
            0.0
        } else {
            self.theme.icon_size + 4.0
        }
    }

    /// Contact items packed into lines of at most `width`, aligned as a group.
    fn contact_lines(&self, data: &CvData, x0: f32, width: f32, align: Align, on_band: Option<&str>) -> Vec<Row> {
        let style = self.contact_style(on_band);
        let icon_width = self.icon_width();
        let items: Vec<(PersonalField, &str, f32)> = data
            .contact_fields(self.theme.show_email)
            .into_iter()
            .map(|(field, value)| (field, value, icon_width + self.measure(value, &style)))
            .collect();

        let mut lines: Vec<Vec<(PersonalField, &str, f32)>> = Vec::new();
        let mut current: Vec<(PersonalField, &str, f32)> = Vec::new();
        let mut used = 0.0;
        for item in items {
            let extra = if current.is_empty() { item.2 } else { CONTACT_GAP + item.2 };
            if !current.is_empty() && used + extra > width {
                lines.push(std::mem::take(&mut current));
                used = item.2;
            } else {
                used += extra;
            }
            current.push(item);
        }
        if !current.is_empty() {
            lines.push(current);
        }

        let height = self.line_height(&style).max(self.theme.icon_size + 4.0);
        lines
            .into_iter()
            .map(|line| {
                let total: f32 = line.iter().map(|(_, _, w)| w).sum::<f32>()
                    + CONTACT_GAP * (line.len().saturating_sub(1)) as f32;
                let mut x = match align {
                    Align::Left => x0,
                    Align::Center => x0 + (width - total) / 2.0,
                    Align::Right => x0 + width - total,
                };
                let mut ops = Vec::new();
                for (field, value, item_width) in line {
                    ops.extend(self.contact_icon(field, x, height / 2.0, on_band));
                    ops.push(self.text_op(
                        value,
                        &style,
                        x + icon_width,
                        self.baseline(&style, height),
                        TextAnchor::Start,
                    ));
                    x += item_width + CONTACT_GAP;
                }
                Row { height, ops }
            })
            .collect()
    }

    /// Sidebar contact list: optional photo, then one contact per line.
    pub fn contact_column(&self, data: &CvData) -> Option<Block> {
        let style = self.contact_style(None);
        let icon_width = self.icon_width();
        let mut rows = Vec::new();

        let photo = data.personal_info.profile_picture.trim();
        if is_embeddable_image(photo) {
            rows.push(Row {
                height: PHOTO_SIZE + 12.0,
                ops: vec![self.photo_op(photo, (self.width - PHOTO_SIZE) / 2.0)],
            });
        }

        for (field, value) in data.contact_fields(self.theme.show_email) {
            let mut lines = self.paragraph(value, &style, icon_width);
            if let Some(first) = lines.first_mut() {
                let height = first.height.max(self.theme.icon_size + 4.0);
                let baseline = self.baseline(&style, height);
                for op in &mut first.ops {
                    if let DrawOp::Text { y, .. } = op {
                        *y = baseline;
                    }
                }
                first.height = height;
                first.ops.extend(self.contact_icon(field, 0.0, height / 2.0, None));
            }
            rows.extend(lines);
        }

        if rows.is_empty() {
            return None;
        }
        let mut block = Block::new(PageItem::Header);
        block.rows = rows;
        block.space_after = self.theme.entry_spacing + 8.0;
        Some(block)
    }

    pub fn summary(&self, data: &CvData) -> Option<Block> {
        let text = data.personal_info.summary.trim();
        if text.is_empty() {
            return None;
        }
        let mut block = Block::new(PageItem::Summary);
        block.rows = self.paragraph(text, &self.body_style(&self.theme.text), 0.0);
        block.space_after = self.theme.entry_spacing + 4.0;
        Some(block)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Sections
    // ────────────────────────────────────────────────────────────────────────

    /// Heading plus every entry of `section`. Callers only pass visible sections.
    pub fn section(&self, data: &CvData, section: SectionId) -> Vec<Block> {
        let mut blocks = vec![self.heading(section)];
        match section {
            SectionId::Experience => {
                blocks.extend(data.experience.iter().map(|e| self.experience(e)));
            }
            SectionId::Education => {
                blocks.extend(data.education.iter().map(|e| self.education(e)));
            }
            SectionId::Certifications => {
                blocks.extend(data.certifications.iter().map(|c| self.certification(c)));
            }
            SectionId::Projects => {
                blocks.extend(data.projects.iter().map(|p| self.project(p)));
            }
            SectionId::Skills => blocks.extend(self.skills(data)),
            SectionId::Languages => {
                blocks.extend(data.languages.iter().map(|l| self.language(l)));
            }
            SectionId::Interests => blocks.extend(self.interests(data)),
        }
        if let Some(last) = blocks.last_mut() {
            last.space_after = self.theme.entry_spacing + 8.0;
        }
        blocks
    }

    fn heading(&self, section: SectionId) -> Block {
        let size = self.theme.heading_size;
        let style = self.heading_style(&self.theme.heading_color, size, true);
        let mut height = size * 1.5;
        let baseline = self.baseline(&style, height);
        let mut ops = Vec::new();

        let mut x = 0.0;
        if self.theme.section_icon != SectionIconStyle::None {
            let box_size = size * 0.9;
            ops.extend(self.section_icon(section, box_size, height / 2.0));
            x = box_size + 8.0;
        }
        ops.push(self.text_op(
            self.theme.heading_text(section.title()),
            &style,
            x,
            baseline,
            TextAnchor::Start,
        ));
        if self.theme.headings_line {
            height += 4.0;
            ops.push(DrawOp::Line {
                x1: 0.0,
                y1: height - 2.0,
                x2: self.width,
                y2: height - 2.0,
                color: self.theme.rule_color.clone(),
                width: 1.2,
            });
        }

        let mut block = Block::new(PageItem::Heading { section });
        block.rows = vec![Row { height, ops }];
        block.space_after = 6.0;
        block.keep_with_next = true;
        block
    }

    fn section_icon(&self, section: SectionId, size: f32, cy: f32) -> Vec<DrawOp> {
        let color = self.theme.heading_color.clone();
        let initial: String = section.title().chars().take(1).collect();
        let (shape, glyph_color) = match self.theme.section_icon {
            SectionIconStyle::None => return Vec::new(),
            SectionIconStyle::Outline => (
                DrawOp::Rect {
                    x: 0.0,
                    y: cy - size / 2.0,
                    w: size,
                    h: size,
                    radius: size * 0.2,
                    fill: None,
                    stroke: Some(color.clone()),
                    stroke_width: 1.2,
                },
                color.clone(),
            ),
            SectionIconStyle::Filled => (
                DrawOp::Rect {
                    x: 0.0,
                    y: cy - size / 2.0,
                    w: size,
                    h: size,
                    radius: size * 0.2,
                    fill: Some(color.clone()),
                    stroke: None,
                    stroke_width: 0.0,
                },
                WHITE.to_string(),
            ),
            SectionIconStyle::Circle => (
                DrawOp::Circle {
                    cx: size / 2.0,
                    cy,
                    r: size / 2.0,
                    fill: Some(color.clone()),
                    stroke: None,
                    stroke_width: 0.0,
                },
                WHITE.to_string(),
            ),
            SectionIconStyle::Square => (
                DrawOp::Rect {
                    x: 0.0,
                    y: cy - size / 2.0,
                    w: size,
                    h: size,
                    radius: 0.0,
                    fill: Some(color.clone()),
                    stroke: None,
                    stroke_width: 0.0,
                },
                WHITE.to_string(),
            ),
        };
        let glyph = self.heading_style(&glyph_color, size * 0.6, true);
        vec![
            shape,
            self.text_op(initial, &glyph, size / 2.0, cy + size * 0.21, TextAnchor::Middle),
        ]
    }

    fn entry_title_style(&self) -> TextStyle {
        TextStyle {
            size: self.theme.body_size * 1.05,
            bold: true,
            ..self.body_style(&self.theme.text)
        }
    }

    fn meta_rows(&self, left: &str, right: &str, x: f32) -> Vec<Row> {
        if left.trim().is_empty() && right.trim().is_empty() {
            return Vec::new();
        }
        let left_style = self.body_style(&self.theme.text);
        let right_style = TextStyle {
            color: self.theme.secondary.clone(),
            ..self.date_style()
        };
        self.split_rows(left.trim(), &left_style, right.trim(), &right_style, x)
    }

    fn description_rows(&self, text: &str, x: f32) -> Vec<Row> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        self.paragraph(text, &self.body_style(&self.theme.text), x)
    }

    fn bullet_rows(&self, items: &[String], x: f32) -> Vec<Row> {
        let style = self.body_style(&self.theme.text);
        let mut rows = Vec::new();
        for item in items.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
            let mut lines = self.paragraph(item, &style, x + MARKER_COLUMN);
            if let Some(first) = lines.first_mut() {
                let cy = first.height / 2.0;
                first.ops.extend(self.bullet_ops(x, cy));
            }
            rows.extend(lines);
        }
        rows
    }

    fn bullet_ops(&self, x: f32, cy: f32) -> Vec<DrawOp> {
        let color = self.theme.marker_color.clone();
        if self.theme.entry_list_style == EntryListStyle::Hyphen {
            let style = self.body_style(&self.theme.marker_color);
            return vec![self.text_op("-", &style, x, cy + style.size * 0.35, TextAnchor::Start)];
        }
        match self.theme.bullet_style {
            BulletStyle::Disc => vec![DrawOp::Circle {
                cx: x + 2.5,
                cy,
                r: 2.2,
                fill: Some(color),
                stroke: None,
                stroke_width: 0.0,
            }],
            BulletStyle::Circle => vec![DrawOp::Circle {
                cx: x + 2.5,
                cy,
                r: 2.4,
                fill: None,
                stroke: Some(color),
                stroke_width: 1.0,
            }],
            BulletStyle::Square => vec![DrawOp::Rect {
                x,
                y: cy - 2.0,
                w: 4.0,
                h: 4.0,
                radius: 0.0,
                fill: Some(color),
                stroke: None,
                stroke_width: 0.0,
            }],
            BulletStyle::Dash => vec![DrawOp::Line {
                x1: x,
                y1: cy,
                x2: x + 6.0,
                y2: cy,
                color,
                width: 1.2,
            }],
            BulletStyle::Arrow => vec![DrawOp::Polygon {
                points: vec![(x, cy - 3.0), (x + 5.0, cy), (x, cy + 3.0)],
                fill: Some(color),
                stroke: None,
                stroke_width: 0.0,
            }],
        }
    }

    fn link_rows(&self, url: &str, x: f32) -> Vec<Row> {
        let url = url.trim();
        if url.is_empty() {
            return Vec::new();
        }
        let style = TextStyle {
            size: self.theme.body_size * 0.92,
            ..self.body_style(&self.theme.link_icon_color)
        };
        self.paragraph(url, &style, x)
    }

    fn title_rows(&self, title: &str, dates: &str, x: f32) -> Vec<Row> {
        self.split_rows(title.trim(), &self.entry_title_style(), dates, &self.date_style(), x)
    }

    fn experience(&self, e: &ExperienceEntry) -> Block {
        let x = self.entry_x();
        let dates = format_date_range(&e.start_date, &e.end_date, e.current, self.month);
        let (title, company) = if e.position.trim().is_empty() {
            (e.company.as_str(), "")
        } else {
            (e.position.as_str(), e.company.as_str())
        };
        let mut rows = self.title_rows(title, &dates, x);
        rows.extend(self.meta_rows(company, &e.location, x));
        let indent = x + self.theme.description_indent;
        rows.extend(self.description_rows(&e.description, indent));
        rows.extend(self.bullet_rows(&e.highlights, indent));
        self.entry_block(
            PageItem::Entry {
                section: SectionId::Experience,
                id: e.id.clone(),
            },
            rows,
        )
    }

    fn education(&self, e: &EducationEntry) -> Block {
        let x = self.entry_x();
        let dates = format_date_range(&e.start_date, &e.end_date, e.current, self.month);
        let title = match (e.degree.trim(), e.field.trim()) {
            ("", "") => e.institution.trim().to_string(),
            (degree, "") => degree.to_string(),
            ("", field) => field.to_string(),
            (degree, field) => format!("{degree}, {field}"),
        };
        let institution = if title == e.institution.trim() { "" } else { e.institution.as_str() };
        let mut rows = self.title_rows(&title, &dates, x);
        rows.extend(self.meta_rows(institution, &e.location, x));
        let indent = x + self.theme.description_indent;
        if !e.gpa.trim().is_empty() {
            let style = self.body_style(&self.theme.secondary);
            rows.extend(self.paragraph(&format!("GPA: {}", e.gpa.trim()), &style, indent));
        }
        rows.extend(self.description_rows(&e.description, indent));
        self.entry_block(
            PageItem::Entry {
                section: SectionId::Education,
                id: e.id.clone(),
            },
            rows,
        )
    }

    fn certification(&self, c: &CertificationEntry) -> Block {
        let x = self.entry_x();
        let date = format_date(&c.date, self.month);
        let mut rows = self.title_rows(&c.name, &date, x);
        rows.extend(self.meta_rows(&c.issuer, "", x));
        rows.extend(self.link_rows(&c.url, x + self.theme.description_indent));
        self.entry_block(
            PageItem::Entry {
                section: SectionId::Certifications,
                id: c.id.clone(),
            },
            rows,
        )
    }

    fn project(&self, p: &ProjectEntry) -> Block {
        let x = self.entry_x();
        let dates = format_date_range(&p.start_date, &p.end_date, p.current, self.month);
        let title = match (p.name.trim(), p.role.trim()) {
            (name, "") => name.to_string(),
            (name, role) => format!("{name}{INLINE_SEPARATOR}{role}"),
        };
        let mut rows = self.title_rows(&title, &dates, x);
        let indent = x + self.theme.description_indent;
        rows.extend(self.description_rows(&p.description, indent));
        let technologies: Vec<&str> = p
            .technologies
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if !technologies.is_empty() {
            let style = TextStyle {
                italic: true,
                ..self.body_style(&self.theme.secondary)
            };
            let text = format!("Technologies: {}", technologies.join(", "));
            rows.extend(self.paragraph(&text, &style, indent));
        }
        rows.extend(self.link_rows(&p.url, indent));
        self.entry_block(
            PageItem::Entry {
                section: SectionId::Projects,
                id: p.id.clone(),
            },
            rows,
        )
    }

    fn inline_list(&self, items: &[String]) -> String {
        items
            .iter()
            .map(|i| i.trim())
            .filter(|i| !i.is_empty())
            .collect::<Vec<_>>()
            .join(INLINE_SEPARATOR)
    }

    fn skills(&self, data: &CvData) -> Option<Block> {
        let technical = self.inline_list(&data.skills.technical);
        let soft = self.inline_list(&data.skills.soft);
        let labelled = !technical.is_empty() && !soft.is_empty();
        let label_style = TextStyle {
            bold: true,
            ..self.body_style(&self.theme.text)
        };
        let body = self.body_style(&self.theme.text);

        let mut rows = Vec::new();
        for (label, text) in [("Technical", technical), ("Soft skills", soft)] {
            if text.is_empty() {
                continue;
            }
            if labelled {
                rows.extend(self.paragraph(label, &label_style, 0.0));
            }
            rows.extend(self.paragraph(&text, &body, 0.0));
        }
        if rows.is_empty() {
            return None;
        }
        let mut block = Block::new(PageItem::List {
            section: SectionId::Skills,
        });
        block.rows = rows;
        block.space_after = self.theme.entry_spacing;
        Some(block)
    }

    fn interests(&self, data: &CvData) -> Option<Block> {
        let text = self.inline_list(&data.additional.interests);
        if text.is_empty() {
            return None;
        }
        let mut block = Block::new(PageItem::List {
            section: SectionId::Interests,
        });
        block.rows = self.paragraph(&text, &self.body_style(&self.theme.text), 0.0);
        block.space_after = self.theme.entry_spacing;
        Some(block)
    }

    fn language(&self, l: &LanguageEntry) -> Block {
        let name_style = self.body_style(&self.theme.text);
        let label_style = TextStyle {
            color: self.theme.secondary.clone(),
            ..self.date_style()
        };
        let height = self.line_height(&name_style).max(14.0);
        let baseline = self.baseline(&name_style, height);
        let name = l.name.trim();

        let mut ops = vec![self.text_op(name, &name_style, 0.0, baseline, TextAnchor::Start)];
        let label_x = self.measure(name, &name_style) + 6.0;
        ops.push(self.text_op(l.proficiency.label(), &label_style, label_x, baseline, TextAnchor::Start));
        ops.extend(self.marker_ops(l.proficiency.level(), self.width, height / 2.0));

        let mut block = Block::new(PageItem::Entry {
            section: SectionId::Languages,
            id: l.id.clone(),
        });
        block.rows = vec![Row { height, ops }];
        block.space_after = self.theme.entry_spacing / 2.0;
        block
    }

    /// Five proficiency markers, `level` of them filled, ending at `right`.
    fn marker_ops(&self, level: u8, right: f32, cy: f32) -> Vec<DrawOp> {
        let color = self.theme.marker_color.clone();
        let level = level.min(5) as usize;
        match self.theme.marker_style {
            MarkerStyle::Bars => {
                let track = 60.0;
                let x = right - track;
                vec![
                    DrawOp::Rect {
                        x,
                        y: cy - 3.0,
                        w: track,
                        h: 6.0,
                        radius: 3.0,
                        fill: None,
                        stroke: Some(color.clone()),
                        stroke_width: 1.0,
                    },
                    DrawOp::Rect {
                        x,
                        y: cy - 3.0,
                        w: track * level as f32 / 5.0,
                        h: 6.0,
                        radius: 3.0,
                        fill: Some(color),
                        stroke: None,
                        stroke_width: 0.0,
                    },
                ]
            }
            MarkerStyle::Dots | MarkerStyle::Bubbles => {
                let (r, step) = if self.theme.marker_style == MarkerStyle::Dots {
                    (3.5, 11.0)
                } else {
                    (5.0, 14.0)
                };
                let start = right - (4.0 * step + 2.0 * r);
                (0..5)
                    .map(|i| {
                        let filled = i < level;
                        DrawOp::Circle {
                            cx: start + r + i as f32 * step,
                            cy,
                            r,
                            fill: filled.then(|| color.clone()),
                            stroke: (!filled).then(|| color.clone()),
                            stroke_width: if filled { 0.0 } else { 1.0 },
                        }
                    })
                    .collect()
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Contact icons
    // ────────────────────────────────────────────────────────────────────────

    /// Icon box starting at `x`, vertically centered on `cy`.
    fn contact_icon(&self, field: PersonalField, x: f32, cy: f32, on_band: Option<&str>) -> Vec<DrawOp> {
        let fill_mode = self.theme.icon_fill;
        if fill_mode == IconFill::None {
            return Vec::new();
        }
        let base = if field.is_link() {
            &self.theme.link_icon_color
        } else {
            &self.theme.header_icon_color
        };
        let color = on_band.unwrap_or(base).to_string();
        let size = self.theme.icon_size;
        let cx = x + size / 2.0;
        let filled = fill_mode == IconFill::Filled;
        let framed = self.theme.icon_frame != IconFrame::None;

        let mut ops = Vec::new();
        let frame_paint = if filled {
            Paint { fill: Some(color.clone()), stroke: None }
        } else {
            Paint { fill: None, stroke: Some(color.clone()) }
        };
        ops.extend(frame_op(self.theme.icon_frame, cx, cy, size / 2.0, &frame_paint));

        let (glyph_size, glyph_paint, contrast) = match (framed, filled) {
            (true, true) => (
                size * 0.6,
                Paint { fill: Some(WHITE.to_string()), stroke: None },
                color.clone(),
            ),
            (true, false) => (size * 0.6, frame_paint.clone(), color.clone()),
            (false, true) => (size, frame_paint.clone(), WHITE.to_string()),
            (false, false) => (size, frame_paint.clone(), color.clone()),
        };
        ops.extend(glyph_ops(field, cx, cy, glyph_size / 2.0, &glyph_paint, &contrast));
        ops
    }
}

fn stroke_width(paint: &Paint) -> f32 {
    if paint.stroke.is_some() {
        1.1
    } else {
        0.0
    }
}

fn regular_polygon(cx: f32, cy: f32, r: f32, sides: usize, rotation: f32) -> Vec<(f32, f32)> {
    (0..sides)
        .map(|i| {
            let angle = rotation + i as f32 * std::f32::consts::TAU / sides as f32;
            (cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect()
}

fn frame_op(frame: IconFrame, cx: f32, cy: f32, half: f32, paint: &Paint) -> Option<DrawOp> {
    let polygon = |points| DrawOp::Polygon {
        points,
        fill: paint.fill.clone(),
        stroke: paint.stroke.clone(),
        stroke_width: stroke_width(paint),
    };
    let rect = |radius| DrawOp::Rect {
        x: cx - half,
        y: cy - half,
        w: half * 2.0,
        h: half * 2.0,
        radius,
        fill: paint.fill.clone(),
        stroke: paint.stroke.clone(),
        stroke_width: stroke_width(paint),
    };
    match frame {
        IconFrame::None => None,
        IconFrame::Circle => Some(DrawOp::Circle {
            cx,
            cy,
            r: half,
            fill: paint.fill.clone(),
            stroke: paint.stroke.clone(),
            stroke_width: stroke_width(paint),
        }),
        IconFrame::Square => Some(rect(0.0)),
        IconFrame::Rounded => Some(rect(half * 0.5)),
        IconFrame::Diamond => Some(polygon(regular_polygon(cx, cy, half, 4, 0.0))),
        IconFrame::Hexagon => Some(polygon(regular_polygon(cx, cy, half, 6, 0.0))),
        IconFrame::Octagon => Some(polygon(regular_polygon(
            cx,
            cy,
            half,
            8,
            std::f32::consts::PI / 8.0,
        ))),
    }
}

/// Simple geometric glyph per contact field. `contrast` draws inner details.
fn glyph_ops(field: PersonalField, cx: f32, cy: f32, h: f32, paint: &Paint, contrast: &str) -> Vec<DrawOp> {
    let sw = stroke_width(paint);
    let detail = |x1: f32, y1: f32, x2: f32, y2: f32| DrawOp::Line {
        x1,
        y1,
        x2,
        y2,
        color: contrast.to_string(),
        width: 1.0,
    };
    match field {
        PersonalField::Email => vec![
            DrawOp::Rect {
                x: cx - h,
                y: cy - h * 0.7,
                w: h * 2.0,
                h: h * 1.4,
                radius: h * 0.1,
                fill: paint.fill.clone(),
                stroke: paint.stroke.clone(),
                stroke_width: sw,
            },
            detail(cx - h, cy - h * 0.7, cx, cy),
            detail(cx, cy, cx + h, cy - h * 0.7),
        ],
        PersonalField::Phone => vec![
            DrawOp::Rect {
                x: cx - h * 0.55,
                y: cy - h,
                w: h * 1.1,
                h: h * 2.0,
                radius: h * 0.2,
                fill: paint.fill.clone(),
                stroke: paint.stroke.clone(),
                stroke_width: sw,
            },
            detail(cx - h * 0.2, cy + h * 0.7, cx + h * 0.2, cy + h * 0.7),
        ],
        PersonalField::Location => vec![
            DrawOp::Polygon {
                points: vec![
                    (cx - h * 0.6, cy - h * 0.2),
                    (cx + h * 0.6, cy - h * 0.2),
                    (cx, cy + h),
                ],
                fill: paint.fill.clone(),
                stroke: paint.stroke.clone(),
                stroke_width: sw,
            },
            DrawOp::Circle {
                cx,
                cy: cy - h * 0.3,
                r: h * 0.62,
                fill: paint.fill.clone(),
                stroke: paint.stroke.clone(),
                stroke_width: sw,
            },
        ],
        PersonalField::Website => vec![
            DrawOp::Circle {
                cx,
                cy,
                r: h,
                fill: paint.fill.clone(),
                stroke: paint.stroke.clone(),
                stroke_width: sw,
            },
            detail(cx - h, cy, cx + h, cy),
            detail(cx, cy - h, cx, cy + h),
        ],
        PersonalField::Linkedin => vec![
            DrawOp::Rect {
                x: cx - h,
                y: cy - h,
                w: h * 2.0,
                h: h * 2.0,
                radius: h * 0.3,
                fill: paint.fill.clone(),
                stroke: paint.stroke.clone(),
                stroke_width: sw,
            },
            detail(cx - h * 0.45, cy - h * 0.1, cx - h * 0.45, cy + h * 0.55),
            detail(cx, cy - h * 0.1, cx, cy + h * 0.55),
            detail(cx + h * 0.45, cy + h * 0.1, cx + h * 0.45, cy + h * 0.55),
        ],
        PersonalField::Github => vec![
            DrawOp::Circle {
                cx,
                cy,
                r: h,
                fill: paint.fill.clone(),
                stroke: paint.stroke.clone(),
                stroke_width: sw,
            },
            DrawOp::Circle {
                cx,
                cy,
                r: h * 0.45,
                fill: None,
                stroke: Some(contrast.to_string()),
                stroke_width: 1.0,
            },
        ],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{LanguageEntry, Proficiency};
    use crate::models::style::StyleSettings;

    fn theme_with(edit: impl FnOnce(&mut StyleSettings)) -> Theme {
        let mut style = StyleSettings::default();
        edit(&mut style);
        Theme::resolve(Some(&style), &StyleSettings::default())
    }

    fn texts(block: &Block) -> Vec<String> {
        block
            .rows
            .iter()
            .flat_map(|r| r.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn sample_cv() -> CvData {
        let mut cv = CvData::default();
        cv.personal_info.full_name = "Ada Lovelace".to_string();
        cv.personal_info.job_title = "Analyst".to_string();
        cv.personal_info.email = "ada@example.com".to_string();
        cv.personal_info.phone = "+44 20 0000".to_string();
        cv.experience.push(ExperienceEntry {
            id: "exp-1".to_string(),
            company: "Analytical Engines Ltd".to_string(),
            position: "Programmer".to_string(),
            start_date: "1842-01".to_string(),
            current: true,
            highlights: vec!["Wrote the first algorithm".to_string(), " ".to_string()],
            ..Default::default()
        });
        cv
    }

    #[test]
    fn test_header_contains_name_title_and_contacts() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Short, 600.0, false);
        let header = composer.header(&sample_cv(), HeaderKind::Stacked);
        let texts = texts(&header);
        assert!(texts.contains(&"Ada Lovelace".to_string()));
        assert!(texts.contains(&"Analyst".to_string()));
        assert!(texts.contains(&"ada@example.com".to_string()));
    }

    #[test]
    fn test_show_email_false_hides_email() {
        let theme = theme_with(|s| s.show_email = false);
        let composer = Composer::new(&theme, MonthStyle::Short, 600.0, false);
        let header = composer.header(&sample_cv(), HeaderKind::Split);
        assert!(!texts(&header).contains(&"ada@example.com".to_string()));
        assert!(texts(&header).contains(&"+44 20 0000".to_string()));
    }

    #[test]
    fn test_name_only_header_skips_contacts() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Short, 400.0, false);
        let header = composer.header(&sample_cv(), HeaderKind::NameOnly);
        assert_eq!(texts(&header), vec!["Ada Lovelace", "Analyst"]);
    }

    #[test]
    fn test_photo_header_is_at_least_photo_tall() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Short, 600.0, false);
        let mut cv = CvData::default();
        cv.personal_info.full_name = "Ada".to_string();
        cv.personal_info.profile_picture = "https://img.example.com/ada.png".to_string();
        let header = composer.header(&cv, HeaderKind::Stacked);
        assert!(header.height() >= PHOTO_SIZE);
        assert!(header.rows[0]
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Image { circular: true, .. })));
    }

    #[test]
    fn test_local_photo_paths_are_not_drawn() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Short, 600.0, false);
        for href in ["/etc/ssl/private/key.png", "file:///tmp/a.png", "../secret.svg"] {
            let mut cv = CvData::default();
            cv.personal_info.full_name = "Ada".to_string();
            cv.personal_info.profile_picture = href.to_string();

            let header = composer.header(&cv, HeaderKind::Stacked);
            let contacts = composer.contact_column(&cv);
            let images = header
                .rows
                .iter()
                .chain(contacts.iter().flat_map(|c| c.rows.iter()))
                .flat_map(|row| row.ops.iter())
                .filter(|op| matches!(op, DrawOp::Image { .. }))
                .count();
            assert_eq!(images, 0, "{href} was drawn");
        }
    }

    #[test]
    fn test_banner_band_bleeds_to_page_edges() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Short, 600.0, false);
        let header = composer.header(&sample_cv(), HeaderKind::Banner);
        match &header.rows[0].ops[0] {
            DrawOp::Rect { x, w, fill, .. } => {
                assert!(*x < 0.0);
                assert_eq!(*w, PAGE_WIDTH_PX as f32);
                assert_eq!(fill.as_deref(), Some(theme.accent.as_str()));
            }
            other => panic!("expected band rect, got {other:?}"),
        }
    }

    #[test]
    fn test_experience_entry_formats_dates_and_skips_blank_highlights() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Long, 600.0, false);
        let blocks = composer.section(&sample_cv(), SectionId::Experience);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].keep_with_next);
        assert_eq!(
            blocks[1].item,
            PageItem::Entry {
                section: SectionId::Experience,
                id: "exp-1".to_string()
            }
        );
        let texts = texts(&blocks[1]);
        assert!(texts.contains(&"January 1842 – Present".to_string()));
        assert!(texts.contains(&"Wrote the first algorithm".to_string()));
        assert_eq!(texts.iter().filter(|t| t.trim().is_empty()).count(), 0);
    }

    #[test]
    fn test_heading_uses_capitalization_and_rule() {
        let theme = theme_with(|s| s.capitalization = crate::models::style::Capitalization::Uppercase);
        let composer = Composer::new(&theme, MonthStyle::Short, 600.0, false);
        let blocks = composer.section(&sample_cv(), SectionId::Experience);
        assert!(texts(&blocks[0]).contains(&"WORK EXPERIENCE".to_string()));
        assert!(blocks[0].rows[0]
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Line { .. })));
    }

    #[test]
    fn test_timeline_adds_rail_to_every_row() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Short, 600.0, true);
        let blocks = composer.section(&sample_cv(), SectionId::Experience);
        for row in &blocks[1].rows {
            assert!(matches!(row.ops[0], DrawOp::Line { x1, .. } if x1 == TIMELINE_RAIL_X));
        }
    }

    #[test]
    fn test_language_markers_reflect_level() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Short, 300.0, false);
        let block = composer.language(&LanguageEntry {
            id: "l1".to_string(),
            name: "French".to_string(),
            proficiency: Proficiency::Fluent,
        });
        let filled = block.rows[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Circle { fill: Some(_), .. }))
            .count();
        assert_eq!(filled, 4);
    }

    #[test]
    fn test_bar_markers_scale_with_level() {
        let theme = theme_with(|s| s.marker_style = MarkerStyle::Bars);
        let composer = Composer::new(&theme, MonthStyle::Short, 300.0, false);
        let ops = composer.marker_ops(3, 300.0, 5.0);
        assert!(matches!(ops[1], DrawOp::Rect { w, .. } if (w - 36.0).abs() < 1e-3));
    }

    #[test]
    fn test_hyphen_list_style_overrides_bullet() {
        let theme = theme_with(|s| s.entry_list_style = EntryListStyle::Hyphen);
        let composer = Composer::new(&theme, MonthStyle::Short, 300.0, false);
        let ops = composer.bullet_ops(0.0, 5.0);
        assert!(matches!(&ops[0], DrawOp::Text { text, .. } if text == "-"));
    }

    #[test]
    fn test_no_icons_when_fill_is_none() {
        let theme = theme_with(|s| s.icon_fill = IconFill::None);
        let composer = Composer::new(&theme, MonthStyle::Short, 300.0, false);
        assert!(composer
            .contact_icon(PersonalField::Email, 0.0, 5.0, None)
            .is_empty());
    }

    #[test]
    fn test_framed_filled_icon_has_frame_first() {
        let theme = theme_with(|s| {
            s.icon_fill = IconFill::Filled;
            s.icon_frame = IconFrame::Hexagon;
        });
        let composer = Composer::new(&theme, MonthStyle::Short, 300.0, false);
        let ops = composer.contact_icon(PersonalField::Github, 0.0, 7.0, None);
        match &ops[0] {
            DrawOp::Polygon { points, fill, .. } => {
                assert_eq!(points.len(), 6);
                assert!(fill.is_some());
            }
            other => panic!("expected hexagon frame, got {other:?}"),
        }
    }

    #[test]
    fn test_skills_render_inline_with_labels() {
        let theme = theme_with(|_| {});
        let composer = Composer::new(&theme, MonthStyle::Short, 600.0, false);
        let mut cv = CvData::default();
        cv.skills.technical = vec!["Rust".to_string(), "SQL".to_string()];
        cv.skills.soft = vec!["Mentoring".to_string()];
        let blocks = composer.section(&cv, SectionId::Skills);
        let texts = texts(&blocks[1]);
        assert_eq!(texts, vec!["Technical", "Rust · SQL", "Soft skills", "Mentoring"]);
    }
}
