//! Semantic HTML rendition of a CV, the input of the DOCX converter.
//!
//! The markup mirrors the painted document: same section order, same date
//! formatting, same colors. Items that open a page in the paginated surface
//! carry `page-break-before` so word processors break at the same places.

use std::fmt::Write as _;

use crate::layout::PageItem;
use crate::models::cv::{CvData, SectionId};
use crate::models::style::{Align, EntryListStyle};

use super::dates::{format_date, format_date_range, MonthStyle};
use super::svg::{escape, num};
use super::theme::Theme;

const PAGE_BREAK: &str = " style=\"page-break-before: always\"";

struct Markup<'a> {
    theme: &'a Theme,
    month: MonthStyle,
    breaks: &'a [PageItem],
    out: String,
}

impl Markup<'_> {
    fn break_attr(&self, item: &PageItem) -> &'static str {
        if self.breaks.contains(item) {
            PAGE_BREAK
        } else {
            ""
        }
    }

    fn paragraph(&mut self, class: &str, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            let _ = write!(self.out, "<p class=\"{class}\">{}</p>", escape(text));
        }
    }

    fn entry_open(&mut self, section: SectionId, id: &str) {
        let item = PageItem::Entry {
            section,
            id: id.to_string(),
        };
        let _ = write!(
            self.out,
            "<article id=\"entry-{}\"{}>",
            escape(id),
            self.break_attr(&item)
        );
    }

    fn entry_head(&mut self, title: &str, dates: &str) {
        let _ = write!(self.out, "<h3>{}", escape(title.trim()));
        if !dates.is_empty() {
            let _ = write!(self.out, " <span class=\"date\">{}</span>", escape(dates));
        }
        self.out.push_str("</h3>");
    }

    fn meta(&mut self, parts: &[&str]) {
        let parts: Vec<String> = parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(escape)
            .collect();
        if !parts.is_empty() {
            let _ = write!(self.out, "<p class=\"meta\">{}</p>", parts.join(" · "));
        }
    }

    fn list(&mut self, items: &[String]) {
        let items: Vec<&str> = items.iter().map(|i| i.trim()).filter(|i| !i.is_empty()).collect();
        if items.is_empty() {
            return;
        }
        self.out.push_str("<ul>");
        for item in items {
            let _ = write!(self.out, "<li>{}</li>", escape(item));
        }
        self.out.push_str("</ul>");
    }

    fn styles(&mut self) {
        let t = self.theme;
        let align = match t.align {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        };
        let rule = if t.headings_line {
            format!("border-bottom:1px solid {};", t.rule_color)
        } else {
            String::new()
        };
        let list_style = match t.entry_list_style {
            EntryListStyle::Hyphen => "\"- \"",
            EntryListStyle::Bullet => "disc",
        };
        let _ = write!(
            self.out,
            "<style>\
             @page{{size:A4;margin:{top}px {right}px {bottom}px {left}px}}\
             body{{font-family:{body_font};font-size:{body_size}px;line-height:{lh};color:{text};background:{bg}}}\
             header{{text-align:{align}}}\
             h1{{font-family:{heading_font};color:{name};font-weight:{name_weight};margin:0}}\
             .title{{color:{title};font-size:1.25em;margin:0}}\
             h2{{font-family:{heading_font};font-size:{heading_size}px;color:{heading};{rule}}}\
             h3{{font-size:1.05em;margin:0}}\
             .date{{float:right;font-weight:400;color:{date};opacity:{opacity}}}\
             .meta{{color:{secondary};margin:0}}\
             ul{{list-style:{list_style};margin-left:{indent}px}}\
             article{{margin-bottom:{spacing}px}}\
             </style>",
            top = num(t.margin_top),
            right = num(t.margin_right),
            bottom = num(t.margin_bottom),
            left = num(t.margin_left),
            body_font = escape(&t.body_font),
            body_size = num(t.body_size),
            lh = num(t.line_height),
            text = t.text,
            bg = t.background,
            heading_font = escape(&t.heading_font),
            name = t.name_color,
            name_weight = if t.name_bold { 700 } else { 400 },
            title = t.job_title_color,
            heading_size = num(t.heading_size),
            heading = t.heading_color,
            date = t.date_color,
            opacity = num(t.date_opacity),
            secondary = t.secondary,
            indent = num(t.description_indent + 12.0),
            spacing = num(t.entry_spacing),
        );
    }

    fn header(&mut self, data: &CvData) {
        let info = &data.personal_info;
        self.out.push_str("<header>");
        let _ = write!(self.out, "<h1>{}</h1>", escape(info.full_name.trim()));
        self.paragraph("title", &info.job_title);
        let contacts: Vec<String> = data
            .contact_fields(self.theme.show_email)
            .into_iter()
            .map(|(_, value)| escape(value))
            .collect();
        if !contacts.is_empty() {
            let _ = write!(self.out, "<p class=\"contact\">{}</p>", contacts.join(" · "));
        }
        self.out.push_str("</header>");

        let summary = info.summary.trim();
        if !summary.is_empty() {
            let _ = write!(
                self.out,
                "<section class=\"summary\"{}><p>{}</p></section>",
                self.break_attr(&PageItem::Summary),
                escape(summary)
            );
        }
    }

    fn section(&mut self, data: &CvData, section: SectionId) {
        let heading = PageItem::Heading { section };
        let _ = write!(
            self.out,
            "<section id=\"{}\"><h2{}>{}</h2>",
            section.as_str(),
            self.break_attr(&heading),
            escape(&self.theme.heading_text(section.title()))
        );

        match section {
            SectionId::Experience => {
                for e in &data.experience {
                    self.entry_open(section, &e.id);
                    let title = if e.position.trim().is_empty() { &e.company } else { &e.position };
                    self.entry_head(title, &format_date_range(&e.start_date, &e.end_date, e.current, self.month));
                    if !e.position.trim().is_empty() {
                        self.meta(&[e.company.as_str(), e.location.as_str()]);
                    } else {
                        self.meta(&[e.location.as_str()]);
                    }
                    self.paragraph("description", &e.description);
                    self.list(&e.highlights);
                    self.out.push_str("</article>");
                }
            }
            SectionId::Education => {
                for e in &data.education {
                    self.entry_open(section, &e.id);
                    let title = [e.degree.trim(), e.field.trim()]
                        .iter()
                        .filter(|s| !s.is_empty())
                        .copied()
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.entry_head(&title, &format_date_range(&e.start_date, &e.end_date, e.current, self.month));
                    self.meta(&[e.institution.as_str(), e.location.as_str()]);
                    if !e.gpa.trim().is_empty() {
                        self.paragraph("gpa", &format!("GPA: {}", e.gpa.trim()));
                    }
                    self.paragraph("description", &e.description);
                    self.out.push_str("</article>");
                }
            }
            SectionId::Certifications => {
                for c in &data.certifications {
                    self.entry_open(section, &c.id);
                    self.entry_head(&c.name, &format_date(&c.date, self.month));
                    self.meta(&[c.issuer.as_str()]);
                    self.paragraph("link", &c.url);
                    self.out.push_str("</article>");
                }
            }
            SectionId::Projects => {
                for p in &data.projects {
                    self.entry_open(section, &p.id);
                    let title = match p.role.trim() {
                        "" => p.name.trim().to_string(),
                        role => format!("{} · {role}", p.name.trim()),
                    };
                    self.entry_head(&title, &format_date_range(&p.start_date, &p.end_date, p.current, self.month));
                    self.paragraph("description", &p.description);
                    let technologies: Vec<&str> = p
                        .technologies
                        .iter()
                        .map(|t| t.trim())
                        .filter(|t| !t.is_empty())
                        .collect();
                    if !technologies.is_empty() {
                        self.paragraph("technologies", &format!("Technologies: {}", technologies.join(", ")));
                    }
                    self.paragraph("link", &p.url);
                    self.out.push_str("</article>");
                }
            }
            SectionId::Skills => {
                let item = PageItem::List { section };
                let _ = write!(self.out, "<div class=\"skills\"{}>", self.break_attr(&item));
                for (label, items) in [("Technical", &data.skills.technical), ("Soft skills", &data.skills.soft)] {
                    let joined = join_inline(items);
                    if !joined.is_empty() {
                        let _ = write!(self.out, "<p><strong>{label}</strong>: {}</p>", escape(&joined));
                    }
                }
                self.out.push_str("</div>");
            }
            SectionId::Languages => {
                for l in &data.languages {
                    self.entry_open(section, &l.id);
                    let _ = write!(
                        self.out,
                        "<p>{} <span class=\"meta\">({})</span></p></article>",
                        escape(l.name.trim()),
                        l.proficiency.label()
                    );
                }
            }
            SectionId::Interests => {
                let item = PageItem::List { section };
                let joined = join_inline(&data.additional.interests);
                let _ = write!(self.out, "<p{}>{}</p>", self.break_attr(&item), escape(&joined));
            }
        }
        self.out.push_str("</section>");
    }
}

fn join_inline(items: &[String]) -> String {
    items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Renders the full HTML document. `breaks` lists the items that open a page.
pub fn render_markup(
    data: &CvData,
    theme: &Theme,
    month: MonthStyle,
    sections: &[SectionId],
    breaks: &[PageItem],
) -> String {
    let mut markup = Markup {
        theme,
        month,
        breaks,
        out: String::new(),
    };
    let _ = write!(
        markup.out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>",
        escape(data.personal_info.full_name.trim())
    );
    markup.styles();
    markup.out.push_str("</head><body>");
    markup.header(data);
    for section in sections {
        markup.section(data, *section);
    }
    markup.out.push_str("</body></html>");
    markup.out
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{ExperienceEntry, Proficiency};
    use crate::models::style::StyleSettings;

    fn cv() -> CvData {
        let mut cv = CvData::default();
        cv.personal_info.full_name = "Grace <Hopper>".to_string();
        cv.personal_info.email = "grace@example.com".to_string();
        cv.experience = vec![
            ExperienceEntry {
                id: "e1".to_string(),
                position: "Rear Admiral".to_string(),
                company: "US Navy".to_string(),
                start_date: "1943-12".to_string(),
                end_date: "1986-08".to_string(),
                highlights: vec!["COBOL".to_string()],
                ..Default::default()
            },
            ExperienceEntry {
                id: "e2".to_string(),
                position: "Consultant".to_string(),
                company: "DEC".to_string(),
                ..Default::default()
            },
        ];
        cv.languages.push(crate::models::cv::LanguageEntry {
            id: "l1".to_string(),
            name: "English".to_string(),
            proficiency: Proficiency::Native,
        });
        cv
    }

    #[test]
    fn test_markup_contains_sections_in_order_and_escapes() {
        let theme = Theme::resolve(None, &StyleSettings::default());
        let data = cv();
        let html = render_markup(&data, &theme, MonthStyle::Short, &data.visible_sections(), &[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Grace &lt;Hopper&gt;</h1>"));
        assert!(html.contains("Dec 1943 – Aug 1986"));
        assert!(html.contains("<li>COBOL</li>"));
        assert!(html.contains("(Native)"));
        let experience = html.find("id=\"experience\"").unwrap();
        let languages = html.find("id=\"languages\"").unwrap();
        assert!(experience < languages);
        assert!(!html.contains("page-break-before"));
    }

    #[test]
    fn test_page_break_markers_follow_breaks() {
        let theme = Theme::resolve(None, &StyleSettings::default());
        let data = cv();
        let breaks = vec![PageItem::Entry {
            section: SectionId::Experience,
            id: "e2".to_string(),
        }];
        let html = render_markup(&data, &theme, MonthStyle::Long, &data.visible_sections(), &breaks);
        assert_eq!(html.matches("page-break-before").count(), 1);
        assert!(html.contains("<article id=\"entry-e2\" style=\"page-break-before: always\">"));
    }
}
