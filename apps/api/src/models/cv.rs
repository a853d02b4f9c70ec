use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::style::StyleSettings;

// ────────────────────────────────────────────────────────────────────────────
// Section and field identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Renderable CV sections. `sectionOrder` is a permutation of these ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Experience,
    Education,
    Certifications,
    Projects,
    Skills,
    Languages,
    Interests,
}

impl SectionId {
    pub const DEFAULT_ORDER: [SectionId; 7] = [
        SectionId::Experience,
        SectionId::Education,
        SectionId::Projects,
        SectionId::Certifications,
        SectionId::Skills,
        SectionId::Languages,
        SectionId::Interests,
    ];

    /// Parses a stored section identifier. Unknown ids yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "experience" => Some(SectionId::Experience),
            "education" => Some(SectionId::Education),
            "certifications" => Some(SectionId::Certifications),
            "projects" => Some(SectionId::Projects),
            "skills" => Some(SectionId::Skills),
            "languages" => Some(SectionId::Languages),
            "interests" => Some(SectionId::Interests),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Experience => "experience",
            SectionId::Education => "education",
            SectionId::Certifications => "certifications",
            SectionId::Projects => "projects",
            SectionId::Skills => "skills",
            SectionId::Languages => "languages",
            SectionId::Interests => "interests",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionId::Experience => "Work experience",
            SectionId::Education => "Education",
            SectionId::Certifications => "Certifications",
            SectionId::Projects => "Projects",
            SectionId::Skills => "Skills",
            SectionId::Languages => "Languages",
            SectionId::Interests => "Interests",
        }
    }
}

/// Contact sub-fields of the personal-info block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalField {
    Email,
    Phone,
    Location,
    Website,
    Linkedin,
    Github,
}

impl PersonalField {
    pub const DEFAULT_ORDER: [PersonalField; 6] = [
        PersonalField::Email,
        PersonalField::Phone,
        PersonalField::Location,
        PersonalField::Website,
        PersonalField::Linkedin,
        PersonalField::Github,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => Some(PersonalField::Email),
            "phone" => Some(PersonalField::Phone),
            "location" => Some(PersonalField::Location),
            "website" => Some(PersonalField::Website),
            "linkedin" => Some(PersonalField::Linkedin),
            "github" => Some(PersonalField::Github),
            _ => None,
        }
    }

    /// Link fields take the link-icon accent; the rest take the header-icon accent.
    pub fn is_link(self) -> bool {
        matches!(
            self,
            PersonalField::Website | PersonalField::Linkedin | PersonalField::Github
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// CV content
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub job_title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub website: String,
    pub linkedin: String,
    pub github: String,
    pub summary: String,
    /// Externally hosted image URL; never fetched by the renderer.
    pub profile_picture: String,
}

impl PersonalInfo {
    pub fn field(&self, field: PersonalField) -> &str {
        match field {
            PersonalField::Email => &self.email,
            PersonalField::Phone => &self.phone,
            PersonalField::Location => &self.location,
            PersonalField::Website => &self.website,
            PersonalField::Linkedin => &self.linkedin,
            PersonalField::Github => &self.github,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub id: String,
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub gpa: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationEntry {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    pub role: String,
    pub url: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Proficiency {
    Native,
    Fluent,
    Advanced,
    #[default]
    Intermediate,
    Basic,
}

impl Proficiency {
    /// Filled marker count out of five.
    pub fn level(self) -> u8 {
        match self {
            Proficiency::Native => 5,
            Proficiency::Fluent => 4,
            Proficiency::Advanced => 3,
            Proficiency::Intermediate => 2,
            Proficiency::Basic => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Proficiency::Native => "Native",
            Proficiency::Fluent => "Fluent",
            Proficiency::Advanced => "Advanced",
            Proficiency::Intermediate => "Intermediate",
            Proficiency::Basic => "Basic",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageEntry {
    pub id: String,
    pub name: String,
    pub proficiency: Proficiency,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Additional {
    pub interests: Vec<String>,
}

fn default_section_order() -> Vec<String> {
    SectionId::DEFAULT_ORDER
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

fn default_field_order() -> Vec<String> {
    ["email", "phone", "location", "website", "linkedin", "github"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// One resume snapshot, handed to the renderer as an immutable value.
///
/// Everything defaults so a record carrying only a name still renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvData {
    pub personal_info: PersonalInfo,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub certifications: Vec<CertificationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub skills: Skills,
    pub languages: Vec<LanguageEntry>,
    pub additional: Additional,
    pub section_order: Vec<String>,
    pub hidden_sections: Vec<String>,
    pub personal_info_field_order: Vec<String>,
    pub style_settings: Option<StyleSettings>,
}

impl Default for CvData {
    fn default() -> Self {
        Self {
            personal_info: PersonalInfo::default(),
            experience: Vec::new(),
            education: Vec::new(),
            certifications: Vec::new(),
            projects: Vec::new(),
            skills: Skills::default(),
            languages: Vec::new(),
            additional: Additional::default(),
            section_order: default_section_order(),
            hidden_sections: Vec::new(),
            personal_info_field_order: default_field_order(),
            style_settings: None,
        }
    }
}

/// True when no entry has any non-whitespace text.
fn all_blank(items: &[String]) -> bool {
    items.iter().all(|item| item.trim().is_empty())
}

impl CvData {
    pub fn section_is_empty(&self, section: SectionId) -> bool {
        match section {
            SectionId::Experience => self.experience.is_empty(),
            SectionId::Education => self.education.is_empty(),
            SectionId::Certifications => self.certifications.is_empty(),
            SectionId::Projects => self.projects.is_empty(),
            SectionId::Skills => all_blank(&self.skills.technical) && all_blank(&self.skills.soft),
            SectionId::Languages => self.languages.is_empty(),
            SectionId::Interests => all_blank(&self.additional.interests),
        }
    }

    /// The sections to render, in order.
    ///
    /// Walks `sectionOrder`, drops unknown ids, repeats, hidden sections and
    /// sections with no content. A section missing from `sectionOrder` never
    /// appears.
    pub fn visible_sections(&self) -> Vec<SectionId> {
        let hidden: HashSet<SectionId> = self
            .hidden_sections
            .iter()
            .filter_map(|s| SectionId::parse(s))
            .collect();
        let mut seen = HashSet::new();
        self.section_order
            .iter()
            .filter_map(|s| SectionId::parse(s))
            .filter(|s| seen.insert(*s))
            .filter(|s| !hidden.contains(s))
            .filter(|s| !self.section_is_empty(*s))
            .collect()
    }

    /// Contact fields to render, in `personalInfoFieldOrder`, skipping blanks.
    ///
    /// Fields the order omits are appended in default order so that a stale
    /// permutation never drops contact data.
    pub fn contact_fields(&self, show_email: bool) -> Vec<(PersonalField, &str)> {
        let mut seen = HashSet::new();
        let ordered: Vec<PersonalField> = self
            .personal_info_field_order
            .iter()
            .filter_map(|s| PersonalField::parse(s))
            .chain(PersonalField::DEFAULT_ORDER)
            .filter(|f| seen.insert(*f))
            .collect();

        ordered
            .into_iter()
            .filter(|f| show_email || *f != PersonalField::Email)
            .map(|f| (f, self.personal_info.field(f).trim()))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }

    /// Entry ids that occur more than once within their own list.
    pub fn duplicate_entry_ids(&self) -> Vec<(SectionId, String)> {
        fn dups<'a>(
            section: SectionId,
            ids: impl Iterator<Item = &'a str>,
            out: &mut Vec<(SectionId, String)>,
        ) {
            let mut seen = HashSet::new();
            for id in ids {
                if !seen.insert(id) {
                    out.push((section, id.to_string()));
                }
            }
        }

        let mut out = Vec::new();
        dups(
            SectionId::Experience,
            self.experience.iter().map(|e| e.id.as_str()),
            &mut out,
        );
        dups(
            SectionId::Education,
            self.education.iter().map(|e| e.id.as_str()),
            &mut out,
        );
        dups(
            SectionId::Certifications,
            self.certifications.iter().map(|e| e.id.as_str()),
            &mut out,
        );
        dups(
            SectionId::Projects,
            self.projects.iter().map(|e| e.id.as_str()),
            &mut out,
        );
        dups(
            SectionId::Languages,
            self.languages.iter().map(|e| e.id.as_str()),
            &mut out,
        );
        out
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn experience(id: &str) -> ExperienceEntry {
        ExperienceEntry {
            id: id.to_string(),
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_json_deserializes_with_defaults() {
        let cv: CvData = serde_json::from_str(r#"{"personalInfo":{"fullName":"Ada"}}"#)
            .expect("valid cv json");
        assert_eq!(cv.personal_info.full_name, "Ada");
        assert_eq!(cv.personal_info.job_title, "");
        assert!(cv.experience.is_empty());
        assert_eq!(cv.section_order.len(), SectionId::DEFAULT_ORDER.len());
        assert!(cv.visible_sections().is_empty());
    }

    #[test]
    fn test_visible_sections_skips_empty_even_when_ordered() {
        let cv = CvData {
            experience: vec![experience("a")],
            section_order: vec!["certifications".into(), "experience".into()],
            ..Default::default()
        };
        assert_eq!(cv.visible_sections(), vec![SectionId::Experience]);
    }

    #[test]
    fn test_visible_sections_dedupes_and_ignores_unknown() {
        let cv = CvData {
            experience: vec![experience("a")],
            skills: Skills {
                technical: vec!["Rust".into()],
                soft: vec![],
            },
            section_order: vec![
                "skills".into(),
                "bogus".into(),
                "experience".into(),
                "skills".into(),
            ],
            ..Default::default()
        };
        let sections = cv.visible_sections();
        assert_eq!(sections, vec![SectionId::Skills, SectionId::Experience]);
    }

    #[test]
    fn test_section_absent_from_order_is_never_visible() {
        let cv = CvData {
            experience: vec![experience("a")],
            languages: vec![LanguageEntry {
                id: "l1".into(),
                name: "French".into(),
                proficiency: Proficiency::Fluent,
            }],
            section_order: vec!["languages".into()],
            ..Default::default()
        };
        assert_eq!(cv.visible_sections(), vec![SectionId::Languages]);
    }

    #[test]
    fn test_hidden_sections_are_excluded() {
        let cv = CvData {
            experience: vec![experience("a")],
            additional: Additional {
                interests: vec!["Chess".into()],
            },
            hidden_sections: vec!["experience".into()],
            ..Default::default()
        };
        assert_eq!(cv.visible_sections(), vec![SectionId::Interests]);
    }

    #[test]
    fn test_blank_list_entries_do_not_make_a_section() {
        let mut cv = CvData {
            experience: vec![experience("a")],
            skills: Skills {
                technical: vec!["  ".into(), "".into()],
                soft: vec!["\t".into()],
            },
            additional: Additional {
                interests: vec![" ".into()],
            },
            ..Default::default()
        };
        assert!(cv.section_is_empty(SectionId::Skills));
        assert!(cv.section_is_empty(SectionId::Interests));
        assert_eq!(cv.visible_sections(), vec![SectionId::Experience]);

        cv.skills.soft.push("Mentoring".into());
        assert!(!cv.section_is_empty(SectionId::Skills));
    }

    #[test]
    fn test_contact_fields_follow_order_and_respect_email_toggle() {
        let cv = CvData {
            personal_info: PersonalInfo {
                email: "ada@example.com".into(),
                phone: "+44 1".into(),
                github: "ada".into(),
                ..Default::default()
            },
            personal_info_field_order: vec!["github".into(), "phone".into()],
            ..Default::default()
        };
        let fields: Vec<PersonalField> = cv.contact_fields(true).iter().map(|f| f.0).collect();
        assert_eq!(
            fields,
            vec![PersonalField::Github, PersonalField::Phone, PersonalField::Email]
        );

        let without_email: Vec<PersonalField> =
            cv.contact_fields(false).iter().map(|f| f.0).collect();
        assert!(!without_email.contains(&PersonalField::Email));
    }

    #[test]
    fn test_duplicate_entry_ids_reported_per_list() {
        let cv = CvData {
            experience: vec![experience("x"), experience("x"), experience("y")],
            ..Default::default()
        };
        assert_eq!(
            cv.duplicate_entry_ids(),
            vec![(SectionId::Experience, "x".to_string())]
        );
    }

    #[test]
    fn test_proficiency_levels_descend() {
        assert_eq!(Proficiency::Native.level(), 5);
        assert_eq!(Proficiency::Basic.level(), 1);
        let parsed: Proficiency = serde_json::from_str("\"Fluent\"").expect("valid proficiency");
        assert_eq!(parsed, Proficiency::Fluent);
    }
}
