//! Download filename derivation.
//!
//! Base name candidates in order: title, organization, the first 30
//! characters of free text, then a fixed fallback. A candidate counts only if
//! its slug is non-empty.

use serde::{Deserialize, Serialize};

use crate::models::cv::CvData;

use super::ExportFormat;

pub const FALLBACK_BASE: &str = "cv";
const FREE_TEXT_CHARS: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilenameHint {
    pub title: Option<String>,
    pub organization: Option<String>,
    pub free_text: Option<String>,
    pub resource_id: Option<u64>,
}

impl FilenameHint {
    /// Hint taken from the CV itself: the person's name, the most recent
    /// employer and the summary.
    pub fn from_cv(cv: &CvData) -> Self {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        Self {
            title: non_empty(&cv.personal_info.full_name),
            organization: cv.experience.first().and_then(|e| non_empty(&e.company)),
            free_text: non_empty(&cv.personal_info.summary),
            resource_id: None,
        }
    }

    /// Fields set here win; unset fields come from `fallback`.
    pub fn or(self, fallback: &FilenameHint) -> FilenameHint {
        FilenameHint {
            title: self.title.or_else(|| fallback.title.clone()),
            organization: self.organization.or_else(|| fallback.organization.clone()),
            free_text: self.free_text.or_else(|| fallback.free_text.clone()),
            resource_id: self.resource_id.or(fallback.resource_id),
        }
    }
}

/// Lowercase ASCII alphanumerics; every run of anything else becomes one
/// hyphen; leading and trailing hyphens are dropped.
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_hyphen = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}

pub fn derive_filename(hint: &FilenameHint, format: ExportFormat) -> String {
    let free_text = hint
        .free_text
        .as_deref()
        .map(|t| t.chars().take(FREE_TEXT_CHARS).collect::<String>());

    let base = [hint.title.as_deref(), hint.organization.as_deref(), free_text.as_deref()]
        .into_iter()
        .flatten()
        .map(slugify)
        .find(|slug| !slug.is_empty())
        .unwrap_or_else(|| FALLBACK_BASE.to_string());

    match hint.resource_id {
        Some(id) => format!("{base}-{id}.{}", format.extension()),
        None => format!("{base}.{}", format.extension()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
