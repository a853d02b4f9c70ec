//! Date normalization for display.
//!
//! Dates in CV data are free-form strings. Recognized grammars, in order:
//! 1. `YYYY`                     → unchanged
//! 2. `YYYY-M` / `YYYY-MM-DD`    → `"{Month} {YYYY}"`, month clamped to 1..=12
//! 3. `M/YYYY`                   → same as (2)
//! 4. `Mon YYYY` / `Month YYYY`  → unchanged
//!
//! Empty input yields `""`; anything else is returned as given. Output of every
//! grammar is itself accepted by grammar 1 or 4, so formatting is idempotent.

use std::sync::LazyLock;

use chrono::Month;
use regex::Regex;
use serde::{Deserialize, Serialize};

static YEAR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}$").expect("valid year regex"));
static ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})(-(\d{1,2}))?$").expect("valid iso date regex")
});
static SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{4})$").expect("valid slash date regex"));
static TEXTUAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3,9}\s+\d{4}$").expect("valid textual date regex"));

/// Dash code points folded to ASCII `-` before matching.
const DASHES: &[char] = &[
    '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}',
    '\u{FE58}', '\u{FE63}', '\u{FF0D}',
];

/// Month label used by a template variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthStyle {
    /// `Jan 2020`
    Short,
    /// `January 2020`
    Long,
}

fn normalize_dashes(raw: &str) -> String {
    raw.chars()
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .collect()
}

fn month_label(month: u32, style: MonthStyle) -> &'static str {
    let month = month.clamp(1, 12);
    let name = Month::try_from(month as u8)
        .map(|m| m.name())
        .unwrap_or("December");
    match style {
        MonthStyle::Long => name,
        MonthStyle::Short => &name[..3],
    }
}

fn month_year(month: &str, year: &str, style: MonthStyle) -> String {
    let month: u32 = month.parse().unwrap_or(1);
    format!("{} {}", month_label(month, style), year)
}

/// Formats a raw date string for display. Never fails.
pub fn format_date(raw: &str, style: MonthStyle) -> String {
    let normalized = normalize_dashes(raw.trim());
    if normalized.is_empty() {
        return String::new();
    }

    if YEAR_ONLY.is_match(&normalized) {
        return normalized;
    }

    if let Some(caps) = ISO.captures(&normalized) {
        return month_year(&caps[2], &caps[1], style);
    }

    if let Some(caps) = SLASH.captures(&normalized) {
        return month_year(&caps[1], &caps[2], style);
    }

    if TEXTUAL.is_match(&normalized) {
        return normalized;
    }

    raw.to_string()
}

/// Formats a `start – end` range. A current position ends in "Present";
/// a missing side collapses the range to the side that exists.
pub fn format_date_range(start: &str, end: &str, current: bool, style: MonthStyle) -> String {
    let start = format_date(start, style);
    let end = if current {
        "Present".to_string()
    } else {
        format_date(end, style)
    };
    match (start.is_empty(), end.is_empty()) {
        (false, false) => format!("{start} – {end}"),
        (false, true) => start,
        (true, false) => end,
        (true, true) => String::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
