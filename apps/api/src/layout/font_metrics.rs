//! Static font metrics and page geometry for the layout engine.
//!
//! Character widths are in em units relative to font size. One base table
//! (a humanist sans) is scaled per family; that is an approximation, but the
//! pagination only needs line counts, and a line that comes out a few pixels
//! narrower or wider than the real glyph run does not move a page break.
//!
//! The base table covers ASCII 0x20..=0x7E. Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Page geometry
// ────────────────────────────────────────────────────────────────────────────

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// CSS reference pixel: 96 per inch.
pub const PX_PER_MM: f32 = 96.0 / 25.4;

/// A4 in layout pixels (rounded to whole pixels).
pub const PAGE_WIDTH_PX: u32 = 794;
pub const PAGE_HEIGHT_PX: u32 = 1123;

pub fn mm_to_px(mm: f32) -> f32 {
    mm * PX_PER_MM
}

// ────────────────────────────────────────────────────────────────────────────
// Font family
// ────────────────────────────────────────────────────────────────────────────

/// Metric families. Font identifiers from style settings map onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    /// Humanist sans (Inter, Roboto, Open Sans, Arial…).
    Inter,
    /// Old-style serif (EB Garamond, Georgia, Merriweather…).
    EbGaramond,
    /// Wide geometric sans (Lato, Montserrat, Poppins…).
    Lato,
    /// Condensed display sans (Oswald, Roboto Condensed…).
    Oswald,
    /// Book serif (Computer Modern, Times…).
    ComputerModern,
}

impl FontFamily {
    /// Maps a style font identifier (`"open-sans"`, `"Merriweather"`, …) to a
    /// metric family. Unknown identifiers fall back to `Inter`.
    pub fn from_identifier(id: &str) -> FontFamily {
        let key: String = id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "ebgaramond" | "garamond" | "georgia" | "merriweather" | "playfairdisplay"
            | "playfair" | "lora" | "crimsontext" => FontFamily::EbGaramond,
            "lato" | "montserrat" | "poppins" | "raleway" | "nunito" | "sourcesanspro"
            | "sourcesans" => FontFamily::Lato,
            "oswald" | "robotocondensed" | "bebasneue" | "fjallaone" => FontFamily::Oswald,
            "computermodern" | "latinmodern" | "times" | "timesnewroman" | "ptserif"
            | "librebaskerville" => FontFamily::ComputerModern,
            _ => FontFamily::Inter,
        }
    }

    /// Width relative to the base table.
    fn width_scale(self) -> f32 {
        match self {
            FontFamily::Inter => 1.0,
            FontFamily::EbGaramond => 0.85,
            FontFamily::Lato => 1.05,
            FontFamily::Oswald => 0.68,
            FontFamily::ComputerModern => 0.90,
        }
    }

    /// Generic CSS fallback appended to the family name in painted output.
    pub fn generic(self) -> &'static str {
        match self {
            FontFamily::EbGaramond | FontFamily::ComputerModern => "serif",
            _ => "sans-serif",
        }
    }
}

/// Renders a font identifier as a CSS family list: `"open-sans"` → `Open Sans, sans-serif`.
pub fn css_font_stack(id: &str) -> String {
    let family = FontFamily::from_identifier(id);
    let display: Vec<String> = id
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if display.is_empty() {
        return family.generic().to_string();
    }
    format!("{}, {}", display.join(" "), family.generic())
}

// ────────────────────────────────────────────────────────────────────────────
// Metric table
// ────────────────────────────────────────────────────────────────────────────

/// Bold runs are measured this much wider than regular ones.
const BOLD_FACTOR: f32 = 1.06;
const AVERAGE_CHAR_WIDTH: f32 = 0.52;

#[rustfmt::skip]
static BASE_WIDTHS: [f32; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
    // 0-9
    0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
    // :     ;     <     =     >     ?     @
    0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
    // A-M
    0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
    // N-Z
    0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
    // [     \     ]     ^     _     `
    0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
    // a-m
    0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
    // n-z
    0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
    // {     |     }     ~
    0.33, 0.26, 0.33, 0.59,
];

/// Measures text for one metric family.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub family: FontFamily,
    scale: f32,
}

impl FontMetrics {
    pub fn new(family: FontFamily) -> Self {
        Self {
            family,
            scale: family.width_scale(),
        }
    }

    pub fn for_identifier(id: &str) -> Self {
        Self::new(FontFamily::from_identifier(id))
    }

    /// Width of `s` in em units. Non-ASCII characters use the average width.
    pub fn measure_em(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    BASE_WIDTHS[code - 32]
                } else {
                    AVERAGE_CHAR_WIDTH
                }
            })
            .sum::<f32>()
            * self.scale
    }

    /// Width of `s` in pixels at `size_px`.
    pub fn measure_px(&self, s: &str, size_px: f32, bold: bool) -> f32 {
        let w = self.measure_em(s) * size_px;
        if bold {
            w * BOLD_FACTOR
        } else {
            w
        }
    }

    /// Greedy word wrap at `max_width_px`. Returns the printed lines.
    ///
    /// A word wider than the line is broken between characters; its last
    /// piece can share a line with the words after it. Empty or
    /// whitespace-only input yields no lines.
    pub fn wrap(&self, text: &str, size_px: f32, bold: bool, max_width_px: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let space_w = self.measure_px(" ", size_px, bold);
        let mut current = String::new();
        let mut current_w = 0.0_f32;

        for word in text.split_whitespace() {
            let word_w = self.measure_px(word, size_px, bold);
            if word_w > max_width_px {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = self.break_word(word, size_px, bold, max_width_px);
                current = pieces.pop().unwrap_or_default();
                current_w = self.measure_px(&current, size_px, bold);
                lines.extend(pieces);
            } else if current.is_empty() {
                current.push_str(word);
                current_w = word_w;
            } else if current_w + space_w + word_w > max_width_px {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_w = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// Splits `word` into pieces no wider than `max_width_px`. Every piece
    /// holds at least one character.
    fn break_word(&self, word: &str, size_px: f32, bold: bool, max_width_px: f32) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut piece = String::new();
        let mut piece_w = 0.0_f32;
        let mut buf = [0u8; 4];
        for c in word.chars() {
            let char_w = self.measure_px(c.encode_utf8(&mut buf), size_px, bold);
            if !piece.is_empty() && piece_w + char_w > max_width_px {
                pieces.push(std::mem::take(&mut piece));
                piece_w = 0.0;
            }
            piece.push(c);
            piece_w += char_w;
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
