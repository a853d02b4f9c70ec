use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

const MIN_EXPORT_SCALE: f32 = 1.0;
const MAX_EXPORT_SCALE: f32 = 8.0;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base URL of the HTML → DOCX converter. DOCX export is off when unset.
    pub docx_converter_url: Option<String>,
    pub docx_timeout_secs: u64,
    pub docx_max_attempts: u32,
    /// Raster oversampling factor for PDF and PNG.
    pub export_scale: f32,
    /// Base URL for public slug lookups.
    pub public_api_url: Option<String>,
    pub font_dir: Option<PathBuf>,
    pub document_cache_capacity: usize,
    /// Per-request timeout for images referenced by a CV.
    pub image_fetch_timeout_secs: u64,
    pub image_max_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let export_scale: f32 = parse_or(&optional, "EXPORT_SCALE", 4.0)?;
        if !export_scale.is_finite() {
            anyhow::bail!("EXPORT_SCALE must be a finite number");
        }

        Ok(Config {
            port: parse_or(&optional, "PORT", 8080)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            docx_converter_url: optional("DOCX_CONVERTER_URL"),
            docx_timeout_secs: parse_or(&optional, "DOCX_TIMEOUT_SECS", 60)?,
            docx_max_attempts: parse_or::<u32>(&optional, "DOCX_MAX_ATTEMPTS", 2)?.max(1),
            export_scale: export_scale.clamp(MIN_EXPORT_SCALE, MAX_EXPORT_SCALE),
            public_api_url: optional("PUBLIC_API_URL"),
            font_dir: optional("FONT_DIR").map(PathBuf::from),
            document_cache_capacity: parse_or(&optional, "DOCUMENT_CACHE_CAPACITY", 64)?,
            image_fetch_timeout_secs: parse_or(&optional, "IMAGE_FETCH_TIMEOUT_SECS", 10)?,
            image_max_bytes: parse_or(&optional, "IMAGE_MAX_BYTES", 5 * 1024 * 1024)?,
        })
    }
}

fn parse_or<T>(optional: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
