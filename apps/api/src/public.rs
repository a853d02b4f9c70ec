//! Slug-keyed public CV lookup.
//!
//! `GET {base}/public/cv/{slug}` → `{template?, cv, title?, id?}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::export::filename::FilenameHint;
use crate::models::cv::CvData;

const LOOKUP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCv {
    #[serde(default)]
    pub template: Option<String>,
    pub cv: CvData,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
}

impl PublicCv {
    /// The published title and id win over what the CV itself suggests.
    pub fn filename_hint(&self) -> FilenameHint {
        FilenameHint {
            title: self.title.clone().filter(|t| !t.trim().is_empty()),
            resource_id: self.id,
            ..Default::default()
        }
        .or(&FilenameHint::from_cv(&self.cv))
    }
}

#[derive(Debug, Error)]
pub enum PublicError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No public CV for '{0}'")]
    NotFound(String),

    #[error("Lookup returned {0}")]
    Status(u16),
}

#[async_trait]
pub trait CvSource: Send + Sync {
    async fn fetch(&self, slug: &str) -> Result<PublicCv, PublicError>;
}

/// Slugs are restricted so they cannot reshape the lookup path.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 128
        && slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub struct HttpCvSource {
    client: Client,
    base_url: String,
}

impl HttpCvSource {
    pub fn new(base_url: &str) -> Result<Self, PublicError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CvSource for HttpCvSource {
    async fn fetch(&self, slug: &str) -> Result<PublicCv, PublicError> {
        let url = format!("{}/public/cv/{}", self.base_url, slug);
        debug!("Fetching public CV from {url}");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(PublicError::NotFound(slug.to_string())),
            s if !s.is_success() => Err(PublicError::Status(s.as_u16())),
            _ => Ok(response.json::<PublicCv>().await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn lookup(Path(slug): Path<String>) -> axum::response::Response {
        if slug != "ada" {
            return AxumStatus::NOT_FOUND.into_response();
        }
        Json(json!({
            "template": "modern",
            "title": "Ada's CV",
            "id": 9,
            "cv": { "personalInfo": { "fullName": "Ada Lovelace" } }
        }))
        .into_response()
    }

    async fn spawn() -> String {
        let app = Router::new().route("/public/cv/:slug", get(lookup));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("ada-lovelace_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("../admin"));
        assert!(!is_valid_slug("a b"));
    }

    #[tokio::test]
    async fn test_fetch_found_and_missing() {
        let source = HttpCvSource::new(&spawn().await).unwrap();

        let found = source.fetch("ada").await.unwrap();
        assert_eq!(found.template.as_deref(), Some("modern"));
        assert_eq!(found.cv.personal_info.full_name, "Ada Lovelace");
        let hint = found.filename_hint();
        assert_eq!(hint.title.as_deref(), Some("Ada's CV"));
        assert_eq!(hint.resource_id, Some(9));

        assert!(matches!(source.fetch("nobody").await, Err(PublicError::NotFound(_))));
    }
}
