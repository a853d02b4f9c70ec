//! Remote images referenced by page surfaces.
//!
//! Rasterization never reaches the network or the local disk by itself.
//! `data:` hrefs resolve inline; http(s) hrefs resolve only from an
//! [`ImageSet`] fetched here before the first page is rasterized. Anything
//! else renders as an empty image.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

static IMAGE_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<image\b[^>]*?\b(?:xlink:)?href="([^"]*)""#).expect("valid image href regex")
});

#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(u16),

    #[error("image exceeds {0} bytes")]
    TooLarge(usize),
}

/// Fetched image bytes keyed by the href as it appears after XML unescaping.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    images: Arc<HashMap<String, Arc<Vec<u8>>>>,
}

impl ImageSet {
    pub fn get(&self, href: &str) -> Option<Arc<Vec<u8>>> {
        self.images.get(href).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl FromIterator<(String, Vec<u8>)> for ImageSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        Self {
            images: Arc::new(iter.into_iter().map(|(href, data)| (href, Arc::new(data))).collect()),
        }
    }
}

/// http(s) hrefs, the only ones fetched ahead of rasterization.
fn is_remote(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn unescape(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Distinct http(s) image hrefs across `svgs`, in first-seen order.
pub fn remote_hrefs<'a>(svgs: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for svg in svgs {
        for captures in IMAGE_HREF.captures_iter(svg) {
            let href = unescape(&captures[1]);
            if is_remote(&href) && !seen.contains(&href) {
                seen.push(href);
            }
        }
    }
    seen
}

pub struct ImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl ImageFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, ImageFetchError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            max_bytes,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageFetchError> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ImageFetchError::Status(response.status().as_u16()));
        }

        let declared = response.content_length().unwrap_or(0);
        if declared > self.max_bytes as u64 {
            return Err(ImageFetchError::TooLarge(self.max_bytes));
        }

        // the declared length is a hint; the streamed body is checked too
        let mut body = Vec::with_capacity(declared as usize);
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(ImageFetchError::TooLarge(self.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Fetches every remote image the surfaces reference. A failed fetch is
    /// logged and left out, so that image renders empty.
    pub async fn prefetch<'a>(&self, svgs: impl IntoIterator<Item = &'a str>) -> ImageSet {
        let mut fetched = Vec::new();
        for href in remote_hrefs(svgs) {
            match self.fetch(&href).await {
                Ok(data) => {
                    debug!("Fetched image {} ({} bytes)", href, data.len());
                    fetched.push((href, data));
                }
                Err(e) => warn!("Skipping image {}: {}", href, e),
            }
        }
        fetched.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    use super::*;

    async fn image(Path(name): Path<String>) -> axum::response::Response {
        match name.as_str() {
            "small.png" => vec![7u8; 16].into_response(),
            "large.png" => vec![7u8; 4096].into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn serve() -> String {
        let app = Router::new().route("/img/:name", get(image));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn fetcher(max_bytes: usize) -> ImageFetcher {
        ImageFetcher::new(Duration::from_secs(5), max_bytes).unwrap()
    }

    #[test]
    fn test_only_remote_hrefs_are_collected() {
        let page = r#"<svg><image x="0" xlink:href="https://a.example/p.png?w=1&amp;h=2"/>
            <image href="/etc/secret.png"/><image xlink:href="file:///etc/secret.png"/>
            <image xlink:href="data:image/png;base64,AAAA"/><a xlink:href="https://not-an-image.example"/></svg>"#;
        let other = r#"<svg><image xlink:href="https://a.example/p.png?w=1&amp;h=2"/>
            <image xlink:href="HTTP://b.example/bg.jpg"/></svg>"#;
        assert_eq!(
            remote_hrefs([page, other]),
            vec!["https://a.example/p.png?w=1&h=2".to_string(), "HTTP://b.example/bg.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_prefetch_keeps_successes_and_skips_failures() {
        let base = serve().await;
        let svg = format!(
            r#"<svg><image xlink:href="{base}/img/small.png"/><image xlink:href="{base}/img/missing.png"/></svg>"#
        );
        let images = fetcher(1024).prefetch([svg.as_str()]).await;

        assert_eq!(images.len(), 1);
        assert_eq!(images.get(&format!("{base}/img/small.png")).unwrap().len(), 16);
        assert!(images.get(&format!("{base}/img/missing.png")).is_none());
    }

    #[tokio::test]
    async fn test_oversized_image_is_skipped() {
        let base = serve().await;
        let svg = format!(r#"<svg><image xlink:href="{base}/img/large.png"/></svg>"#);
        let images = fetcher(1024).prefetch([svg.as_str()]).await;
        assert!(images.is_empty());

        let err = fetcher(1024).fetch(&format!("{base}/img/large.png")).await.unwrap_err();
        assert!(matches!(err, ImageFetchError::TooLarge(1024)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_skipped() {
        let images = fetcher(1024)
            .prefetch([r#"<svg><image xlink:href="http://127.0.0.1:1/p.png"/></svg>"#])
            .await;
        assert!(images.is_empty());
    }
}
