//! Remote HTML → DOCX conversion client.
//!
//! Wire contract: `POST {endpoint}/docx` with `{html, filename}`. Success is
//! the binary document; failure is JSON `{error}`. There is no local fallback.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const RETRY_DELAY_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("converter returned {status}: {message}")]
    Server { status: u16, message: String },
}

impl DocxError {
    /// The message shown to the caller: the converter's own when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            DocxError::Server { message, .. } if !message.is_empty() => message.clone(),
            DocxError::Server { status, .. } => format!("DOCX conversion failed (status {status})"),
            DocxError::Http(e) if e.is_timeout() => "DOCX converter timed out".to_string(),
            DocxError::Http(_) => "DOCX converter is unreachable".to_string(),
        }
    }
}

#[async_trait]
pub trait DocxConverter: Send + Sync {
    async fn convert(&self, html: &str, filename: &str) -> Result<Bytes, DocxError>;
}

#[derive(Debug, Serialize)]
struct ConvertRequest<'a> {
    html: &'a str,
    filename: &'a str,
}

#[derive(Debug, Deserialize)]
struct ConverterError {
    error: String,
}

#[derive(Clone)]
pub struct RemoteDocxConverter {
    client: Client,
    endpoint: String,
    max_attempts: u32,
}

impl RemoteDocxConverter {
    pub fn new(base_url: &str, timeout: Duration, max_attempts: u32) -> Result<Self, DocxError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: format!("{}/docx", base_url.trim_end_matches('/')),
            max_attempts: max_attempts.max(1),
        })
    }

    fn retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        )
    }

    fn retryable_transport(e: &reqwest::Error) -> bool {
        e.is_timeout() || e.is_connect()
    }
}

#[async_trait]
impl DocxConverter for RemoteDocxConverter {
    /// Retries transport failures and 502/503/504 until attempts run out.
    /// Any other non-success status fails immediately.
    async fn convert(&self, html: &str, filename: &str) -> Result<Bytes, DocxError> {
        let body = ConvertRequest { html, filename };
        let mut last_error: Option<DocxError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = Duration::from_millis(RETRY_DELAY_MS * attempt as u64);
                warn!(
                    "DOCX conversion attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&self.endpoint).json(&body).send().await {
                Ok(r) => r,
                Err(e) if Self::retryable_transport(&e) => {
                    last_error = Some(DocxError::Http(e));
                    continue;
                }
                Err(e) => return Err(DocxError::Http(e)),
            };

            let status = response.status();

            if Self::retryable_status(status) {
                let text = response.text().await.unwrap_or_default();
                warn!("DOCX converter returned {}: {}", status, text);
                last_error = Some(DocxError::Server {
                    status: status.as_u16(),
                    message: parse_error(&text).unwrap_or_default(),
                });
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(DocxError::Server {
                    status: status.as_u16(),
                    message: parse_error(&text).unwrap_or_default(),
                });
            }

            let document = response.bytes().await?;
            debug!("DOCX conversion succeeded: {} bytes", document.len());
            return Ok(document);
        }

        Err(last_error.unwrap_or(DocxError::Server {
            status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            message: String::new(),
        }))
    }
}

fn parse_error(body: &str) -> Option<String> {
    serde_json::from_str::<ConverterError>(body)
        .ok()
        .map(|e| e.error)
        .filter(|m| !m.trim().is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
