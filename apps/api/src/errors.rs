use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                export_status(e)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn export_status(e: &ExportError) -> (StatusCode, &'static str, String) {
    match e {
        ExportError::MissingRenderTarget(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string()),
        ExportError::ConverterUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            e.to_string(),
        ),
        ExportError::RemoteConversion(msg) => {
            (StatusCode::BAD_GATEWAY, "REMOTE_CONVERSION_FAILED", msg.clone())
        }
        ExportError::Rasterization { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "RASTERIZATION_FAILED",
            e.to_string(),
        ),
        ExportError::Encoding(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "ENCODING_FAILED",
            "The exported file could not be encoded".to_string(),
        ),
    }
}
