use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status and version plus export pipeline state.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "vitae-api",
        "docx": state.exporter.docx_enabled(),
        "publicLookup": state.cv_source.is_some(),
        "exportScale": state.config.export_scale,
        "documents": state.documents.len().await,
        "activeExports": state.exporter.active_exports()
    }))
}
