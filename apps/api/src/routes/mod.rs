pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::export::handlers as export;
use crate::render::handlers as render;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Render API
        .route("/api/v1/templates", get(render::handle_list_templates))
        .route("/api/v1/render", post(render::handle_render))
        .route("/api/v1/documents/:id", get(render::handle_get_document))
        // Export API
        .route(
            "/api/v1/documents/:id/export/:format",
            post(export::handle_export_document),
        )
        .route("/api/v1/export/:format", post(export::handle_render_export))
        .route(
            "/api/v1/public/:slug/export/:format",
            get(export::handle_public_export),
        )
        .with_state(state)
}
