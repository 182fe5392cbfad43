//! Prompt template proxy
//!
//! GET /api/prompt-templates fetches the backend's template catalog.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::Value;

use crate::{error::ApiResult, AppState};

/// GET /api/prompt-templates
pub async fn prompt_templates(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let templates = state.backend.prompt_templates().await?;
    Ok(Json(templates))
}

/// Build template routes
pub fn template_routes() -> Router<AppState> {
    Router::new().route("/api/prompt-templates", get(prompt_templates))
}
