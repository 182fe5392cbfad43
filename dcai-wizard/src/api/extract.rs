//! Text extraction proxy
//!
//! POST /api/extract-text forwards the uploaded file's URL to the backend
//! and returns `{file_url, text}`. Any backend failure is a plain 500.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{error::ApiResult, AppState};

/// POST /api/extract-text request
#[derive(Debug, Deserialize)]
pub struct ExtractTextRequest {
    #[serde(rename = "fileUrl", default)]
    pub file_url: Value,
}

/// POST /api/extract-text
pub async fn extract_text(
    State(state): State<AppState>,
    Json(request): Json<ExtractTextRequest>,
) -> ApiResult<Json<Value>> {
    state.store.set_extracting(true).await;
    let result = state.backend.extract_text(&request.file_url).await;
    state.store.set_extracting(false).await;

    if let Err(e) = &result {
        state.record_error(e.to_string()).await;
    }
    let data = result?;

    Ok(Json(json!({
        "file_url": data.get("file_url").cloned().unwrap_or(Value::Null),
        "text": data.get("text").cloned().unwrap_or(Value::Null),
    })))
}

/// Build extraction routes
pub fn extract_routes() -> Router<AppState> {
    Router::new().route("/api/extract-text", post(extract_text))
}
