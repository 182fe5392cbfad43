//! AI cleaning proxy
//!
//! POST /api/clean-with-ai validates the four required fields before any
//! network call, then forwards to the backend. Provider-specific failure
//! substrings are rewritten into actionable messages.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /api/clean-with-ai request
#[derive(Debug, Deserialize)]
pub struct CleanWithAiRequest {
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub ai_provider: Option<String>,
    #[serde(default)]
    pub user_api_key: Option<String>,
}

/// POST /api/clean-with-ai
pub async fn clean_with_ai(
    State(state): State<AppState>,
    Json(request): Json<CleanWithAiRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(extracted_text), Some(user_prompt), Some(ai_provider), Some(user_api_key)) = (
        required(request.extracted_text),
        required(request.user_prompt),
        required(request.ai_provider),
        required(request.user_api_key),
    ) else {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    };

    state.store.set_processing(true).await;
    let result = state
        .backend
        .clean_with_ai(&user_api_key, &extracted_text, &user_prompt, &ai_provider)
        .await;
    state.store.set_processing(false).await;

    if let Err(e) = &result {
        state.record_error(e.to_string()).await;
    }

    Ok(Json(result?))
}

/// Empty strings do not count as provided
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Build AI cleaning routes
pub fn clean_routes() -> Router<AppState> {
    Router::new().route("/api/clean-with-ai", post(clean_with_ai))
}
