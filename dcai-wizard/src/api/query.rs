//! AI query generation proxy
//!
//! POST /api/generate-ai-query reshapes the camelCase request into the
//! backend's snake_case payload and normalizes provider failures.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /api/generate-ai-query request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQueryRequest {
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub headers: Option<Vec<String>>,
    #[serde(default)]
    pub sample_data: Option<Value>,
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// POST /api/generate-ai-query
pub async fn generate_ai_query(
    State(state): State<AppState>,
    Json(request): Json<GenerateQueryRequest>,
) -> ApiResult<Json<Value>> {
    let (
        Some(table_name),
        Some(headers),
        Some(sample_data),
        Some(user_prompt),
        Some(api_key),
        Some(provider),
    ) = (
        request.table_name.filter(|v| !v.is_empty()),
        request.headers.filter(|v| !v.is_empty()),
        request.sample_data.filter(|v| !v.is_null()),
        request.user_prompt.filter(|v| !v.is_empty()),
        request.api_key.filter(|v| !v.is_empty()),
        request.provider.filter(|v| !v.is_empty()),
    )
    else {
        return Err(ApiError::BadRequest(
            "Missing required fields: tableName, headers, sampleData, userPrompt, apiKey, or provider"
                .to_string(),
        ));
    };

    let result = state
        .backend
        .generate_query(
            &table_name,
            &headers,
            &sample_data,
            request.total_rows.unwrap_or(0),
            &user_prompt,
            &api_key,
            &provider,
        )
        .await;

    if let Err(e) = &result {
        state.record_error(e.to_string()).await;
    }

    Ok(Json(result?))
}

/// Build query generation routes
pub fn query_routes() -> Router<AppState> {
    Router::new().route("/api/generate-ai-query", post(generate_ai_query))
}
