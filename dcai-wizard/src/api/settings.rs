//! Settings API endpoints
//!
//! Stores the preferred AI provider and API key for the UI's convenience.
//! Proxy requests still carry the key in their bodies; nothing here is used
//! as a fallback.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /api/settings/api_key request
#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub provider: String,
    pub api_key: String,
}

/// Response payload for settings updates
#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/settings/api_key
///
/// **Request:** `{"provider": "gemini", "api_key": "..."}`
/// **Errors:** 400 for empty values, 500 for database write failures
pub async fn set_api_key(
    State(state): State<AppState>,
    Json(payload): Json<SetApiKeyRequest>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    if !crate::config::is_valid_value(&payload.provider) {
        return Err(ApiError::BadRequest(
            "Provider cannot be empty or whitespace-only".to_string(),
        ));
    }
    if !crate::config::is_valid_value(&payload.api_key) {
        return Err(ApiError::BadRequest(
            "API key cannot be empty or whitespace-only".to_string(),
        ));
    }

    crate::db::settings::set_ai_provider(&state.db, payload.provider.clone())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save provider to database: {}", e)))?;
    crate::db::settings::set_ai_api_key(&state.db, payload.api_key)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save API key to database: {}", e)))?;

    info!(provider = %payload.provider, "AI provider credentials configured");

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: "AI provider credentials saved".to_string(),
    }))
}

/// GET /api/settings: provider name and whether a key is stored (the key
/// itself is never echoed back)
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let provider = crate::db::settings::get_ai_provider(&state.db)
        .await
        .map_err(ApiError::Common)?;
    let has_key = crate::db::settings::get_ai_api_key(&state.db)
        .await
        .map_err(ApiError::Common)?
        .is_some();

    Ok(Json(json!({
        "provider": provider,
        "apiKeyConfigured": has_key,
    })))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings))
        .route("/api/settings/api_key", post(set_api_key))
}
