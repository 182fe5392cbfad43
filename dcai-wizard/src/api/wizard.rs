//! Wizard session API
//!
//! Server-side surface of the persisted wizard store: session snapshot,
//! gated step navigation, tabular data and column-order mutation, and the
//! CSV / JSON / SQL exports. Navigation that breaks the gating rules is
//! rejected explicitly (400 for malformed requests, 409 for rule
//! conflicts), never silently ignored.

use axum::{
    extract::State,
    http::header,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use dcai_common::export;
use dcai_common::tabular::{self, Record};

use crate::{
    error::{ApiError, ApiResult},
    models::{FormFieldsPatch, QueryType, Step, StepStatus, WizardSession},
    AppState,
};

/// Uploaded-file metadata exposed to the UI (binary payload withheld)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub last_modified: i64,
}

/// GET /api/wizard response: the session snapshot, grid included
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub current_step: usize,
    pub steps: Vec<Step>,
    pub uploaded_file: Option<FileInfo>,
    pub has_persisted_file: bool,
    pub extracted_text: String,
    #[serde(rename = "cleanedDataCSV")]
    pub cleaned_data_csv: Option<Vec<Record>>,
    pub processed_data: Option<Vec<Vec<String>>>,
    pub column_order: Vec<String>,
    pub prompt: String,
    pub selected_template: String,
    pub table_name: String,
    pub query_type: QueryType,
    pub ai_prompt: String,
    pub show_full_table_step4: bool,
    pub is_extracting: bool,
    pub is_processing: bool,
    pub generation: u64,
    pub has_hydrated: bool,
}

impl From<WizardSession> for SessionSnapshot {
    fn from(session: WizardSession) -> Self {
        Self {
            processed_data: session.processed_grid(),
            current_step: session.current_step,
            steps: session.steps,
            uploaded_file: session.uploaded_file.map(|file| FileInfo {
                name: file.name,
                size: file.bytes.len() as u64,
                mime_type: file.mime_type,
                last_modified: file.last_modified,
            }),
            has_persisted_file: session.persisted_file.is_some(),
            extracted_text: session.extracted_text,
            cleaned_data_csv: session.cleaned_records,
            column_order: session.column_order,
            prompt: session.prompt,
            selected_template: session.selected_template,
            table_name: session.table_name,
            query_type: session.query_type,
            ai_prompt: session.ai_prompt,
            show_full_table_step4: session.show_full_table_step4,
            is_extracting: session.is_extracting,
            is_processing: session.is_processing,
            generation: session.generation,
            has_hydrated: session.has_hydrated,
        }
    }
}

/// GET /api/wizard
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.store.snapshot().await.into())
}

/// POST /api/wizard/next
pub async fn next_step(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let current = state.store.next_step().await?;
    Ok(Json(json!({ "currentStep": current })))
}

/// POST /api/wizard/previous
pub async fn previous_step(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let current = state.store.previous_step().await?;
    Ok(Json(json!({ "currentStep": current })))
}

/// POST /api/wizard/goto request
#[derive(Debug, Deserialize)]
pub struct GoToStepRequest {
    pub step: i64,
}

/// POST /api/wizard/goto
pub async fn go_to_step(
    State(state): State<AppState>,
    Json(request): Json<GoToStepRequest>,
) -> ApiResult<Json<Value>> {
    let current = state.store.go_to_step(request.step).await?;
    Ok(Json(json!({ "currentStep": current })))
}

/// POST /api/wizard/step-status request (0-based step index)
#[derive(Debug, Deserialize)]
pub struct StepStatusRequest {
    pub index: usize,
    pub status: StepStatus,
}

/// POST /api/wizard/step-status
pub async fn update_step_status(
    State(state): State<AppState>,
    Json(request): Json<StepStatusRequest>,
) -> ApiResult<Json<Value>> {
    state
        .store
        .update_step_status(request.index, request.status)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/wizard/reset
pub async fn reset_wizard(State(state): State<AppState>) -> Json<Value> {
    state.store.reset().await;
    Json(json!({ "currentStep": 1 }))
}

/// PUT /api/wizard/text request. `generation`, when present, is the counter
/// captured before the extraction call; a moved counter discards the write.
#[derive(Debug, Deserialize)]
pub struct SetTextRequest {
    pub text: String,
    #[serde(default)]
    pub generation: Option<u64>,
}

/// PUT /api/wizard/text
pub async fn set_extracted_text(
    State(state): State<AppState>,
    Json(request): Json<SetTextRequest>,
) -> ApiResult<Json<Value>> {
    match request.generation {
        Some(generation) => {
            state
                .store
                .apply_extracted_text_if_current(generation, request.text)
                .await?
        }
        None => state.store.set_extracted_text(request.text).await,
    }
    Ok(Json(json!({ "success": true })))
}

/// PUT /api/wizard/data request: new AI output. `records` is either an
/// array of objects or legacy CSV-shaped text (header line + data lines);
/// `null` propagates as "no data". `columnOrder` overrides the default key
/// order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDataRequest {
    #[serde(default)]
    pub records: Value,
    #[serde(default)]
    pub column_order: Option<Vec<String>>,
    #[serde(default)]
    pub generation: Option<u64>,
}

/// Decode the `records` field: object arrays pass through, strings take the
/// legacy delimited-text path, `null` stays "no data"
fn decode_records(records: Value) -> ApiResult<Option<Vec<Record>>> {
    match records {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(tabular::parse_delimited(&text))),
        Value::Array(_) => serde_json::from_value(records)
            .map(Some)
            .map_err(|_| ApiError::BadRequest("Records must be objects".to_string())),
        _ => Err(ApiError::BadRequest(
            "Records must be an array, a delimited string, or null".to_string(),
        )),
    }
}

/// PUT /api/wizard/data
pub async fn set_processed_data(
    State(state): State<AppState>,
    Json(request): Json<SetDataRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let records = decode_records(request.records)?;
    match request.generation {
        Some(generation) => {
            state
                .store
                .apply_processed_data_if_current(generation, records, request.column_order)
                .await?
        }
        None => {
            state
                .store
                .set_processed_data(records, request.column_order)
                .await?
        }
    }
    Ok(Json(state.store.snapshot().await.into()))
}

/// PUT /api/wizard/columns request
#[derive(Debug, Deserialize)]
pub struct SetColumnOrderRequest {
    pub order: Vec<String>,
}

/// PUT /api/wizard/columns
pub async fn update_column_order(
    State(state): State<AppState>,
    Json(request): Json<SetColumnOrderRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    state.store.update_column_order(request.order).await?;
    Ok(Json(state.store.snapshot().await.into()))
}

/// PUT /api/wizard/fields
pub async fn update_form_fields(
    State(state): State<AppState>,
    Json(patch): Json<FormFieldsPatch>,
) -> Json<Value> {
    state.store.apply_form_fields(patch).await;
    Json(json!({ "success": true }))
}

/// POST /api/wizard/restore-file
pub async fn restore_file(State(state): State<AppState>) -> Json<Value> {
    let restored = state.store.restore_file_from_persisted().await;
    Json(json!({ "restored": restored }))
}

/// GET /api/wizard/export/csv
pub async fn export_csv(State(state): State<AppState>) -> ApiResult<impl axum::response::IntoResponse> {
    let session = state.store.snapshot().await;
    let grid = session
        .processed_grid()
        .filter(|grid| !grid.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No data available to download".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"processed_data.csv\"".to_string(),
            ),
        ],
        export::to_csv(&grid),
    ))
}

/// GET /api/wizard/export/json
pub async fn export_json(State(state): State<AppState>) -> ApiResult<impl axum::response::IntoResponse> {
    let session = state.store.snapshot().await;
    let records = session
        .cleaned_records
        .as_ref()
        .filter(|records| !records.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No data available to download".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"data.json\"".to_string(),
            ),
        ],
        export::to_json(records, &session.column_order),
    ))
}

/// GET /api/wizard/export/sql, the template (non-AI) SQL path
pub async fn export_sql(State(state): State<AppState>) -> ApiResult<impl axum::response::IntoResponse> {
    let session = state.store.snapshot().await;
    let table_name = session.table_name.trim();
    let grid = session.processed_grid().filter(|grid| !grid.is_empty());
    let Some(grid) = grid else {
        return Err(ApiError::BadRequest(
            "Please provide a table name and ensure data is available".to_string(),
        ));
    };
    if table_name.is_empty() {
        return Err(ApiError::BadRequest(
            "Please provide a table name and ensure data is available".to_string(),
        ));
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/sql".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}_query.sql\"", table_name),
            ),
        ],
        export::insert_script(table_name, &grid),
    ))
}

/// Build wizard session routes
pub fn wizard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/wizard", get(get_session))
        .route("/api/wizard/next", post(next_step))
        .route("/api/wizard/previous", post(previous_step))
        .route("/api/wizard/goto", post(go_to_step))
        .route("/api/wizard/step-status", post(update_step_status))
        .route("/api/wizard/reset", post(reset_wizard))
        .route("/api/wizard/text", put(set_extracted_text))
        .route("/api/wizard/data", put(set_processed_data))
        .route("/api/wizard/columns", put(update_column_order))
        .route("/api/wizard/fields", put(update_form_fields))
        .route("/api/wizard/restore-file", post(restore_file))
        .route("/api/wizard/export/csv", get(export_csv))
        .route("/api/wizard/export/json", get(export_json))
        .route("/api/wizard/export/sql", get(export_sql))
}
