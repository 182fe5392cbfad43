//! File upload proxy
//!
//! POST /api/upload-file validates the PDF locally (type, 10 MB cap),
//! records it in the wizard store, and forwards it to the backend.
//! GET /api/upload-file fetches the last-uploaded file's backend URL.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    error::{ApiError, ApiResult},
    models::UploadedFile,
    AppState,
};

/// Upload size cap, enforced before any network call
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit; leaves headroom over the cap so oversized files get
/// the explicit validation message instead of a bare 413
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// POST /api/upload-file
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Malformed multipart request".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload.pdf".to_string());
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::BadRequest("Malformed multipart request".to_string()))?
            .to_vec();

        file = Some(UploadedFile {
            name,
            mime_type,
            last_modified: chrono::Utc::now().timestamp_millis(),
            bytes,
        });
    }

    let Some(file) = file else {
        return Err(ApiError::BadRequest("No file provided".to_string()));
    };

    if file.mime_type != "application/pdf" && !file.name.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::BadRequest(format!(
            "File {} is not a PDF",
            file.name
        )));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::BadRequest(
            "File size must be less than 10MB".to_string(),
        ));
    }

    // The file handle belongs to the session whether or not the backend
    // accepts it; surrogate persistence failures only log.
    state.store.set_uploaded_file(Some(file.clone())).await;

    let backend_response = state
        .backend
        .upload(&file.name, &file.mime_type, file.bytes.clone())
        .await;
    if let Err(e) = &backend_response {
        state.record_error(e.to_string()).await;
    }
    let backend_response = backend_response?;

    tracing::info!(
        file = %file.name,
        size = file.bytes.len(),
        "File uploaded and forwarded to backend"
    );

    Ok(Json(json!({
        "success": true,
        "message": "File uploaded successfully",
        "file": {
            "name": file.name,
            "size": file.bytes.len(),
            "type": file.mime_type,
        },
        "backendResponse": backend_response,
    })))
}

/// GET /api/upload-file
pub async fn uploaded_file_url(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.backend.uploaded_file_url().await?;
    Ok(Json(result))
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload-file", post(upload_file).get(uploaded_file_url))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}
