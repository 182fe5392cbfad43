//! Backend proxy client
//!
//! All heavy lifting (PDF parsing, LLM invocation, query generation) lives
//! in an external backend reached over plain HTTP. This client is the single
//! egress point: one method per upstream endpoint, plus error-shape
//! normalization so callers always see `{"error": string}` material.
//!
//! No request timeouts are configured; an unresponsive backend leaves the
//! corresponding operation pending until the caller gives up.

use reqwest::multipart;
use serde_json::{json, Value};
use tracing::error;

use crate::error::{ApiError, ApiResult};

/// HTTP client for the configured backend origin
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl BackendClient {
    /// Create a client. `base_url` is optional; requests against an
    /// unconfigured client fail with an explicit configuration error rather
    /// than a generic network failure.
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    fn base(&self) -> ApiResult<&str> {
        self.base_url
            .as_deref()
            .ok_or_else(|| ApiError::Internal("Backend URL not configured".to_string()))
    }

    /// POST `{base}/upload`: forward the uploaded PDF as multipart form data
    pub async fn upload(&self, file_name: &str, mime_type: &str, bytes: Vec<u8>) -> ApiResult<Value> {
        let base = self.base()?;

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| {
                error!("Upload error for {}: {}", file_name, e);
                ApiError::Internal(format!("Failed to upload {}", file_name))
            })?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", base))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Upload error for {}: {}", file_name, e);
                ApiError::Internal(format!("Failed to upload {}", file_name))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Backend upload failed for {}: {}", file_name, body);
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                message: format!("Failed to upload {} to backend", file_name),
            });
        }

        response.json().await.map_err(|e| {
            error!("Upload error for {}: {}", file_name, e);
            ApiError::Internal(format!("Failed to upload {}", file_name))
        })
    }

    /// GET `{base}/uploaded-file-url`: URL of the last-uploaded file
    pub async fn uploaded_file_url(&self) -> ApiResult<Value> {
        let base = self.base()?;

        let response = self
            .http
            .get(format!("{}/uploaded-file-url", base))
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching uploaded file URL: {}", e);
                ApiError::Internal(
                    "Internal server error while fetching uploaded file URL".to_string(),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Failed to fetch uploaded file URL: {}", body);
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                message: "Failed to fetch uploaded file URL".to_string(),
            });
        }

        response.json().await.map_err(|e| {
            error!("Error fetching uploaded file URL: {}", e);
            ApiError::Internal("Internal server error while fetching uploaded file URL".to_string())
        })
    }

    /// POST `{base}/extract-text`: extract text from the uploaded PDF.
    /// Any backend failure surfaces as a plain 500.
    pub async fn extract_text(&self, file_url: &Value) -> ApiResult<Value> {
        let base = self.base()?;

        let response = self
            .http
            .post(format!("{}/extract-text", base))
            .json(&json!({ "fileUrl": file_url }))
            .send()
            .await
            .map_err(|e| {
                error!("Text extraction request failed: {}", e);
                ApiError::Internal("Failed to extract text".to_string())
            })?;

        if !response.status().is_success() {
            return Err(ApiError::Internal("Failed to extract text".to_string()));
        }

        response
            .json()
            .await
            .map_err(|_| ApiError::Internal("Failed to extract text".to_string()))
    }

    /// POST `{base}/clean-with-ai`: structure extracted text into records
    pub async fn clean_with_ai(
        &self,
        api_key: &str,
        extracted_text: &str,
        user_prompt: &str,
        ai_provider: &str,
    ) -> ApiResult<Value> {
        let base = self.base()?;

        let response = self
            .http
            .post(format!("{}/clean-with-ai", base))
            .json(&json!({
                "user_api_key": api_key,
                "extracted_text": extracted_text,
                "user_prompt": user_prompt,
                "ai_provider": ai_provider,
            }))
            .send()
            .await
            .map_err(|e| {
                error!("AI cleaning request failed: {}", e);
                ApiError::Internal("Failed to process request".to_string())
            })?;

        self.json_or_provider_error(response, "Failed to process text with AI")
            .await
    }

    /// POST `{base}/generate-ai-query`: AI SQL generation from sampled data
    #[allow(clippy::too_many_arguments)]
    pub async fn generate_query(
        &self,
        table_name: &str,
        headers: &[String],
        sample_data: &Value,
        total_rows: u64,
        user_prompt: &str,
        api_key: &str,
        ai_provider: &str,
    ) -> ApiResult<Value> {
        let base = self.base()?;

        let response = self
            .http
            .post(format!("{}/generate-ai-query", base))
            .json(&json!({
                "table_name": table_name,
                "headers": headers,
                "sample_data": sample_data,
                "total_rows": total_rows,
                "user_prompt": user_prompt,
                "user_api_key": api_key,
                "ai_provider": ai_provider,
            }))
            .send()
            .await
            .map_err(|e| {
                error!("AI query generation request failed: {}", e);
                ApiError::Internal("Failed to generate AI query".to_string())
            })?;

        self.json_or_provider_error(response, "Failed to generate AI query")
            .await
    }

    /// GET `{base}/prompt-templates`
    pub async fn prompt_templates(&self) -> ApiResult<Value> {
        let base = self.base()?;

        let response = self
            .http
            .get(format!("{}/prompt-templates", base))
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching prompt templates: {}", e);
                ApiError::Internal(
                    "Internal server error while fetching prompt templates".to_string(),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Failed to fetch prompt templates: {}", body);
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                message: "Failed to fetch prompt templates".to_string(),
            });
        }

        response.json().await.map_err(|e| {
            error!("Error fetching prompt templates: {}", e);
            ApiError::Internal("Internal server error while fetching prompt templates".to_string())
        })
    }

    /// Decode a provider-backed response: success bodies pass through,
    /// failures are rewritten into actionable messages while preserving the
    /// upstream status code. Unparseable failure bodies stay generic so raw
    /// exception text never leaks.
    async fn json_or_provider_error(
        &self,
        response: reqwest::Response,
        fallback: &str,
    ) -> ApiResult<Value> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|_| ApiError::Internal("Failed to process request".to_string()));
        }

        let message = match response.json::<Value>().await {
            Ok(body) => normalize_provider_error(&upstream_error_message(&body, fallback)),
            Err(_) => "Failed to process request".to_string(),
        };

        Err(ApiError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull a human-readable message out of an upstream error body; the `error`
/// field may be a string or an object carrying `message`.
fn upstream_error_message(body: &Value, fallback: &str) -> String {
    match body.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()),
        None => fallback.to_string(),
    }
}

/// Rewrite provider-specific failure substrings into user-facing messages
pub fn normalize_provider_error(message: &str) -> String {
    if message.contains("API key not valid") || message.contains("INVALID_ARGUMENT") {
        "Invalid API key. Please check your API key and try again.".to_string()
    } else if message.contains("PERMISSION_DENIED") {
        "API access denied. Please check your API key permissions.".to_string()
    } else if message.contains("QUOTA_EXCEEDED") {
        "API quota exceeded. Please check your usage limits.".to_string()
    } else {
        message.to_string()
    }
}
