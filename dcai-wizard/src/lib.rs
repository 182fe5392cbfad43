//! dcai-wizard library interface
//!
//! Exposes the application state, router assembly, and all handler modules
//! for integration testing.

pub mod api;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::BackendClient;
use crate::store::SessionStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Persisted wizard session store
    pub store: SessionStore,
    /// Proxy client for the external backend
    pub backend: BackendClient,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, backend_url: Option<String>) -> Self {
        Self {
            store: SessionStore::new(db.clone()),
            db,
            backend: BackendClient::new(backend_url),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Record a failure for the health endpoint
    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI route (HTML page)
        .merge(api::ui_routes())
        // Backend proxy routes
        .merge(api::upload_routes())
        .merge(api::extract_routes())
        .merge(api::clean_routes())
        .merge(api::query_routes())
        .merge(api::template_routes())
        // Wizard session routes
        .merge(api::wizard_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .with_state(state)
}
