//! Settings database operations
//!
//! Provides get/set accessors for the settings table following a key-value
//! pattern. The persisted wizard session document is one of these values.

use sqlx::{Pool, Sqlite};

use dcai_common::{Error, Result};

use crate::models::WizardStorage;

#[cfg(test)]
use sqlx::sqlite::SqlitePoolOptions;

/// Settings key holding the persisted wizard session document
pub const WIZARD_STORAGE_KEY: &str = "wizard-storage";

/// Get the configured AI provider name
///
/// **Returns:** Some(provider) if set, None otherwise
pub async fn get_ai_provider(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, "ai_provider").await
}

/// Set the AI provider name
pub async fn set_ai_provider(db: &Pool<Sqlite>, provider: String) -> Result<()> {
    set_setting(db, "ai_provider", provider).await
}

/// Get the stored AI API key
pub async fn get_ai_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, "ai_api_key").await
}

/// Set the AI API key
pub async fn set_ai_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, "ai_api_key", key).await
}

/// Save the wizard session document
pub async fn save_wizard_storage(db: &Pool<Sqlite>, doc: &WizardStorage) -> Result<()> {
    let json = serde_json::to_string(doc)
        .map_err(|e| Error::Internal(format!("Failed to serialize wizard state: {}", e)))?;
    set_setting(db, WIZARD_STORAGE_KEY, json).await
}

/// Load the wizard session document, if one has been persisted
pub async fn load_wizard_storage(db: &Pool<Sqlite>) -> Result<Option<WizardStorage>> {
    let json = get_setting::<String>(db, WIZARD_STORAGE_KEY).await?;
    match json {
        Some(json) => {
            let doc = serde_json::from_str(&json)
                .map_err(|e| Error::Internal(format!("Failed to deserialize wizard state: {}", e)))?;
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
