//! Persisted wizard store
//!
//! Owns the wizard session behind an `RwLock` and routes every mutation
//! through named action methods. After each mutation the persisted subset is
//! written to the settings table; persistence failures are logged and never
//! interrupt the interactive flow (a user may silently lose resume
//! capability, which is accepted degradation).

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use dcai_common::tabular::Record;
use dcai_common::Result;

use crate::db;
use crate::models::{
    FormFieldsPatch, PersistedFile, SessionError, StepStatus, UploadedFile, WizardSession,
    WizardStorage,
};

/// Shared handle to the wizard session and its persistence channel
#[derive(Clone)]
pub struct SessionStore {
    session: Arc<RwLock<WizardSession>>,
    db: SqlitePool,
}

impl SessionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            session: Arc::new(RwLock::new(WizardSession::new())),
            db,
        }
    }

    /// Clone of the current session
    pub async fn snapshot(&self) -> WizardSession {
        self.session.read().await.clone()
    }

    /// Current generation counter (capture before a long backend call)
    pub async fn generation(&self) -> u64 {
        self.session.read().await.generation
    }

    /// Load the persisted document back into memory. Called once on startup;
    /// `has_hydrated` becomes true afterwards whether or not a document
    /// existed.
    pub async fn hydrate(&self) -> Result<()> {
        let stored = db::settings::load_wizard_storage(&self.db).await?;

        let mut session = self.session.write().await;
        match stored {
            Some(doc) => {
                doc.apply_to(&mut session);
                info!(
                    current_step = session.current_step,
                    "Wizard state rehydrated from database"
                );
            }
            None => {
                info!("No persisted wizard state found; starting fresh");
            }
        }
        session.has_hydrated = true;

        Ok(())
    }

    /// Write the persisted subset of the session. Failures are logged only.
    async fn persist(&self) {
        let doc = {
            let session = self.session.read().await;
            WizardStorage::from_session(&session)
        };
        if let Err(e) = db::settings::save_wizard_storage(&self.db, &doc).await {
            warn!("Failed to persist wizard state: {}", e);
        }
    }

    /// Set (or clear) the uploaded file. A non-empty file is mirrored into
    /// the base64 surrogate so it survives a restart; a new upload bumps the
    /// generation so stale in-flight results get discarded.
    pub async fn set_uploaded_file(&self, file: Option<UploadedFile>) {
        {
            let mut session = self.session.write().await;
            session.generation += 1;
            match file {
                Some(file) => {
                    session.persisted_file = Some(PersistedFile {
                        name: file.name.clone(),
                        size: file.bytes.len() as u64,
                        mime_type: file.mime_type.clone(),
                        last_modified: file.last_modified,
                        data: BASE64.encode(&file.bytes),
                    });
                    session.uploaded_file = Some(file);
                }
                None => {
                    session.uploaded_file = None;
                    session.persisted_file = None;
                }
            }
        }
        self.persist().await;
    }

    /// Reconstruct the in-memory file handle from the persisted surrogate.
    /// No-op when a handle already exists or no surrogate was stored; decode
    /// failures are logged, not surfaced.
    pub async fn restore_file_from_persisted(&self) -> bool {
        let mut session = self.session.write().await;
        if session.uploaded_file.is_some() {
            return true;
        }
        let Some(persisted) = session.persisted_file.clone() else {
            return false;
        };

        match BASE64.decode(persisted.data.as_bytes()) {
            Ok(bytes) => {
                session.uploaded_file = Some(UploadedFile {
                    name: persisted.name,
                    mime_type: persisted.mime_type,
                    last_modified: persisted.last_modified,
                    bytes,
                });
                true
            }
            Err(e) => {
                error!("Error restoring file from persisted data: {}", e);
                false
            }
        }
    }

    pub async fn set_extracted_text(&self, text: String) {
        self.session.write().await.extracted_text = text;
        self.persist().await;
    }

    /// Apply extracted text only if the captured generation is still current
    pub async fn apply_extracted_text_if_current(
        &self,
        generation: u64,
        text: String,
    ) -> std::result::Result<(), SessionError> {
        {
            let mut session = self.session.write().await;
            check_generation(&session, generation)?;
            session.extracted_text = text;
        }
        self.persist().await;
        Ok(())
    }

    pub async fn set_processed_data(
        &self,
        records: Option<Vec<Record>>,
        user_order: Option<Vec<String>>,
    ) -> std::result::Result<(), SessionError> {
        self.session
            .write()
            .await
            .set_processed_data(records, user_order)?;
        self.persist().await;
        Ok(())
    }

    /// Apply AI output only if the captured generation is still current
    pub async fn apply_processed_data_if_current(
        &self,
        generation: u64,
        records: Option<Vec<Record>>,
        user_order: Option<Vec<String>>,
    ) -> std::result::Result<(), SessionError> {
        {
            let mut session = self.session.write().await;
            check_generation(&session, generation)?;
            session.set_processed_data(records, user_order)?;
        }
        self.persist().await;
        Ok(())
    }

    pub async fn update_column_order(
        &self,
        new_order: Vec<String>,
    ) -> std::result::Result<(), SessionError> {
        self.session.write().await.update_column_order(new_order)?;
        self.persist().await;
        Ok(())
    }

    pub async fn go_to_step(&self, step: i64) -> std::result::Result<usize, SessionError> {
        let current = self.session.write().await.go_to_step(step)?;
        self.persist().await;
        Ok(current)
    }

    pub async fn next_step(&self) -> std::result::Result<usize, SessionError> {
        let current = self.session.write().await.next_step()?;
        self.persist().await;
        Ok(current)
    }

    pub async fn previous_step(&self) -> std::result::Result<usize, SessionError> {
        let current = self.session.write().await.previous_step()?;
        self.persist().await;
        Ok(current)
    }

    pub async fn update_step_status(
        &self,
        index: usize,
        status: StepStatus,
    ) -> std::result::Result<(), SessionError> {
        self.session.write().await.update_step_status(index, status)?;
        self.persist().await;
        Ok(())
    }

    pub async fn apply_form_fields(&self, patch: FormFieldsPatch) {
        self.session.write().await.apply_form_fields(patch);
        self.persist().await;
    }

    /// Per-step busy flag for the extraction call (not persisted)
    pub async fn set_extracting(&self, extracting: bool) {
        self.session.write().await.is_extracting = extracting;
    }

    /// Per-step busy flag for the AI-cleaning call (not persisted)
    pub async fn set_processing(&self, processing: bool) {
        self.session.write().await.is_processing = processing;
    }

    /// Restore defaults (preserving hydration state) and persist
    pub async fn reset(&self) {
        self.session.write().await.reset();
        self.persist().await;
    }
}

fn check_generation(
    session: &WizardSession,
    generation: u64,
) -> std::result::Result<(), SessionError> {
    if session.generation != generation {
        warn!(
            given = generation,
            current = session.generation,
            "Discarding stale async completion"
        );
        return Err(SessionError::Stale {
            given: generation,
            current: session.generation,
        });
    }
    Ok(())
}
