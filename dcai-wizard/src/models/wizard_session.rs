//! Wizard session state machine
//!
//! The session progresses through 4 gated steps:
//! Upload PDF → Text Extraction → Process with AI → Database Integration
//!
//! `cleaned_records` + `column_order` are the only tabular state; the
//! processed grid is computed from them on read and never stored in memory.

use dcai_common::tabular::{record_keys, records_to_grid, Record};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of wizard steps
pub const STEP_COUNT: usize = 4;

/// Step names, in order
const STEP_NAMES: [&str; STEP_COUNT] = [
    "Upload PDF",
    "Text Extraction",
    "Process with AI",
    "Database Integration",
];

/// Completion status of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Incomplete,
    Complete,
}

/// A wizard step record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub status: StepStatus,
}

/// SQL generation mode for the final step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Insert,
    Ai,
}

/// Transient in-memory handle to the uploaded binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub last_modified: i64,
    pub bytes: Vec<u8>,
}

/// Durable surrogate for the uploaded file (base64 payload), persisted so an
/// equivalent handle can be reconstructed after a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedFile {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(rename = "lastModified")]
    pub last_modified: i64,
    pub data: String,
}

/// Wizard session rule violations. Navigation and column-order requests are
/// rejected explicitly, never silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Step {0} is outside the wizard range 1-4")]
    OutOfRange(i64),

    #[error("Step {step} requires step {prerequisite} to be complete")]
    Gated { step: usize, prerequisite: usize },

    #[error("Step index {0} is out of bounds")]
    InvalidIndex(usize),

    #[error("Unknown column in new order: {0}")]
    UnknownColumn(String),

    #[error("Duplicate column in new order: {0}")]
    DuplicateColumn(String),

    #[error("Stale update discarded (generation {given}, current {current})")]
    Stale { given: u64, current: u64 },
}

/// Partial update for the user-editable form fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldsPatch {
    pub prompt: Option<String>,
    pub selected_template: Option<String>,
    pub table_name: Option<String>,
    pub query_type: Option<QueryType>,
    pub ai_prompt: Option<String>,
    pub show_full_table_step4: Option<bool>,
}

/// The wizard session: single source of truth for step progression, the
/// uploaded-file surrogate, extracted text, the tabular artifact, and the
/// user's form fields
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSession {
    pub current_step: usize,
    pub steps: Vec<Step>,

    pub uploaded_file: Option<UploadedFile>,
    pub persisted_file: Option<PersistedFile>,
    pub extracted_text: String,
    pub cleaned_records: Option<Vec<Record>>,
    pub column_order: Vec<String>,

    pub prompt: String,
    pub selected_template: String,

    pub table_name: String,
    pub query_type: QueryType,
    pub ai_prompt: String,
    pub show_full_table_step4: bool,

    pub is_extracting: bool,
    pub is_processing: bool,

    /// Bumped on reset and on a new upload; async completion handlers that
    /// captured an older value have their results discarded
    pub generation: u64,

    /// True only after persisted state has been loaded back on startup
    pub has_hydrated: bool,
}

impl WizardSession {
    /// Create a session with initial defaults
    pub fn new() -> Self {
        Self {
            current_step: 1,
            steps: STEP_NAMES
                .iter()
                .map(|name| Step {
                    name: name.to_string(),
                    status: StepStatus::Incomplete,
                })
                .collect(),
            uploaded_file: None,
            persisted_file: None,
            extracted_text: String::new(),
            cleaned_records: None,
            column_order: Vec::new(),
            prompt: String::new(),
            selected_template: String::new(),
            table_name: String::new(),
            query_type: QueryType::Insert,
            ai_prompt: String::new(),
            show_full_table_step4: false,
            is_extracting: false,
            is_processing: false,
            generation: 0,
            has_hydrated: false,
        }
    }

    /// Jump to step `n`. Step 1 is always reachable; any later step requires
    /// its predecessor to be complete (supports deep links regardless of the
    /// current position).
    pub fn go_to_step(&mut self, step: i64) -> Result<usize, SessionError> {
        if !(1..=STEP_COUNT as i64).contains(&step) {
            return Err(SessionError::OutOfRange(step));
        }
        let step = step as usize;
        if step > 1 && self.steps[step - 2].status != StepStatus::Complete {
            return Err(SessionError::Gated {
                step,
                prerequisite: step - 1,
            });
        }
        self.current_step = step;
        Ok(self.current_step)
    }

    /// Advance to the next step; requires the current step to be complete
    pub fn next_step(&mut self) -> Result<usize, SessionError> {
        if self.current_step >= STEP_COUNT {
            return Err(SessionError::OutOfRange(self.current_step as i64 + 1));
        }
        if !self.can_go_to_next_step() {
            return Err(SessionError::Gated {
                step: self.current_step + 1,
                prerequisite: self.current_step,
            });
        }
        self.current_step += 1;
        Ok(self.current_step)
    }

    /// Go back one step. The step being left is marked incomplete again:
    /// revisiting consumes the completion, since downstream state may now be
    /// stale.
    pub fn previous_step(&mut self) -> Result<usize, SessionError> {
        if self.current_step <= 1 {
            return Err(SessionError::OutOfRange(0));
        }
        self.steps[self.current_step - 1].status = StepStatus::Incomplete;
        self.current_step -= 1;
        Ok(self.current_step)
    }

    /// Whether the current step's completion allows advancing
    pub fn can_go_to_next_step(&self) -> bool {
        self.steps[self.current_step - 1].status == StepStatus::Complete
    }

    /// Set the completion status of a step (0-based index)
    pub fn update_step_status(
        &mut self,
        index: usize,
        status: StepStatus,
    ) -> Result<(), SessionError> {
        let step = self
            .steps
            .get_mut(index)
            .ok_or(SessionError::InvalidIndex(index))?;
        step.status = status;
        Ok(())
    }

    /// Canonical entry point for new AI output.
    ///
    /// Non-empty records adopt `user_order` (validated against the record
    /// keys) or default to the first record's key order. Empty or absent
    /// records are stored as given and the grid view empties; `None`
    /// propagates downstream as "no data".
    pub fn set_processed_data(
        &mut self,
        records: Option<Vec<Record>>,
        user_order: Option<Vec<String>>,
    ) -> Result<(), SessionError> {
        match records {
            Some(records) if !records.is_empty() => {
                let order = match user_order.filter(|order| !order.is_empty()) {
                    Some(order) => {
                        validate_column_order(&order, &records[0])?;
                        order
                    }
                    None => record_keys(&records[0]),
                };
                self.column_order = order;
                self.cleaned_records = Some(records);
            }
            other => {
                self.cleaned_records = other;
            }
        }
        Ok(())
    }

    /// Adopt a new column order. Records are never mutated, so reordering is
    /// non-destructive and reversible; with no records only the order
    /// changes.
    pub fn update_column_order(&mut self, new_order: Vec<String>) -> Result<(), SessionError> {
        if let Some(records) = self.cleaned_records.as_ref().filter(|r| !r.is_empty()) {
            validate_column_order(&new_order, &records[0])?;
        }
        self.column_order = new_order;
        Ok(())
    }

    /// The 2D grid view: `[column_order, ...rows]`, recomputed from the
    /// records on every read. `None` mirrors absent records.
    pub fn processed_grid(&self) -> Option<Vec<Vec<String>>> {
        self.cleaned_records
            .as_ref()
            .map(|records| records_to_grid(records, &self.column_order))
    }

    /// Apply a partial form-field update
    pub fn apply_form_fields(&mut self, patch: FormFieldsPatch) {
        if let Some(prompt) = patch.prompt {
            self.prompt = prompt;
        }
        if let Some(template) = patch.selected_template {
            self.selected_template = template;
        }
        if let Some(table_name) = patch.table_name {
            self.table_name = table_name;
        }
        if let Some(query_type) = patch.query_type {
            self.query_type = query_type;
        }
        if let Some(ai_prompt) = patch.ai_prompt {
            self.ai_prompt = ai_prompt;
        }
        if let Some(show) = patch.show_full_table_step4 {
            self.show_full_table_step4 = show;
        }
    }

    /// Restore all fields to initial defaults, preserving `has_hydrated` and
    /// keeping the generation counter monotonic
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        let has_hydrated = self.has_hydrated;
        *self = Self::new();
        self.generation = generation;
        self.has_hydrated = has_hydrated;
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Column orders must be permutations over known record keys
fn validate_column_order(order: &[String], record: &Record) -> Result<(), SessionError> {
    let mut seen = std::collections::HashSet::new();
    for name in order {
        if !record.contains_key(name) {
            return Err(SessionError::UnknownColumn(name.clone()));
        }
        if !seen.insert(name) {
            return Err(SessionError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}

/// The persisted subset of the session, stored as a JSON document under the
/// `wizard-storage` settings key. Field names are part of the stored-document
/// format and must stay stable; `processedData` carries the derived grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardStorage {
    pub current_step: usize,
    pub steps: Vec<Step>,
    pub persisted_file: Option<PersistedFile>,
    pub extracted_text: String,
    pub processed_data: Option<Vec<Vec<String>>>,
    #[serde(rename = "cleanedDataCSV")]
    pub cleaned_data_csv: Option<Vec<Record>>,
    pub column_order: Vec<String>,
    pub prompt: String,
    pub selected_template: String,
    pub table_name: String,
    pub query_type: QueryType,
    pub ai_prompt: String,
    pub show_full_table_step4: bool,
}

impl WizardStorage {
    /// Capture the persisted subset of a session
    pub fn from_session(session: &WizardSession) -> Self {
        Self {
            current_step: session.current_step,
            steps: session.steps.clone(),
            persisted_file: session.persisted_file.clone(),
            extracted_text: session.extracted_text.clone(),
            processed_data: session.processed_grid(),
            cleaned_data_csv: session.cleaned_records.clone(),
            column_order: session.column_order.clone(),
            prompt: session.prompt.clone(),
            selected_template: session.selected_template.clone(),
            table_name: session.table_name.clone(),
            query_type: session.query_type,
            ai_prompt: session.ai_prompt.clone(),
            show_full_table_step4: session.show_full_table_step4,
        }
    }

    /// Apply a stored document to a session during rehydration. The binary
    /// handle is not restored here (see `restore_file_from_persisted`);
    /// processing flags stay at their defaults. A malformed step list or
    /// step index falls back to defaults rather than violating invariants.
    pub fn apply_to(self, session: &mut WizardSession) {
        if self.steps.len() == STEP_COUNT {
            session.steps = self.steps;
        }
        if (1..=STEP_COUNT).contains(&self.current_step) {
            session.current_step = self.current_step;
        }
        session.persisted_file = self.persisted_file;
        session.extracted_text = self.extracted_text;
        session.cleaned_records = self.cleaned_data_csv;
        session.column_order = self.column_order;
        session.prompt = self.prompt;
        session.selected_template = self.selected_template;
        session.table_name = self.table_name;
        session.query_type = self.query_type;
        session.ai_prompt = self.ai_prompt;
        session.show_full_table_step4 = self.show_full_table_step4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.insert(k.to_string(), json!(v));
        }
        r
    }

    fn sample_records() -> Vec<Record> {
        vec![record(&[("name", "Hello"), ("val", "world")])]
    }

    #[test]
    fn new_session_defaults() {
        let session = WizardSession::new();

        assert_eq!(session.current_step, 1);
        assert_eq!(session.steps.len(), STEP_COUNT);
        assert!(session
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Incomplete));
        assert_eq!(session.steps[0].name, "Upload PDF");
        assert!(session.cleaned_records.is_none());
        assert!(!session.has_hydrated);
    }

    #[test]
    fn goto_rejects_out_of_range() {
        let mut session = WizardSession::new();

        assert_eq!(session.go_to_step(0), Err(SessionError::OutOfRange(0)));
        assert_eq!(session.go_to_step(7), Err(SessionError::OutOfRange(7)));
        assert_eq!(session.current_step, 1);
    }

    #[test]
    fn goto_gated_by_prerequisite_step() {
        let mut session = WizardSession::new();

        let result = session.go_to_step(3);
        assert_eq!(
            result,
            Err(SessionError::Gated {
                step: 3,
                prerequisite: 2
            })
        );
        assert_eq!(session.current_step, 1);

        session.update_step_status(1, StepStatus::Complete).unwrap();
        assert_eq!(session.go_to_step(3), Ok(3));
    }

    #[test]
    fn goto_step_one_always_allowed() {
        let mut session = WizardSession::new();
        session.update_step_status(0, StepStatus::Complete).unwrap();
        session.next_step().unwrap();

        assert_eq!(session.go_to_step(1), Ok(1));
    }

    #[test]
    fn next_requires_current_step_complete() {
        let mut session = WizardSession::new();

        assert!(matches!(
            session.next_step(),
            Err(SessionError::Gated { step: 2, .. })
        ));

        session.update_step_status(0, StepStatus::Complete).unwrap();
        assert_eq!(session.next_step(), Ok(2));
    }

    #[test]
    fn previous_marks_left_step_incomplete() {
        let mut session = WizardSession::new();
        session.update_step_status(0, StepStatus::Complete).unwrap();
        session.update_step_status(1, StepStatus::Complete).unwrap();
        session.next_step().unwrap();

        assert_eq!(session.previous_step(), Ok(1));
        assert_eq!(session.steps[1].status, StepStatus::Incomplete);
        assert_eq!(session.steps[0].status, StepStatus::Complete);
    }

    #[test]
    fn previous_rejected_on_first_step() {
        let mut session = WizardSession::new();
        assert_eq!(session.previous_step(), Err(SessionError::OutOfRange(0)));
    }

    #[test]
    fn processed_data_defaults_order_to_record_keys() {
        let mut session = WizardSession::new();

        session.set_processed_data(Some(sample_records()), None).unwrap();

        assert_eq!(session.column_order, vec!["name", "val"]);
        assert_eq!(
            session.processed_grid(),
            Some(vec![
                vec!["name".to_string(), "val".to_string()],
                vec!["Hello".to_string(), "world".to_string()],
            ])
        );
    }

    #[test]
    fn processed_data_honors_user_order() {
        let mut session = WizardSession::new();

        session
            .set_processed_data(
                Some(sample_records()),
                Some(vec!["val".to_string(), "name".to_string()]),
            )
            .unwrap();

        assert_eq!(session.column_order, vec!["val", "name"]);
    }

    #[test]
    fn processed_data_none_propagates_as_no_data() {
        let mut session = WizardSession::new();
        session.set_processed_data(Some(sample_records()), None).unwrap();

        session.set_processed_data(None, None).unwrap();

        assert!(session.cleaned_records.is_none());
        assert!(session.processed_grid().is_none());
        // column order survives a degenerate update
        assert_eq!(session.column_order, vec!["name", "val"]);
    }

    #[test]
    fn column_reorder_recomputes_grid_without_touching_records() {
        let mut session = WizardSession::new();
        session.set_processed_data(Some(sample_records()), None).unwrap();
        let records_before = session.cleaned_records.clone();

        session
            .update_column_order(vec!["val".to_string(), "name".to_string()])
            .unwrap();

        assert_eq!(session.cleaned_records, records_before);
        assert_eq!(
            session.processed_grid(),
            Some(vec![
                vec!["val".to_string(), "name".to_string()],
                vec!["world".to_string(), "Hello".to_string()],
            ])
        );
    }

    #[test]
    fn column_reorder_is_idempotent() {
        let mut session = WizardSession::new();
        session.set_processed_data(Some(sample_records()), None).unwrap();
        let order = vec!["val".to_string(), "name".to_string()];

        session.update_column_order(order.clone()).unwrap();
        let first = session.processed_grid();
        session.update_column_order(order).unwrap();

        assert_eq!(session.processed_grid(), first);
    }

    #[test]
    fn column_reorder_rejects_unknown_and_duplicate_names() {
        let mut session = WizardSession::new();
        session.set_processed_data(Some(sample_records()), None).unwrap();

        assert_eq!(
            session.update_column_order(vec!["bogus".to_string()]),
            Err(SessionError::UnknownColumn("bogus".to_string()))
        );
        assert_eq!(
            session.update_column_order(vec!["name".to_string(), "name".to_string()]),
            Err(SessionError::DuplicateColumn("name".to_string()))
        );
        assert_eq!(session.column_order, vec!["name", "val"]);
    }

    #[test]
    fn column_reorder_without_records_only_changes_order() {
        let mut session = WizardSession::new();

        session
            .update_column_order(vec!["anything".to_string()])
            .unwrap();

        assert_eq!(session.column_order, vec!["anything"]);
        assert!(session.processed_grid().is_none());
    }

    #[test]
    fn reset_preserves_hydration_and_bumps_generation() {
        let mut session = WizardSession::new();
        session.has_hydrated = true;
        session.generation = 3;
        session.update_step_status(0, StepStatus::Complete).unwrap();
        session.next_step().unwrap();
        session.set_processed_data(Some(sample_records()), None).unwrap();

        session.reset();

        assert_eq!(session.current_step, 1);
        assert!(session
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Incomplete));
        assert!(session.cleaned_records.is_none());
        assert!(session.column_order.is_empty());
        assert!(session.has_hydrated);
        assert_eq!(session.generation, 4);
    }

    #[test]
    fn storage_document_uses_camel_case_field_names() {
        let mut session = WizardSession::new();
        session.set_processed_data(Some(sample_records()), None).unwrap();
        session.table_name = "people".to_string();
        session.query_type = QueryType::Ai;

        let json_text =
            serde_json::to_string(&WizardStorage::from_session(&session)).unwrap();

        assert!(json_text.contains("\"currentStep\""));
        assert!(json_text.contains("\"cleanedDataCSV\""));
        assert!(json_text.contains("\"processedData\""));
        assert!(json_text.contains("\"columnOrder\""));
        assert!(json_text.contains("\"showFullTableStep4\""));
        assert!(json_text.contains("\"queryType\":\"ai\""));
        assert!(json_text.contains("\"status\":\"incomplete\""));
    }

    #[test]
    fn storage_round_trip_restores_session_subset() {
        let mut session = WizardSession::new();
        session.update_step_status(0, StepStatus::Complete).unwrap();
        session.next_step().unwrap();
        session.extracted_text = "Hello world".to_string();
        session.set_processed_data(Some(sample_records()), None).unwrap();
        session.prompt = "clean this".to_string();

        let doc = WizardStorage::from_session(&session);
        let json_text = serde_json::to_string(&doc).unwrap();
        let parsed: WizardStorage = serde_json::from_str(&json_text).unwrap();

        let mut restored = WizardSession::new();
        parsed.apply_to(&mut restored);

        assert_eq!(restored.current_step, 2);
        assert_eq!(restored.steps[0].status, StepStatus::Complete);
        assert_eq!(restored.extracted_text, "Hello world");
        assert_eq!(restored.cleaned_records, session.cleaned_records);
        assert_eq!(restored.column_order, session.column_order);
        assert_eq!(restored.prompt, "clean this");
        assert!(restored.uploaded_file.is_none());
    }

    #[test]
    fn corrupt_storage_step_index_falls_back_to_defaults() {
        let mut doc = WizardStorage::from_session(&WizardSession::new());
        doc.current_step = 9;
        doc.steps = Vec::new();

        let mut session = WizardSession::new();
        doc.apply_to(&mut session);

        assert_eq!(session.current_step, 1);
        assert_eq!(session.steps.len(), STEP_COUNT);
    }
}
