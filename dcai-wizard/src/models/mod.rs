//! Data models for dcai-wizard

pub mod wizard_session;

pub use wizard_session::{
    FormFieldsPatch, PersistedFile, QueryType, SessionError, Step, StepStatus, UploadedFile,
    WizardSession, WizardStorage, STEP_COUNT,
};
