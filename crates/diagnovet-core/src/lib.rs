//! DiagnoVet Core Library
//!
//! Local-first state for a veterinary diagnostic-report authoring wizard.
//!
//! # Architecture
//!
//! ```text
//!            UI shell (web / mobile / desktop)
//!                        │
//!                 DiagnoVetCore (FFI)
//!                        │
//!                     Session
//!        ┌───────────────┼────────────────┬──────────────┐
//!        ▼               ▼                ▼              ▼
//!  IdentityResolver  ReportRepository  WizardNavigator  Preferences
//!        │               │                               │
//!        └───────────────┴──────── KeyValueStore ────────┘
//!                                 (SQLite / memory)
//! ```
//!
//! # Core Principle
//!
//! **A doctor only ever sees their own reports.** Every read and write of the
//! shared report list goes through a repository scoped to the signed-in email.
//!
//! # Modules
//!
//! - [`store`]: Key-value storage port with SQLite and in-memory adapters
//! - [`models`]: Domain types (UserProfile, PatientCase, ReportRecord, etc.)
//! - [`identity`]: Email-keyed profile resolution and session resume
//! - [`reports`]: Owner-scoped report repository
//! - [`wizard`]: Step state machine with the analysis guard
//! - [`session`]: Controller tying the above to one store
//! - [`export`]: Printable report and clipboard summary

pub mod assist;
pub mod config;
pub mod export;
pub mod identity;
pub mod models;
pub mod preferences;
pub mod reports;
pub mod session;
pub mod store;
pub mod validation;
pub mod wizard;

// Re-export commonly used types
pub use assist::{DiagnosticAssistant, DiagnosticDraft, Finding, PlaceholderAssistant};
pub use config::AppConfig;
pub use identity::{IdentityResolver, Resolution};
pub use models::{
    ClinicRecord, Email, ImageRef, PatientCase, ReportRecord, ReportStatus, UserProfile,
};
pub use preferences::{Language, Preferences, Signature};
pub use reports::ReportRepository;
pub use session::{ImageBatch, RejectedImage, Session, SessionError};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use wizard::{LeaveOutcome, Step, WizardNavigator};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

type SharedSession = Session<Box<dyn KeyValueStore + Send>>;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DiagnoVetError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Navigation error: {0}")]
    NavigationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<SessionError> for DiagnoVetError {
    fn from(e: SessionError) -> Self {
        use crate::reports::RepositoryError;

        match e {
            SessionError::Store(e) => DiagnoVetError::StorageError(e.to_string()),
            SessionError::Validation(e) => DiagnoVetError::InvalidInput(e.to_string()),
            SessionError::Navigation(e) => DiagnoVetError::NavigationError(e.to_string()),
            SessionError::Repository(RepositoryError::Store(e)) => {
                DiagnoVetError::StorageError(e.to_string())
            }
            SessionError::Repository(RepositoryError::NotFound(id)) => {
                DiagnoVetError::NotFound(format!("report {}", id))
            }
            SessionError::Repository(RepositoryError::NotOwner(id)) => {
                DiagnoVetError::NotAuthorized(format!("report {}", id))
            }
            e @ (SessionError::NoActiveUser | SessionError::NoActiveCase) => {
                DiagnoVetError::NavigationError(e.to_string())
            }
            SessionError::UnsupportedCapability(what) => DiagnoVetError::Unsupported(what),
        }
    }
}

impl From<store::StoreError> for DiagnoVetError {
    fn from(e: store::StoreError) -> Self {
        DiagnoVetError::StorageError(e.to_string())
    }
}

impl From<config::ConfigError> for DiagnoVetError {
    fn from(e: config::ConfigError) -> Self {
        DiagnoVetError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for DiagnoVetError {
    fn from(e: serde_json::Error) -> Self {
        DiagnoVetError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DiagnoVetError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DiagnoVetError::StorageError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

fn open_with(config: AppConfig) -> Result<Arc<DiagnoVetCore>, DiagnoVetError> {
    let store = config.open_store()?;
    let session = Session::open(store, Box::new(PlaceholderAssistant), &config)?;
    Ok(Arc::new(DiagnoVetCore {
        session: Arc::new(Mutex::new(session)),
    }))
}

/// Open or create a session backed by a SQLite file at the given path.
#[uniffi::export]
pub fn open_session(path: String) -> Result<Arc<DiagnoVetCore>, DiagnoVetError> {
    let mut config = AppConfig::default();
    config.storage.path = Some(path.into());
    open_with(config)
}

/// Open a session from a TOML config file.
#[uniffi::export]
pub fn open_session_with_config(config_path: String) -> Result<Arc<DiagnoVetCore>, DiagnoVetError> {
    open_with(AppConfig::load(&config_path)?)
}

/// Create an in-memory session (for testing).
#[uniffi::export]
pub fn open_session_in_memory() -> Result<Arc<DiagnoVetCore>, DiagnoVetError> {
    open_with(AppConfig::default())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DiagnoVetCore {
    session: Arc<Mutex<SharedSession>>,
}

#[uniffi::export]
impl DiagnoVetCore {
    // =========================================================================
    // Navigation State
    // =========================================================================

    /// The active wizard step.
    pub fn current_step(&self) -> Result<FfiStep, DiagnoVetError> {
        let session = self.session.lock()?;
        Ok(session.step().into())
    }

    /// Whether a discard confirmation is waiting for an answer.
    pub fn is_confirmation_pending(&self) -> Result<bool, DiagnoVetError> {
        let session = self.session.lock()?;
        Ok(session.is_confirmation_pending())
    }

    /// The signed-in doctor's profile, if any.
    pub fn current_profile(&self) -> Result<Option<FfiProfile>, DiagnoVetError> {
        let session = self.session.lock()?;
        Ok(session.identity().map(|i| i.profile.clone().into()))
    }

    /// The signed-in doctor's clinic, if any.
    pub fn current_clinic(&self) -> Result<Option<FfiClinic>, DiagnoVetError> {
        let session = self.session.lock()?;
        Ok(session.identity().map(|i| i.clinic.clone().into()))
    }

    // =========================================================================
    // Login and Registration
    // =========================================================================

    pub fn submit_email(&self, email: String) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.submit_email(&email)?.into())
    }

    pub fn update_clinic(&self, clinic: FfiClinic) -> Result<(), DiagnoVetError> {
        let mut session = self.session.lock()?;
        session.update_clinic(clinic.into())?;
        Ok(())
    }

    pub fn submit_clinic(&self) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.submit_clinic()?.into())
    }

    pub fn update_profile(&self, profile: FfiProfile) -> Result<(), DiagnoVetError> {
        let mut session = self.session.lock()?;
        session.update_profile(profile.into())?;
        Ok(())
    }

    pub fn submit_profile(&self) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.submit_profile()?.into())
    }

    pub fn back(&self) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.back()?.into())
    }

    pub fn logout(&self) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.logout()?.into())
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// The signed-in doctor's reports, newest first.
    pub fn list_reports(&self) -> Result<Vec<FfiReport>, DiagnoVetError> {
        let mut session = self.session.lock()?;
        let reports = session.reports()?;
        Ok(reports.into_iter().map(|r| r.into()).collect())
    }

    pub fn delete_report(&self, id: i64) -> Result<bool, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.delete_report(id)?)
    }

    pub fn create_report(&self) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.create_report()?.into())
    }

    pub fn edit_report(&self, id: i64) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.edit_report(id)?.into())
    }

    // =========================================================================
    // Case Authoring
    // =========================================================================

    /// The case being authored, if any.
    pub fn current_case(&self) -> Result<Option<FfiCase>, DiagnoVetError> {
        let session = self.session.lock()?;
        Ok(session.case().cloned().map(|c| c.into()))
    }

    /// Replace the patient form fields. Images and id are kept.
    pub fn update_case(&self, fields: FfiCaseFields) -> Result<(), DiagnoVetError> {
        let mut session = self.session.lock()?;
        session.edit_case(|case| fields.apply_to(case))?;
        Ok(())
    }

    pub fn add_image(&self, image: FfiImage) -> Result<(), DiagnoVetError> {
        let mut session = self.session.lock()?;
        session.add_image(image.into())?;
        Ok(())
    }

    /// Attach a batch of images, skipping rejected files.
    pub fn add_images(&self, images: Vec<FfiImage>) -> Result<FfiImageBatch, DiagnoVetError> {
        let mut session = self.session.lock()?;
        let batch = session.add_images(images.into_iter().map(|i| i.into()).collect())?;
        Ok(batch.into())
    }

    pub fn remove_image(&self, index: u32) -> Result<bool, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.remove_image(index as usize)?.is_some())
    }

    pub fn set_speech_available(&self, available: bool) -> Result<(), DiagnoVetError> {
        let mut session = self.session.lock()?;
        session.set_speech_available(available);
        Ok(())
    }

    /// Locale tag to start the dictation engine with.
    pub fn begin_dictation(&self) -> Result<String, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.begin_dictation()?.to_string())
    }

    pub fn append_dictation(&self, segment: String) -> Result<(), DiagnoVetError> {
        let mut session = self.session.lock()?;
        session.append_dictation(&segment)?;
        Ok(())
    }

    pub fn continue_to_analysis(&self) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.continue_to_analysis()?.into())
    }

    /// Differentials from the last assistant draft, as JSON.
    pub fn diagnostic_draft_json(&self) -> Result<Option<String>, DiagnoVetError> {
        let session = self.session.lock()?;
        match session.diagnostic_draft() {
            Some(draft) => Ok(Some(serde_json::to_string(draft)?)),
            None => Ok(None),
        }
    }

    pub fn edit_diagnosis(&self, text: String) -> Result<(), DiagnoVetError> {
        let mut session = self.session.lock()?;
        session.edit_diagnosis(&text)?;
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> Result<bool, DiagnoVetError> {
        let session = self.session.lock()?;
        Ok(session.has_unsaved_changes())
    }

    pub fn save_report(&self) -> Result<FfiReport, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.save_report()?.into())
    }

    /// Save the open case as in-progress without leaving the editor.
    pub fn save_draft(&self) -> Result<FfiReport, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.save_draft()?.into())
    }

    pub fn finish_case(&self) -> Result<FfiReport, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.finish_case()?.into())
    }

    pub fn leave_case(&self) -> Result<FfiLeaveOutcome, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.leave_case()?.into())
    }

    pub fn confirm_discard(&self) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.confirm_discard()?.into())
    }

    pub fn stay(&self) -> Result<FfiStep, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.stay()?.into())
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    /// Interface language code ("es" or "en").
    pub fn language(&self) -> Result<String, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.language()?.code().to_string())
    }

    pub fn set_language(&self, code: String) -> Result<(), DiagnoVetError> {
        let language: Language = code.parse().map_err(DiagnoVetError::InvalidInput)?;
        let mut session = self.session.lock()?;
        session.set_language(language)?;
        Ok(())
    }

    pub fn toggle_language(&self) -> Result<String, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.toggle_language()?.code().to_string())
    }

    pub fn set_signature(&self, data_url: String) -> Result<(), DiagnoVetError> {
        let mut session = self.session.lock()?;
        session.set_signature(&data_url)?;
        Ok(())
    }

    pub fn clear_signature(&self) -> Result<bool, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.clear_signature()?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Printable layout of a saved report as JSON.
    pub fn export_printable_json(&self, id: i64) -> Result<String, DiagnoVetError> {
        let mut session = self.session.lock()?;
        let printable = session.printable_report(id)?;
        Ok(printable.to_json()?)
    }

    /// Plain-text summary for the clipboard.
    pub fn export_summary(&self, id: i64) -> Result<String, DiagnoVetError> {
        let mut session = self.session.lock()?;
        Ok(session.report_summary(id)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiStep {
    Login,
    PreConfirmation,
    PostConfirmation,
    Dashboard,
    Analyze,
    AnalysisCase,
}

impl From<Step> for FfiStep {
    fn from(step: Step) -> Self {
        match step {
            Step::Login => FfiStep::Login,
            Step::PreConfirmation => FfiStep::PreConfirmation,
            Step::PostConfirmation => FfiStep::PostConfirmation,
            Step::Dashboard => FfiStep::Dashboard,
            Step::Analyze => FfiStep::Analyze,
            Step::AnalysisCase => FfiStep::AnalysisCase,
        }
    }
}

/// FFI-safe outcome of leaving the report editor.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiLeaveOutcome {
    Left { step: FfiStep },
    ConfirmationRequired,
}

impl From<LeaveOutcome> for FfiLeaveOutcome {
    fn from(outcome: LeaveOutcome) -> Self {
        match outcome {
            LeaveOutcome::Left(step) => FfiLeaveOutcome::Left { step: step.into() },
            LeaveOutcome::ConfirmationRequired => FfiLeaveOutcome::ConfirmationRequired,
        }
    }
}

/// FFI-safe doctor profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProfile {
    pub email: String,
    pub full_name: String,
    pub title: String,
    pub phone: String,
    pub license: String,
}

impl From<UserProfile> for FfiProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            email: profile.email,
            full_name: profile.full_name,
            title: profile.title,
            phone: profile.phone,
            license: profile.license,
        }
    }
}

impl From<FfiProfile> for UserProfile {
    fn from(profile: FfiProfile) -> Self {
        UserProfile {
            email: profile.email,
            full_name: profile.full_name,
            title: profile.title,
            phone: profile.phone,
            license: profile.license,
        }
    }
}

/// FFI-safe clinic record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinic {
    pub clinic_name: String,
    pub address: String,
    pub phone: String,
}

impl From<ClinicRecord> for FfiClinic {
    fn from(clinic: ClinicRecord) -> Self {
        Self {
            clinic_name: clinic.clinic_name,
            address: clinic.address,
            phone: clinic.phone,
        }
    }
}

impl From<FfiClinic> for ClinicRecord {
    fn from(clinic: FfiClinic) -> Self {
        ClinicRecord {
            clinic_name: clinic.clinic_name,
            address: clinic.address,
            phone: clinic.phone,
        }
    }
}

/// FFI-safe image reference.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImage {
    pub file_name: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub uri: String,
}

impl From<ImageRef> for FfiImage {
    fn from(image: ImageRef) -> Self {
        Self {
            file_name: image.file_name,
            media_type: image.media_type,
            size_bytes: image.size_bytes,
            uri: image.uri,
        }
    }
}

impl From<FfiImage> for ImageRef {
    fn from(image: FfiImage) -> Self {
        ImageRef::new(image.file_name, image.media_type, image.size_bytes, image.uri)
    }
}

/// FFI-safe file skipped by a batch upload.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRejectedImage {
    pub file_name: String,
    pub reason: String,
}

/// FFI-safe batch upload outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImageBatch {
    pub added: u32,
    pub rejected: Vec<FfiRejectedImage>,
}

impl From<session::ImageBatch> for FfiImageBatch {
    fn from(batch: session::ImageBatch) -> Self {
        Self {
            added: batch.added as u32,
            rejected: batch
                .rejected
                .into_iter()
                .map(|r| FfiRejectedImage {
                    file_name: r.file_name,
                    reason: r.error.to_string(),
                })
                .collect(),
        }
    }
}

/// FFI-safe patient form fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCaseFields {
    pub animal_name: String,
    pub tutor_name: String,
    pub species: String,
    pub gender: String,
    pub age: String,
    pub weight: String,
    pub reason: String,
    pub study_type: String,
    pub observations: String,
}

impl FfiCaseFields {
    fn apply_to(self, case: &mut PatientCase) {
        case.animal_name = self.animal_name;
        case.tutor_name = self.tutor_name;
        case.species = self.species;
        case.gender = self.gender;
        case.age = self.age;
        case.weight = self.weight;
        case.reason = self.reason;
        case.study_type = self.study_type;
        case.observations = self.observations;
    }
}

/// FFI-safe case being authored.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCase {
    pub id: Option<i64>,
    pub fields: FfiCaseFields,
    pub diagnostic_text: String,
    pub images: Vec<FfiImage>,
}

impl From<PatientCase> for FfiCase {
    fn from(case: PatientCase) -> Self {
        Self {
            id: case.id,
            fields: FfiCaseFields {
                animal_name: case.animal_name,
                tutor_name: case.tutor_name,
                species: case.species,
                gender: case.gender,
                age: case.age,
                weight: case.weight,
                reason: case.reason,
                study_type: case.study_type,
                observations: case.observations,
            },
            diagnostic_text: case.diagnostic_text,
            images: case.images.into_iter().map(|i| i.into()).collect(),
        }
    }
}

/// FFI-safe saved report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReport {
    pub id: i64,
    pub patient: String,
    pub tutor: String,
    pub species: String,
    pub study: String,
    pub diagnostic_text: String,
    pub creator_email: String,
    pub date: String,
    pub status: String,
    pub image_count: u32,
}

impl From<ReportRecord> for FfiReport {
    fn from(record: ReportRecord) -> Self {
        Self {
            id: record.id,
            patient: record.patient,
            tutor: record.tutor,
            species: record.species,
            study: record.study,
            diagnostic_text: record.diagnostic_text,
            creator_email: record.creator_email,
            date: record.date,
            status: record.status.as_str().to_string(),
            image_count: record.images.len() as u32,
        }
    }
}
