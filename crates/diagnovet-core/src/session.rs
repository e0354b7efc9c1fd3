//! Session controller.
//!
//! Binds the identity resolver, report repository and wizard navigator to
//! one store, and owns the state the UI renders: the active step, the
//! signed-in doctor, and the case being authored.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assist::{DiagnosticAssistant, DiagnosticDraft};
use crate::config::AppConfig;
use crate::export::{summary_text, PrintableReport};
use crate::identity::{IdentityError, IdentityResolver};
use crate::models::{ClinicRecord, Email, ImageRef, PatientCase, ReportRecord, UserProfile};
use crate::preferences::{Language, Preferences, Signature};
use crate::reports::{RepositoryError, ReportRepository};
use crate::store::{KeyValueStore, StoreError};
use crate::validation::{ImagePolicy, ValidationError};
use crate::wizard::{LeaveOutcome, NavigationError, Step, WizardEvent, WizardNavigator};

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("No user is signed in")]
    NoActiveUser,

    #[error("No case is open")]
    NoActiveCase,

    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),
}

impl From<IdentityError> for SessionError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Store(e) => SessionError::Store(e),
            IdentityError::Validation(e) => SessionError::Validation(e),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// The signed-in (or registering) doctor.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub email: Email,
    pub profile: UserProfile,
    pub clinic: ClinicRecord,
}

/// A file left out of a batch upload.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedImage {
    pub file_name: String,
    pub error: ValidationError,
}

/// Outcome of a batch upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageBatch {
    /// Files attached to the case
    pub added: usize,
    /// Files skipped, in upload order
    pub rejected: Vec<RejectedImage>,
}

/// Runtime state of one wizard session.
pub struct Session<S: KeyValueStore> {
    store: S,
    navigator: WizardNavigator,
    identity: Option<Identity>,
    case: Option<PatientCase>,
    unsaved: bool,
    draft: Option<DiagnosticDraft>,
    assistant: Box<dyn DiagnosticAssistant + Send>,
    image_policy: ImagePolicy,
    default_language: Language,
    speech_available: bool,
}

impl<S: KeyValueStore> Session<S> {
    /// Open a session, resuming at the dashboard if the last session's
    /// profile is still stored.
    pub fn open(
        store: S,
        assistant: Box<dyn DiagnosticAssistant + Send>,
        config: &AppConfig,
    ) -> SessionResult<Self> {
        let mut session = Self {
            store,
            navigator: WizardNavigator::new(),
            identity: None,
            case: None,
            unsaved: false,
            draft: None,
            assistant,
            image_policy: config.images.clone(),
            default_language: config.default_language,
            speech_available: false,
        };

        if let Some((email, profile, clinic)) = IdentityResolver::new(&mut session.store).resume()? {
            info!(email = %email, "Resuming last session");
            session.identity = Some(Identity {
                email,
                profile,
                clinic,
            });
            session.navigator.apply(WizardEvent::ExistingUser)?;
        }
        Ok(session)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn step(&self) -> Step {
        self.navigator.step()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn case(&self) -> Option<&PatientCase> {
        self.case.as_ref()
    }

    /// Whether the open case has edits not yet saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn is_confirmation_pending(&self) -> bool {
        self.navigator.is_confirmation_pending()
    }

    /// The last draft returned by the assistant for the open case.
    pub fn diagnostic_draft(&self) -> Option<&DiagnosticDraft> {
        self.draft.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn active_email(&self) -> SessionResult<Email> {
        self.identity
            .as_ref()
            .map(|i| i.email.clone())
            .ok_or(SessionError::NoActiveUser)
    }

    fn identity_mut(&mut self) -> SessionResult<&mut Identity> {
        self.identity.as_mut().ok_or(SessionError::NoActiveUser)
    }

    fn case_mut(&mut self) -> SessionResult<&mut PatientCase> {
        self.case.as_mut().ok_or(SessionError::NoActiveCase)
    }

    fn close_case(&mut self) {
        self.case = None;
        self.draft = None;
        self.unsaved = false;
    }

    // =========================================================================
    // Login and registration
    // =========================================================================

    /// Submit the login email. Invalid input changes nothing.
    pub fn submit_email(&mut self, raw: &str) -> SessionResult<Step> {
        let email = Email::parse(raw)?;
        self.navigator.expect(Step::Login)?;

        let resolution = IdentityResolver::new(&mut self.store).resolve(&email)?;
        let event = if resolution.is_existing() {
            WizardEvent::ExistingUser
        } else {
            WizardEvent::NewUser
        };
        let (profile, clinic) = resolution.into_parts();
        self.identity = Some(Identity {
            email,
            profile,
            clinic,
        });
        Ok(self.navigator.apply(event)?)
    }

    /// Replace the clinic form contents.
    pub fn update_clinic(&mut self, clinic: ClinicRecord) -> SessionResult<()> {
        self.navigator.expect(Step::PreConfirmation)?;
        self.identity_mut()?.clinic = clinic;
        Ok(())
    }

    /// Submit the clinic form.
    pub fn submit_clinic(&mut self) -> SessionResult<Step> {
        self.navigator.expect(Step::PreConfirmation)?;
        self.identity_mut()?.clinic.validate()?;
        Ok(self.navigator.apply(WizardEvent::ClinicEntered)?)
    }

    /// Replace the profile form contents. The email stays the session's.
    pub fn update_profile(&mut self, profile: UserProfile) -> SessionResult<()> {
        self.navigator.expect(Step::PostConfirmation)?;
        let identity = self.identity_mut()?;
        identity.profile = UserProfile {
            email: identity.email.to_string(),
            ..profile
        };
        Ok(())
    }

    /// Submit the profile form, persisting profile and clinic.
    pub fn submit_profile(&mut self) -> SessionResult<Step> {
        self.navigator.expect(Step::PostConfirmation)?;
        let identity = self.identity.as_ref().ok_or(SessionError::NoActiveUser)?;
        IdentityResolver::new(&mut self.store).register(
            &identity.email,
            &identity.profile,
            &identity.clinic,
        )?;
        Ok(self.navigator.apply(WizardEvent::ProfileEntered)?)
    }

    /// Go back one step. Returning to login forgets the typed identity.
    pub fn back(&mut self) -> SessionResult<Step> {
        let step = self.navigator.apply(WizardEvent::Back)?;
        match step {
            Step::Login => self.identity = None,
            Step::Dashboard => self.close_case(),
            _ => {}
        }
        Ok(step)
    }

    /// Sign out, forgetting the last session.
    pub fn logout(&mut self) -> SessionResult<Step> {
        self.navigator.expect(Step::Dashboard)?;
        IdentityResolver::new(&mut self.store).forget_session()?;
        let step = self.navigator.apply(WizardEvent::Logout)?;
        if let Some(identity) = self.identity.take() {
            info!(email = %identity.email, "Signed out");
        }
        Ok(step)
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// The signed-in doctor's reports, newest first.
    pub fn reports(&mut self) -> SessionResult<Vec<ReportRecord>> {
        let email = self.active_email()?;
        Ok(ReportRepository::for_owner(&mut self.store, &email).list()?)
    }

    /// Delete one of the signed-in doctor's reports.
    pub fn delete_report(&mut self, id: i64) -> SessionResult<bool> {
        let email = self.active_email()?;
        self.navigator.expect(Step::Dashboard)?;
        Ok(ReportRepository::for_owner(&mut self.store, &email).delete(id)?)
    }

    /// Start a new, empty case.
    pub fn create_report(&mut self) -> SessionResult<Step> {
        self.active_email()?;
        let step = self.navigator.apply(WizardEvent::CreateReport)?;
        self.close_case();
        self.case = Some(PatientCase::new());
        Ok(step)
    }

    /// Re-open a saved report directly in the editor.
    pub fn edit_report(&mut self, id: i64) -> SessionResult<Step> {
        let email = self.active_email()?;
        self.navigator.expect(Step::Dashboard)?;
        let record = ReportRepository::for_owner(&mut self.store, &email)
            .get(id)?
            .ok_or(RepositoryError::NotFound(id))?;

        let step = self.navigator.apply(WizardEvent::EditReport)?;
        self.close_case();
        self.case = Some(PatientCase::from_record(&record));
        debug!(id, "Editing saved report");
        Ok(step)
    }

    // =========================================================================
    // Case authoring
    // =========================================================================

    fn expect_authoring(&self) -> SessionResult<()> {
        match self.navigator.step() {
            Step::Analyze | Step::AnalysisCase => Ok(()),
            actual => Err(NavigationError::UnexpectedStep {
                expected: Step::Analyze,
                actual,
            }
            .into()),
        }
    }

    /// Edit the open case in place.
    pub fn edit_case<F>(&mut self, edit: F) -> SessionResult<()>
    where
        F: FnOnce(&mut PatientCase),
    {
        self.expect_authoring()?;
        edit(self.case_mut()?);
        self.unsaved = true;
        Ok(())
    }

    /// Attach an image after checking type and size.
    pub fn add_image(&mut self, image: ImageRef) -> SessionResult<()> {
        self.expect_authoring()?;
        self.image_policy.check(&image)?;
        self.case_mut()?.images.push(image);
        self.unsaved = true;
        Ok(())
    }

    /// Attach every acceptable image of a batch. Rejected files are skipped
    /// and reported back.
    pub fn add_images(&mut self, images: Vec<ImageRef>) -> SessionResult<ImageBatch> {
        self.expect_authoring()?;
        let case = self.case.as_mut().ok_or(SessionError::NoActiveCase)?;

        let mut batch = ImageBatch::default();
        for image in images {
            match self.image_policy.check(&image) {
                Ok(()) => {
                    case.images.push(image);
                    batch.added += 1;
                }
                Err(error) => {
                    warn!(file = %image.file_name, %error, "Skipping rejected image");
                    batch.rejected.push(RejectedImage {
                        file_name: image.file_name,
                        error,
                    });
                }
            }
        }
        if batch.added > 0 {
            self.unsaved = true;
        }
        Ok(batch)
    }

    /// Detach the image at `index`.
    pub fn remove_image(&mut self, index: usize) -> SessionResult<Option<ImageRef>> {
        self.expect_authoring()?;
        let removed = self.case_mut()?.remove_image(index);
        if removed.is_some() {
            self.unsaved = true;
        }
        Ok(removed)
    }

    /// Record whether the shell has a speech recognition engine.
    pub fn set_speech_available(&mut self, available: bool) {
        self.speech_available = available;
    }

    /// Locale tag to start dictation with.
    pub fn begin_dictation(&mut self) -> SessionResult<&'static str> {
        self.expect_authoring()?;
        if !self.speech_available {
            return Err(SessionError::UnsupportedCapability(
                "speech recognition".into(),
            ));
        }
        Ok(self.language()?.locale_tag())
    }

    /// Append a dictated segment to the consultation reason.
    pub fn append_dictation(&mut self, segment: &str) -> SessionResult<()> {
        self.edit_case(|case| case.append_dictation(segment))
    }

    /// Run the analysis guard and move to the report editor. A case without
    /// diagnostic text receives the assistant's draft.
    pub fn continue_to_analysis(&mut self) -> SessionResult<Step> {
        let language = self.language()?;
        let case = self.case.as_ref().ok_or(SessionError::NoActiveCase)?;
        let step = self.navigator.continue_to_analysis(case)?;

        let case = self.case.as_mut().ok_or(SessionError::NoActiveCase)?;
        if case.diagnostic_text.trim().is_empty() {
            let draft = self.assistant.draft(case, language);
            case.diagnostic_text = draft.text.clone();
            self.draft = Some(draft);
            self.unsaved = true;
        }
        Ok(step)
    }

    /// Replace the diagnostic text.
    pub fn edit_diagnosis(&mut self, text: &str) -> SessionResult<()> {
        self.navigator.expect(Step::AnalysisCase)?;
        self.edit_case(|case| case.diagnostic_text = text.to_string())
    }

    fn persist_case(&mut self, finished: bool) -> SessionResult<ReportRecord> {
        let email = self.active_email()?;
        let case = self.case.as_ref().ok_or(SessionError::NoActiveCase)?;

        let mut repo = ReportRepository::for_owner(&mut self.store, &email);
        let record = if finished {
            repo.save(case)?
        } else {
            repo.save_draft(case)?
        };
        self.case_mut()?.id = Some(record.id);
        self.unsaved = false;
        Ok(record)
    }

    /// Save the open case as a finished report and stay in the editor.
    pub fn save_report(&mut self) -> SessionResult<ReportRecord> {
        self.navigator.expect(Step::AnalysisCase)?;
        self.persist_case(true)
    }

    /// Save the open case as an in-progress report. Allowed while the
    /// patient data is still being entered.
    pub fn save_draft(&mut self) -> SessionResult<ReportRecord> {
        self.expect_authoring()?;
        self.persist_case(false)
    }

    /// Save the open case and return to the dashboard.
    pub fn finish_case(&mut self) -> SessionResult<ReportRecord> {
        let record = self.save_report()?;
        self.navigator.apply(WizardEvent::Finish)?;
        self.close_case();
        Ok(record)
    }

    /// Leave the editor. Unsaved edits require [`Session::confirm_discard`]
    /// or [`Session::stay`].
    pub fn leave_case(&mut self) -> SessionResult<LeaveOutcome> {
        let outcome = self.navigator.leave_case(self.unsaved)?;
        if let LeaveOutcome::Left(_) = outcome {
            self.close_case();
        }
        Ok(outcome)
    }

    /// Drop unsaved edits and return to the dashboard.
    pub fn confirm_discard(&mut self) -> SessionResult<Step> {
        let step = self.navigator.confirm_discard()?;
        self.close_case();
        Ok(step)
    }

    /// Keep editing.
    pub fn stay(&mut self) -> SessionResult<Step> {
        Ok(self.navigator.stay()?)
    }

    // =========================================================================
    // Preferences and export
    // =========================================================================

    pub fn language(&mut self) -> SessionResult<Language> {
        Ok(Preferences::new(&mut self.store).language_or(self.default_language)?)
    }

    pub fn set_language(&mut self, language: Language) -> SessionResult<()> {
        Ok(Preferences::new(&mut self.store).set_language(language)?)
    }

    pub fn toggle_language(&mut self) -> SessionResult<Language> {
        Ok(Preferences::new(&mut self.store).toggle_language(self.default_language)?)
    }

    pub fn set_signature(&mut self, data_url: &str) -> SessionResult<()> {
        let signature = Signature::parse(data_url)?;
        Ok(Preferences::new(&mut self.store).set_signature(&signature)?)
    }

    pub fn clear_signature(&mut self) -> SessionResult<bool> {
        Ok(Preferences::new(&mut self.store).clear_signature()?)
    }

    fn saved_report(&mut self, id: i64) -> SessionResult<ReportRecord> {
        let email = self.active_email()?;
        Ok(ReportRepository::for_owner(&mut self.store, &email)
            .get(id)?
            .ok_or(RepositoryError::NotFound(id))?)
    }

    /// Printable layout for one of the signed-in doctor's reports.
    pub fn printable_report(&mut self, id: i64) -> SessionResult<PrintableReport> {
        let record = self.saved_report(id)?;
        let language = self.language()?;
        let signature = Preferences::new(&mut self.store).signature()?;
        let identity = self.identity.as_ref().ok_or(SessionError::NoActiveUser)?;

        Ok(PrintableReport::from_record(
            &record,
            &identity.profile,
            &identity.clinic,
            signature.as_ref(),
            language,
        ))
    }

    /// Clipboard summary for one of the signed-in doctor's reports.
    pub fn report_summary(&mut self, id: i64) -> SessionResult<String> {
        let record = self.saved_report(id)?;
        let language = self.language()?;
        Ok(summary_text(&record, language))
    }
}

impl<S: KeyValueStore> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("step", &self.navigator.step())
            .field("identity", &self.identity.as_ref().map(|i| i.email.as_str()))
            .field("case_id", &self.case.as_ref().and_then(|c| c.id))
            .field("unsaved", &self.unsaved)
            .finish()
    }
}
