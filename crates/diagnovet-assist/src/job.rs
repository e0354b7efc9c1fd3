//! Cancellable diagnosis jobs.

use std::sync::Arc;
use std::time::Duration;

use diagnovet_core::{AppConfig, DiagnosticAssistant, DiagnosticDraft, Language, PatientCase};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

/// Delay before the placeholder draft appears.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(3000);

/// Job errors.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Diagnosis job was cancelled")]
    Cancelled,

    #[error("Diagnosis job failed: {0}")]
    Failed(String),
}

pub type JobResult<T> = Result<T, JobError>;

/// Shared assistant handle a job can run on another thread.
pub type SharedAssistant = Arc<dyn DiagnosticAssistant + Send + Sync>;

/// A diagnosis draft being produced in the background.
///
/// Dropping the job cancels it.
#[derive(Debug)]
pub struct DiagnosisJob {
    handle: Option<JoinHandle<DiagnosticDraft>>,
}

impl DiagnosisJob {
    /// Spawn a job on the current tokio runtime.
    pub fn spawn(
        assistant: SharedAssistant,
        case: PatientCase,
        language: Language,
        delay: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(patient = %case.animal_name, %language, "Drafting diagnosis");
            assistant.draft(&case, language)
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Spawn a job with the delay configured under `[assistant]`.
    pub fn from_config(
        assistant: SharedAssistant,
        case: PatientCase,
        language: Language,
        config: &AppConfig,
    ) -> Self {
        Self::spawn(assistant, case, language, config.assistant.delay())
    }

    /// Cancel the job. Waiting on it afterwards yields [`JobError::Cancelled`].
    pub fn abort(&self) {
        if let Some(handle) = &self.handle {
            debug!("Cancelling diagnosis job");
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the draft.
    pub async fn wait(mut self) -> JobResult<DiagnosticDraft> {
        let handle = self.handle.take().ok_or(JobError::Cancelled)?;
        match handle.await {
            Ok(draft) => Ok(draft),
            Err(e) if e.is_cancelled() => Err(JobError::Cancelled),
            Err(e) => Err(JobError::Failed(e.to_string())),
        }
    }
}

impl Drop for DiagnosisJob {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
