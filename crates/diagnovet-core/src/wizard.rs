//! Wizard navigation state machine.
//!
//! ```text
//! login ──existing──────────────────────────────────────► dashboard
//!   │                                                      ▲  │  │
//!   └─new─► preConfirmation ─► postConfirmation ─profile───┘  │  │
//!                                                              │  │
//!             dashboard ─create─► analyze ─guard─► analysisCase  │
//!             dashboard ─edit──────────────────────► analysisCase
//!             analysisCase ─finish / discard─► dashboard
//! ```
//!
//! Leaving `analysisCase` with unsaved edits parks the navigator in a
//! pending confirmation until the user discards or stays.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::models::PatientCase;
use crate::validation::ValidationError;

/// Named wizard steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Login,
    /// Clinic setup
    PreConfirmation,
    /// Doctor profile setup
    PostConfirmation,
    Dashboard,
    /// Patient data and image intake
    Analyze,
    /// Report editor
    AnalysisCase,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Login => "login",
            Step::PreConfirmation => "preConfirmation",
            Step::PostConfirmation => "postConfirmation",
            Step::Dashboard => "dashboard",
            Step::Analyze => "analyze",
            Step::AnalysisCase => "analysisCase",
        };
        f.write_str(name)
    }
}

/// Events that move the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardEvent {
    ExistingUser,
    NewUser,
    ClinicEntered,
    ProfileEntered,
    Back,
    CreateReport,
    EditReport,
    /// Leave the report editor after saving
    Finish,
    /// Leave the report editor dropping edits
    Discard,
    Logout,
}

/// Navigation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    #[error("Cannot apply {event:?} while at {from}")]
    InvalidTransition { from: Step, event: WizardEvent },

    #[error("Expected to be at {expected}, currently at {actual}")]
    UnexpectedStep { expected: Step, actual: Step },

    #[error("Case is not ready for analysis: {0}")]
    NotReady(ValidationError),

    #[error("A discard confirmation is pending")]
    ConfirmationPending,

    #[error("No discard confirmation is pending")]
    NoPendingConfirmation,
}

pub type NavigationResult<T> = Result<T, NavigationError>;

/// Result of asking to leave the report editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Left the editor; now at this step
    Left(Step),
    /// Unsaved edits; waiting for discard or stay
    ConfirmationRequired,
}

/// Finite-state controller for the active step.
#[derive(Debug, Clone)]
pub struct WizardNavigator {
    step: Step,
    pending_discard: bool,
}

impl Default for WizardNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardNavigator {
    /// Start at login.
    pub fn new() -> Self {
        Self {
            step: Step::Login,
            pending_discard: false,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Whether a discard confirmation is waiting for an answer.
    pub fn is_confirmation_pending(&self) -> bool {
        self.pending_discard
    }

    /// Fail unless the wizard is at `expected`.
    pub fn expect(&self, expected: Step) -> NavigationResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(NavigationError::UnexpectedStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Target of `event` from `from`, if the transition exists.
    pub fn target(from: Step, event: WizardEvent) -> Option<Step> {
        use Step::*;
        use WizardEvent::*;

        match (from, event) {
            (Login, ExistingUser) => Some(Dashboard),
            (Login, NewUser) => Some(PreConfirmation),
            (PreConfirmation, ClinicEntered) => Some(PostConfirmation),
            (PreConfirmation, Back) => Some(Login),
            (PostConfirmation, ProfileEntered) => Some(Dashboard),
            (PostConfirmation, Back) => Some(PreConfirmation),
            (Dashboard, CreateReport) => Some(Analyze),
            (Dashboard, EditReport) => Some(AnalysisCase),
            (Dashboard, Logout) => Some(Login),
            (Analyze, Back) => Some(Dashboard),
            (AnalysisCase, Finish) | (AnalysisCase, Discard) => Some(Dashboard),
            _ => None,
        }
    }

    /// Apply an event.
    pub fn apply(&mut self, event: WizardEvent) -> NavigationResult<Step> {
        if self.pending_discard {
            return Err(NavigationError::ConfirmationPending);
        }
        let next = Self::target(self.step, event).ok_or(NavigationError::InvalidTransition {
            from: self.step,
            event,
        })?;
        debug!(from = %self.step, to = %next, ?event, "Wizard transition");
        self.step = next;
        Ok(next)
    }

    /// Move from `analyze` to `analysisCase` if the case passes the guard.
    pub fn continue_to_analysis(&mut self, case: &PatientCase) -> NavigationResult<Step> {
        if self.pending_discard {
            return Err(NavigationError::ConfirmationPending);
        }
        self.expect(Step::Analyze)?;
        case.check_ready_for_analysis()
            .map_err(NavigationError::NotReady)?;
        debug!(from = %self.step, to = %Step::AnalysisCase, "Wizard transition");
        self.step = Step::AnalysisCase;
        Ok(self.step)
    }

    /// Ask to leave the report editor without saving.
    pub fn leave_case(&mut self, has_unsaved_changes: bool) -> NavigationResult<LeaveOutcome> {
        if self.pending_discard {
            return Err(NavigationError::ConfirmationPending);
        }
        self.expect(Step::AnalysisCase)?;
        if has_unsaved_changes {
            self.pending_discard = true;
            return Ok(LeaveOutcome::ConfirmationRequired);
        }
        Ok(LeaveOutcome::Left(self.apply(WizardEvent::Finish)?))
    }

    /// Answer the pending confirmation by discarding edits.
    pub fn confirm_discard(&mut self) -> NavigationResult<Step> {
        if !self.pending_discard {
            return Err(NavigationError::NoPendingConfirmation);
        }
        self.pending_discard = false;
        self.apply(WizardEvent::Discard)
    }

    /// Answer the pending confirmation by staying in the editor.
    pub fn stay(&mut self) -> NavigationResult<Step> {
        if !self.pending_discard {
            return Err(NavigationError::NoPendingConfirmation);
        }
        self.pending_discard = false;
        Ok(self.step)
    }
}
