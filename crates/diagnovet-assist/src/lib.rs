//! Background diagnosis drafting.
//!
//! Wraps a [`diagnovet_core::DiagnosticAssistant`] in a tokio task so the
//! shell can show a progress state and cancel the draft when the user leaves
//! the report editor.

pub mod job;

pub use job::*;
