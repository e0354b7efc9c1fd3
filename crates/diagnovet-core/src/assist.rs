//! Diagnostic assistant seam.
//!
//! The prototype never analyzes images; it shows a fixed draft. The seam
//! stays explicit so a real assistant can replace [`PlaceholderAssistant`].

use serde::{Deserialize, Serialize};

use crate::models::PatientCase;
use crate::preferences::Language;

/// A differential diagnosis entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub label: String,
    /// Percentage, 0–100
    pub probability: u8,
}

/// Draft text offered to the doctor for editing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticDraft {
    pub text: String,
    pub findings: Vec<Finding>,
}

/// Produces a diagnostic draft for a case.
pub trait DiagnosticAssistant {
    fn draft(&self, case: &PatientCase, language: Language) -> DiagnosticDraft;
}

/// Returns canned text regardless of the case.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAssistant;

const PLACEHOLDER_ES: &str = "Signos ecográficos altamente compatibles con cistitis crónica. \
Se observa engrosamiento parietal difuso. Se recomienda urianálisis y cultivo.";

const PLACEHOLDER_EN: &str = "Ultrasound findings highly consistent with chronic cystitis. \
Diffuse wall thickening is observed. Urinalysis and culture are recommended.";

impl DiagnosticAssistant for PlaceholderAssistant {
    fn draft(&self, _case: &PatientCase, language: Language) -> DiagnosticDraft {
        let (text, findings) = match language {
            Language::Es => (
                PLACEHOLDER_ES,
                [("Cistitis Inflamatoria", 85), ("Urolitiasis", 12)],
            ),
            Language::En => (
                PLACEHOLDER_EN,
                [("Inflammatory Cystitis", 85), ("Urolithiasis", 12)],
            ),
        };

        DiagnosticDraft {
            text: text.to_string(),
            findings: findings
                .iter()
                .map(|(label, probability)| Finding {
                    label: label.to_string(),
                    probability: *probability,
                })
                .collect(),
        }
    }
}
