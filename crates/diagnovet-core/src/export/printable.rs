//! Printable report layout data.
//!
//! The UI renders this into an A4 page and hands it to the print dialog.
//! Everything the page shows is resolved here, including labels in the
//! interface language.

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

use crate::models::{ClinicRecord, ReportRecord, UserProfile};
use crate::preferences::{Language, Signature};

/// One labeled patient data row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataRow {
    pub label: String,
    pub value: String,
}

/// Everything the printable page needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrintableReport {
    /// Report id for traceability
    pub report_id: i64,
    /// Doctor display name (header, left)
    pub doctor: String,
    /// Doctor title or specialty
    pub doctor_title: String,
    /// Clinic name (header, right)
    pub clinic: String,
    /// Clinic address
    pub clinic_address: String,
    /// Long-form date of the last save
    pub date: String,
    /// Study type shown as the title
    pub study_title: String,
    /// Patient data grid; blank values are omitted
    pub rows: Vec<DataRow>,
    /// Report body
    pub diagnosis: String,
    /// Additional observations, if any
    pub observations: Option<String>,
    /// Signature data URL, if one is stored
    pub signature: Option<String>,
    /// Image annex URIs
    pub images: Vec<String>,
}

struct Labels {
    patient: &'static str,
    tutor: &'static str,
    species: &'static str,
    gender: &'static str,
    age: &'static str,
    weight: &'static str,
    summary_heading: &'static str,
    summary_patient: &'static str,
    observations: &'static str,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::Es => Labels {
            patient: "Paciente",
            tutor: "Tutor",
            species: "Especie",
            gender: "Género",
            age: "Edad",
            weight: "Peso",
            summary_heading: "DIAGNOVET AI REPORT",
            summary_patient: "PACIENTE",
            observations: "Observaciones",
        },
        Language::En => Labels {
            patient: "Patient",
            tutor: "Owner",
            species: "Species",
            gender: "Sex",
            age: "Age",
            weight: "Weight",
            summary_heading: "DIAGNOVET AI REPORT",
            summary_patient: "PATIENT",
            observations: "Observations",
        },
    }
}

const MONTHS_ES: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Format an RFC 3339 timestamp as a long date; unparsable input is
/// returned unchanged.
pub fn long_date(rfc3339: &str, language: Language) -> String {
    let Ok(date) = DateTime::parse_from_rfc3339(rfc3339) else {
        return rfc3339.to_string();
    };
    let month = date.month0() as usize;
    match language {
        Language::Es => format!("{:02} de {} de {}", date.day(), MONTHS_ES[month], date.year()),
        Language::En => format!("{} {:02}, {}", MONTHS_EN[month], date.day(), date.year()),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl PrintableReport {
    /// Assemble the printable layout for a saved report.
    pub fn from_record(
        record: &ReportRecord,
        profile: &UserProfile,
        clinic: &ClinicRecord,
        signature: Option<&Signature>,
        language: Language,
    ) -> Self {
        let labels = labels(language);
        let rows = [
            (labels.patient, &record.patient),
            (labels.tutor, &record.tutor),
            (labels.species, &record.species),
            (labels.gender, &record.gender),
            (labels.age, &record.age),
            (labels.weight, &record.weight),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            non_blank(value).map(|value| DataRow {
                label: label.to_string(),
                value,
            })
        })
        .collect();

        Self {
            report_id: record.id,
            doctor: profile.full_name.clone(),
            doctor_title: profile.title.clone(),
            clinic: clinic.clinic_name.clone(),
            clinic_address: clinic.address.clone(),
            date: long_date(&record.date, language),
            study_title: record.study.clone(),
            rows,
            diagnosis: record.diagnostic_text.clone(),
            observations: non_blank(&record.observations),
            signature: signature.map(|s| s.as_str().to_string()),
            images: record.images.iter().map(|i| i.uri.clone()).collect(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Plain-text summary for pasting into a clinical history.
pub fn summary_text(record: &ReportRecord, language: Language) -> String {
    let labels = labels(language);
    let mut text = format!(
        "{} - {}: {}\n{}",
        labels.summary_heading,
        labels.summary_patient,
        record.patient.trim(),
        record.diagnostic_text.trim()
    );
    if let Some(observations) = non_blank(&record.observations) {
        text.push_str(&format!("\n{}: {}", labels.observations, observations));
    }
    text
}
