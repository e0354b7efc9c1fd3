//! Patient case models (the in-progress, unsaved side of a report).

use serde::{Deserialize, Serialize};

use super::report::ReportRecord;
use crate::validation::{missing_fields, ValidationError, ValidationResult};

/// An image attached to a case.
///
/// `uri` is an opaque handle (object URL or data URL) owned by the UI shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Local UUID
    pub id: String,
    /// Original file name
    pub file_name: String,
    /// MIME type (e.g., "image/png")
    pub media_type: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Handle the shell resolves to image content
    pub uri: String,
}

impl ImageRef {
    /// Create an image reference with a fresh id.
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        size_bytes: u64,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            media_type: media_type.into(),
            size_bytes,
            uri: uri.into(),
        }
    }

    /// Wrap a bare URI, inferring the media type from its extension.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let file_name = uri.rsplit('/').next().unwrap_or(&uri).to_string();
        let media_type = media_type_for(&file_name);
        Self::new(file_name, media_type, 0, uri)
    }
}

fn media_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// A case being authored in the wizard.
///
/// `id` stays `None` until the first save assigns one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientCase {
    pub id: Option<i64>,
    pub animal_name: String,
    pub tutor_name: String,
    pub species: String,
    pub gender: String,
    pub age: String,
    pub weight: String,
    /// Reason for consultation (typed or dictated)
    pub reason: String,
    pub study_type: String,
    pub diagnostic_text: String,
    pub observations: String,
    pub images: Vec<ImageRef>,
}

impl PatientCase {
    /// Start an empty case.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-open a saved report for editing.
    pub fn from_record(record: &ReportRecord) -> Self {
        Self {
            id: Some(record.id),
            animal_name: record.patient.clone(),
            tutor_name: record.tutor.clone(),
            species: record.species.clone(),
            gender: record.gender.clone(),
            age: record.age.clone(),
            weight: record.weight.clone(),
            reason: record.reason.clone(),
            study_type: record.study.clone(),
            diagnostic_text: record.diagnostic_text.clone(),
            observations: record.observations.clone(),
            images: record.images.clone(),
        }
    }

    /// Required fields that are still missing before analysis can start.
    pub fn missing_for_analysis(&self) -> Vec<&'static str> {
        let mut missing = missing_fields(&[
            ("animalName", self.animal_name.as_str()),
            ("species", self.species.as_str()),
            ("gender", self.gender.as_str()),
            ("tutorName", self.tutor_name.as_str()),
        ]);
        if self.images.is_empty() {
            missing.push("images");
        }
        missing
    }

    /// Check the analysis guard: patient name, species, gender, tutor name
    /// and at least one image.
    pub fn check_ready_for_analysis(&self) -> ValidationResult<()> {
        let missing = self.missing_for_analysis();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }

    /// Append a dictated transcript segment to the consultation reason.
    pub fn append_dictation(&mut self, segment: &str) {
        let segment = segment.trim();
        if segment.is_empty() {
            return;
        }
        if !self.reason.is_empty() && !self.reason.ends_with(' ') {
            self.reason.push(' ');
        }
        self.reason.push_str(segment);
    }

    /// Remove the image at `index`, returning it.
    pub fn remove_image(&mut self, index: usize) -> Option<ImageRef> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }
}
