//! Persisted report records.

use serde::{Deserialize, Serialize};

use super::case::{ImageRef, PatientCase};

/// Current on-disk schema version of [`ReportRecord`].
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Report lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    /// Saved as a draft, still being written
    InProgress,
    /// Saved from the report editor
    Finished,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::InProgress => "in-progress",
            ReportStatus::Finished => "finished",
        }
    }
}

/// A saved report, one entry of the global `reports` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    /// Records written before versioning carry no version and count as 1
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    /// Millisecond timestamp of the first save; stable for the record's lifetime
    pub id: i64,
    pub patient: String,
    #[serde(default)]
    pub tutor: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub weight: String,
    /// Study type shown as the report title
    #[serde(default)]
    pub study: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub diagnostic_text: String,
    #[serde(default)]
    pub observations: String,
    /// Owner email (normalized)
    pub creator_email: String,
    /// RFC 3339 timestamp of the last save
    pub date: String,
    pub status: ReportStatus,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

fn legacy_schema_version() -> u32 {
    1
}

impl ReportRecord {
    /// Build a record from a case. Images are denormalized into the record.
    pub fn from_case(
        case: &PatientCase,
        id: i64,
        creator_email: &str,
        status: ReportStatus,
        date: String,
    ) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            id,
            patient: case.animal_name.clone(),
            tutor: case.tutor_name.clone(),
            species: case.species.clone(),
            gender: case.gender.clone(),
            age: case.age.clone(),
            weight: case.weight.clone(),
            study: case.study_type.clone(),
            reason: case.reason.clone(),
            diagnostic_text: case.diagnostic_text.clone(),
            observations: case.observations.clone(),
            creator_email: creator_email.to_string(),
            date,
            status,
            images: case.images.clone(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == ReportStatus::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_case_denormalizes_images() {
        let case = PatientCase {
            animal_name: "Rocky".into(),
            tutor_name: "Juan".into(),
            study_type: "Ecografía abdominal".into(),
            images: vec![ImageRef::from_uri("a.png")],
            ..PatientCase::default()
        };

        let record = ReportRecord::from_case(
            &case,
            42,
            "vet@clinic.com",
            ReportStatus::Finished,
            "2026-10-18T10:00:00+00:00".into(),
        );

        assert_eq!(record.id, 42);
        assert_eq!(record.patient, "Rocky");
        assert_eq!(record.study, "Ecografía abdominal");
        assert_eq!(record.images.len(), 1);
        assert_eq!(record.schema_version, REPORT_SCHEMA_VERSION);
        assert!(record.is_finished());

        let reopened = PatientCase::from_record(&record);
        assert_eq!(reopened.id, Some(42));
        assert_eq!(reopened.tutor_name, "Juan");
        assert_eq!(reopened.images, case.images);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ReportStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(ReportStatus::Finished.as_str(), "finished");
    }

    #[test]
    fn test_unversioned_record_parses_as_v1() {
        let json = r#"{
            "id": 42,
            "patient": "Rocky",
            "creatorEmail": "vet@clinic.com",
            "date": "2026-01-01T00:00:00Z",
            "status": "finished"
        }"#;

        let record: ReportRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.schema_version, 1);
        assert!(record.images.is_empty());
    }
}
