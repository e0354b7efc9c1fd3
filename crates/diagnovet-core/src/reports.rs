//! Report repository over the global `reports` list.
//!
//! All records live in one JSON array. A [`ReportRepository`] is scoped to a
//! single owner: it only ever lists, returns, overwrites or deletes records
//! whose `creatorEmail` matches that owner.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Email, PatientCase, ReportRecord, ReportStatus, REPORT_SCHEMA_VERSION};
use crate::store::{JsonStoreExt, KeyValueStore, StoreError, StoreResult, REPORTS};

/// Repository errors.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Report not found: {0}")]
    NotFound(i64),

    #[error("Report {0} belongs to another user")]
    NotOwner(i64),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Load the full report list, validating every record's schema version.
pub fn load_reports<S: KeyValueStore + ?Sized>(store: &S) -> StoreResult<Vec<ReportRecord>> {
    let reports: Vec<ReportRecord> = store.get_json(REPORTS)?.unwrap_or_default();
    if let Some(record) = reports
        .iter()
        .find(|r| r.schema_version > REPORT_SCHEMA_VERSION)
    {
        return Err(StoreError::UnsupportedSchema {
            key: REPORTS.to_string(),
            found: record.schema_version,
        });
    }
    Ok(reports)
}

fn persist_reports<S: KeyValueStore + ?Sized>(
    store: &mut S,
    reports: &[ReportRecord],
) -> StoreResult<()> {
    store.set_json(REPORTS, reports)
}

/// Pick a fresh id from the current millisecond, bumping past any id
/// already present.
fn fresh_id(now_millis: i64, reports: &[ReportRecord]) -> i64 {
    let mut id = now_millis;
    while reports.iter().any(|r| r.id == id) {
        id += 1;
    }
    id
}

/// Owner-scoped report CRUD.
pub struct ReportRepository<'a, S: KeyValueStore + ?Sized> {
    store: &'a mut S,
    owner: Email,
}

impl<'a, S: KeyValueStore + ?Sized> ReportRepository<'a, S> {
    /// Create a repository scoped to `owner`.
    pub fn for_owner(store: &'a mut S, owner: &Email) -> Self {
        Self {
            store,
            owner: owner.clone(),
        }
    }

    fn owns(&self, record: &ReportRecord) -> bool {
        record.creator_email == self.owner.as_str()
    }

    /// The owner's reports, newest first.
    pub fn list(&self) -> RepositoryResult<Vec<ReportRecord>> {
        let reports = load_reports(&*self.store)?;
        Ok(reports.into_iter().filter(|r| self.owns(r)).collect())
    }

    /// Get one of the owner's reports by id.
    pub fn get(&self, id: i64) -> RepositoryResult<Option<ReportRecord>> {
        let reports = load_reports(&*self.store)?;
        Ok(reports.into_iter().find(|r| r.id == id && self.owns(r)))
    }

    /// Save a finished report (upsert by case id).
    pub fn save(&mut self, case: &PatientCase) -> RepositoryResult<ReportRecord> {
        self.upsert(case, ReportStatus::Finished)
    }

    /// Save a report that is still being written.
    pub fn save_draft(&mut self, case: &PatientCase) -> RepositoryResult<ReportRecord> {
        self.upsert(case, ReportStatus::InProgress)
    }

    fn upsert(&mut self, case: &PatientCase, status: ReportStatus) -> RepositoryResult<ReportRecord> {
        let mut reports = load_reports(&*self.store)?;
        let now = Utc::now();
        let date = now.to_rfc3339();

        let existing = case
            .id
            .and_then(|id| reports.iter().position(|r| r.id == id));

        let record = match existing {
            Some(index) => {
                if !self.owns(&reports[index]) {
                    warn!(id = reports[index].id, owner = %self.owner, "Refusing to overwrite another user's report");
                    return Err(RepositoryError::NotOwner(reports[index].id));
                }
                let record =
                    ReportRecord::from_case(case, reports[index].id, self.owner.as_str(), status, date);
                reports[index] = record.clone();
                debug!(id = record.id, "Replaced report in place");
                record
            }
            None => {
                let id = match case.id {
                    Some(id) => id,
                    None => fresh_id(now.timestamp_millis(), &reports),
                };
                let record = ReportRecord::from_case(case, id, self.owner.as_str(), status, date);
                reports.insert(0, record.clone());
                debug!(id = record.id, "Prepended new report");
                record
            }
        };

        persist_reports(&mut *self.store, &reports)?;
        info!(id = record.id, status = record.status.as_str(), owner = %self.owner, "Saved report");
        Ok(record)
    }

    /// Delete one of the owner's reports. Returns false if no record has
    /// that id.
    pub fn delete(&mut self, id: i64) -> RepositoryResult<bool> {
        let mut reports = load_reports(&*self.store)?;
        let Some(index) = reports.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        if !self.owns(&reports[index]) {
            return Err(RepositoryError::NotOwner(id));
        }

        reports.remove(index);
        persist_reports(&mut *self.store, &reports)?;
        info!(id, owner = %self.owner, "Deleted report");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageRef;
    use crate::store::MemoryStore;

    fn owner() -> Email {
        Email::parse("vet@clinic.com").unwrap()
    }

    fn case(name: &str) -> PatientCase {
        PatientCase {
            animal_name: name.into(),
            species: "Canino".into(),
            gender: "Macho".into(),
            tutor_name: "Juan".into(),
            images: vec![ImageRef::from_uri("a.png")],
            ..PatientCase::default()
        }
    }

    #[test]
    fn test_save_new_assigns_id_and_prepends() {
        let mut store = MemoryStore::new();
        let mut repo = ReportRepository::for_owner(&mut store, &owner());

        let first = repo.save(&case("Rocky")).unwrap();
        let second = repo.save(&case("Luna")).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.status, ReportStatus::Finished);
        assert_eq!(first.creator_email, "vet@clinic.com");

        let listed = repo.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].patient, "Luna");
        assert_eq!(listed[1].patient, "Rocky");
    }

    #[test]
    fn test_save_existing_replaces_in_place() {
        let mut store = MemoryStore::new();
        let mut repo = ReportRepository::for_owner(&mut store, &owner());

        let older = repo.save(&case("Rocky")).unwrap();
        repo.save(&case("Luna")).unwrap();

        let mut edited = PatientCase::from_record(&older);
        edited.diagnostic_text = "Sin hallazgos".into();
        let saved = repo.save(&edited).unwrap();

        assert_eq!(saved.id, older.id);
        let listed = repo.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].id, older.id);
        assert_eq!(listed[1].diagnostic_text, "Sin hallazgos");
    }

    #[test]
    fn test_save_draft_status() {
        let mut store = MemoryStore::new();
        let mut repo = ReportRepository::for_owner(&mut store, &owner());

        let draft = repo.save_draft(&case("Rocky")).unwrap();
        assert_eq!(draft.status, ReportStatus::InProgress);

        let finished = repo.save(&PatientCase::from_record(&draft)).unwrap();
        assert!(finished.is_finished());
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn test_fresh_id_skips_taken_ids() {
        let mut store = MemoryStore::new();
        let mut repo = ReportRepository::for_owner(&mut store, &owner());
        let record = repo.save(&case("Rocky")).unwrap();

        let reports = load_reports(&store).unwrap();
        assert_eq!(fresh_id(record.id, &reports), record.id + 1);
        assert_eq!(fresh_id(record.id - 1, &reports), record.id - 1);
    }

    #[test]
    fn test_other_owner_records_are_invisible_and_protected() {
        let mut store = MemoryStore::new();
        let other = Email::parse("other@vet.com").unwrap();
        let foreign = ReportRepository::for_owner(&mut store, &other)
            .save(&case("Michi"))
            .unwrap();

        let mut repo = ReportRepository::for_owner(&mut store, &owner());
        assert!(repo.list().unwrap().is_empty());
        assert!(repo.get(foreign.id).unwrap().is_none());

        let mut hijack = case("Rocky");
        hijack.id = Some(foreign.id);
        assert!(matches!(
            repo.save(&hijack),
            Err(RepositoryError::NotOwner(id)) if id == foreign.id
        ));
        assert!(matches!(
            repo.delete(foreign.id),
            Err(RepositoryError::NotOwner(_))
        ));
        assert_eq!(load_reports(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let mut store = MemoryStore::new();
        let mut repo = ReportRepository::for_owner(&mut store, &owner());
        let record = repo.save(&case("Rocky")).unwrap();

        assert!(!repo.delete(record.id + 1000).unwrap());
        assert!(repo.delete(record.id).unwrap());
        assert!(!repo.delete(record.id).unwrap());
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_future_schema_version_is_rejected() {
        let json = r#"[{"schemaVersion": 9, "id": 1, "patient": "X",
            "creatorEmail": "vet@clinic.com", "date": "2026-01-01T00:00:00Z",
            "status": "finished"}]"#;
        let store = MemoryStore::with_entries([(REPORTS, json)]);

        assert!(matches!(
            load_reports(&store),
            Err(StoreError::UnsupportedSchema { found: 9, .. })
        ));
    }
}
