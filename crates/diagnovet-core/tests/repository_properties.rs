//! Property tests for tenant isolation and report list integrity.

use diagnovet_core::store::{JsonStoreExt, REPORTS};
use diagnovet_core::{
    ClinicRecord, Email, IdentityResolver, MemoryStore, PatientCase, ReportRecord,
    ReportRepository, UserProfile,
};
use proptest::prelude::*;

fn email_strategy() -> impl Strategy<Value = Email> {
    "[a-z]{1,8}@[a-z]{1,6}\\.(com|org|vet)".prop_map(|raw| Email::parse(&raw).unwrap())
}

fn case_named(name: &str) -> PatientCase {
    PatientCase {
        animal_name: name.to_string(),
        ..PatientCase::default()
    }
}

fn all_reports(store: &MemoryStore) -> Vec<ReportRecord> {
    store.get_json(REPORTS).unwrap().unwrap_or_default()
}

proptest! {
    #[test]
    fn prop_list_only_returns_own_records(
        owners in prop::collection::vec(email_strategy(), 1..4),
        saves in prop::collection::vec((0usize..4, "[A-Za-z]{1,10}"), 0..20),
    ) {
        let mut store = MemoryStore::new();
        for (owner, name) in &saves {
            let owner = &owners[owner % owners.len()];
            ReportRepository::for_owner(&mut store, owner).save(&case_named(name)).unwrap();
        }

        for owner in &owners {
            let listed = ReportRepository::for_owner(&mut store, owner).list().unwrap();
            prop_assert!(listed.iter().all(|r| r.creator_email == owner.as_str()));
        }
    }

    #[test]
    fn prop_new_saves_get_unused_ids(count in 1usize..30) {
        let owner = Email::parse("vet@clinic.com").unwrap();
        let mut store = MemoryStore::new();
        let mut repo = ReportRepository::for_owner(&mut store, &owner);

        let mut seen = std::collections::HashSet::new();
        for i in 0..count {
            let record = repo.save(&case_named(&format!("patient{}", i))).unwrap();
            prop_assert!(seen.insert(record.id), "duplicate id {}", record.id);
        }
        prop_assert_eq!(all_reports(&store).len(), count);
    }

    #[test]
    fn prop_resave_replaces_in_place(count in 1usize..10, pick in 0usize..10) {
        let owner = Email::parse("vet@clinic.com").unwrap();
        let mut store = MemoryStore::new();
        let mut repo = ReportRepository::for_owner(&mut store, &owner);

        let ids: Vec<i64> = (0..count)
            .map(|i| repo.save(&case_named(&format!("p{}", i))).unwrap().id)
            .collect();
        let target = ids[pick % count];

        let mut case = PatientCase::from_record(&repo.get(target).unwrap().unwrap());
        case.diagnostic_text = "revisado".into();
        repo.save(&case).unwrap();

        let reports = all_reports(&store);
        prop_assert_eq!(reports.len(), count);
        prop_assert_eq!(reports.iter().filter(|r| r.id == target).count(), 1);
    }

    #[test]
    fn prop_delete_removes_exactly_one(count in 0usize..10, pick in 0usize..10) {
        let owner = Email::parse("vet@clinic.com").unwrap();
        let mut store = MemoryStore::new();
        let mut repo = ReportRepository::for_owner(&mut store, &owner);

        let ids: Vec<i64> = (0..count)
            .map(|i| repo.save(&case_named(&format!("p{}", i))).unwrap().id)
            .collect();

        prop_assert!(!repo.delete(-1).unwrap());
        prop_assert_eq!(repo.list().unwrap().len(), count);

        if count > 0 {
            let target = ids[pick % count];
            prop_assert!(repo.delete(target).unwrap());
            let remaining = repo.list().unwrap();
            prop_assert_eq!(remaining.len(), count - 1);
            prop_assert!(remaining.iter().all(|r| r.id != target));
            prop_assert!(!repo.delete(target).unwrap());
        }
    }

    #[test]
    fn prop_profiles_are_isolated(e1 in email_strategy(), e2 in email_strategy()) {
        prop_assume!(e1 != e2);
        let mut store = MemoryStore::new();
        let mut resolver = IdentityResolver::new(&mut store);

        let profile = UserProfile {
            full_name: "Dr. Uno".into(),
            title: "Vet".into(),
            phone: "11 1111 1111".into(),
            ..UserProfile::blank(&e1)
        };
        let clinic = ClinicRecord {
            clinic_name: "Clínica Uno".into(),
            address: "Calle 1".into(),
            phone: "4444-4444".into(),
        };
        resolver.register(&e1, &profile, &clinic).unwrap();

        prop_assert!(resolver.resolve(&e1).unwrap().is_existing());
        let (other_profile, other_clinic) = resolver.resolve(&e2).unwrap().into_parts();
        prop_assert_eq!(other_profile, UserProfile::blank(&e2));
        prop_assert_eq!(other_clinic, ClinicRecord::default());
    }
}
