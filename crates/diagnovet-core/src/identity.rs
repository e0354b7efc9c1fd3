//! Identity resolution: typed email → stored profile and clinic.
//!
//! There is no password or token check. A user "exists" when a profile is
//! stored under their normalized email.

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{ClinicRecord, Email, UserProfile};
use crate::store::{
    clinic_key, legacy_clinic_key, legacy_profile_key, profile_key, JsonStoreExt, KeyValueStore,
    StoreError, LAST_SESSION_EMAIL,
};
use crate::validation::ValidationError;

/// Identity errors.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Outcome of resolving an email.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A profile is stored for this email
    Existing {
        profile: UserProfile,
        clinic: ClinicRecord,
    },
    /// Nobody registered this email; blank records seeded for setup
    New {
        profile: UserProfile,
        clinic: ClinicRecord,
    },
}

impl Resolution {
    pub fn is_existing(&self) -> bool {
        matches!(self, Resolution::Existing { .. })
    }

    pub fn into_parts(self) -> (UserProfile, ClinicRecord) {
        match self {
            Resolution::Existing { profile, clinic } | Resolution::New { profile, clinic } => {
                (profile, clinic)
            }
        }
    }
}

/// Maps emails to stored identities.
pub struct IdentityResolver<'a, S: KeyValueStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore + ?Sized> IdentityResolver<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Resolve an email. Existing users become the last session.
    pub fn resolve(&mut self, email: &Email) -> IdentityResult<Resolution> {
        match self.load_profile(email)? {
            Some(profile) => {
                let clinic = self.load_clinic(email)?.unwrap_or_default();
                self.store.set(LAST_SESSION_EMAIL, email.as_str())?;
                info!(email = %email, "Resolved existing user");
                Ok(Resolution::Existing { profile, clinic })
            }
            None => {
                info!(email = %email, "Resolved new user");
                Ok(Resolution::New {
                    profile: UserProfile::blank(email),
                    clinic: ClinicRecord::default(),
                })
            }
        }
    }

    /// Persist a completed registration and make it the last session.
    pub fn register(
        &mut self,
        email: &Email,
        profile: &UserProfile,
        clinic: &ClinicRecord,
    ) -> IdentityResult<()> {
        clinic.validate()?;
        profile.validate()?;

        let mut profile = profile.clone();
        profile.email = email.to_string();

        self.store.set_json(&profile_key(email.as_str()), &profile)?;
        self.store.set_json(&clinic_key(email.as_str()), clinic)?;
        self.store.set(LAST_SESSION_EMAIL, email.as_str())?;
        info!(email = %email, "Registered profile and clinic");
        Ok(())
    }

    /// Resume the last session, if its profile is still stored.
    pub fn resume(&mut self) -> IdentityResult<Option<(Email, UserProfile, ClinicRecord)>> {
        let Some(raw) = self.store.get(LAST_SESSION_EMAIL)? else {
            return Ok(None);
        };
        let Ok(email) = Email::parse(&raw) else {
            debug!(raw = %raw, "Ignoring malformed last session email");
            return Ok(None);
        };

        match self.resolve(&email)? {
            Resolution::Existing { profile, clinic } => Ok(Some((email, profile, clinic))),
            Resolution::New { .. } => Ok(None),
        }
    }

    /// Forget the last session (logout).
    pub fn forget_session(&mut self) -> IdentityResult<bool> {
        Ok(self.store.remove(LAST_SESSION_EMAIL)?)
    }

    /// Load the profile stored for `email`, falling back to the legacy key.
    ///
    /// A stored profile whose own email differs is ignored.
    pub fn load_profile(&self, email: &Email) -> IdentityResult<Option<UserProfile>> {
        let profile = match self
            .store
            .get_json::<UserProfile>(&profile_key(email.as_str()))?
        {
            Some(profile) => Some(profile),
            None => self
                .store
                .get_json::<UserProfile>(&legacy_profile_key(email.as_str()))?,
        };
        Ok(profile.filter(|p| p.belongs_to(email)))
    }

    /// Load the clinic stored for `email`, falling back to the legacy key.
    pub fn load_clinic(&self, email: &Email) -> IdentityResult<Option<ClinicRecord>> {
        if let Some(clinic) = self.store.get_json(&clinic_key(email.as_str()))? {
            return Ok(Some(clinic));
        }
        Ok(self.store.get_json(&legacy_clinic_key(email.as_str()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn profile_for(email: &Email) -> UserProfile {
        UserProfile {
            email: email.to_string(),
            full_name: "Fernanda Barbero".into(),
            title: "Veterinarian".into(),
            phone: "11 5555 0000".into(),
            license: "MP 12345".into(),
        }
    }

    fn clinic() -> ClinicRecord {
        ClinicRecord {
            clinic_name: "Vet Sur".into(),
            address: "Av. Siempre Viva 742".into(),
            phone: "4444-4444".into(),
        }
    }

    #[test]
    fn test_resolve_new_user_seeds_blank_records() {
        let mut store = MemoryStore::new();
        let mut resolver = IdentityResolver::new(&mut store);

        let resolution = resolver.resolve(&email("new@vet.com")).unwrap();
        assert_eq!(
            resolution,
            Resolution::New {
                profile: UserProfile::blank(&email("new@vet.com")),
                clinic: ClinicRecord::default(),
            }
        );
        assert!(store.get(LAST_SESSION_EMAIL).unwrap().is_none());
    }

    #[test]
    fn test_register_then_resolve_existing() {
        let mut store = MemoryStore::new();
        let e = email("vet@clinic.com");

        IdentityResolver::new(&mut store)
            .register(&e, &profile_for(&e), &clinic())
            .unwrap();
        assert!(store.get("profile_vet@clinic.com").unwrap().is_some());
        assert!(store.get("clinic_vet@clinic.com").unwrap().is_some());

        store.remove(LAST_SESSION_EMAIL).unwrap();
        let resolution = IdentityResolver::new(&mut store)
            .resolve(&email(" VET@clinic.com"))
            .unwrap();
        assert!(resolution.is_existing());
        let (profile, clinic_record) = resolution.into_parts();
        assert_eq!(profile.full_name, "Fernanda Barbero");
        assert_eq!(clinic_record, clinic());
        assert_eq!(
            store.get(LAST_SESSION_EMAIL).unwrap(),
            Some("vet@clinic.com".into())
        );
    }

    #[test]
    fn test_register_rejects_incomplete_forms() {
        let mut store = MemoryStore::new();
        let e = email("vet@clinic.com");
        let mut profile = profile_for(&e);
        profile.full_name.clear();

        let result = IdentityResolver::new(&mut store).register(&e, &profile, &clinic());
        assert!(matches!(result, Err(IdentityError::Validation(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_legacy_keys_are_read() {
        let e = email("old@vet.com");
        let profile_json = serde_json::to_string(&profile_for(&e)).unwrap();
        let clinic_json = serde_json::to_string(&clinic()).unwrap();
        let mut store = MemoryStore::with_entries([
            ("userProfile_old@vet.com", profile_json),
            ("clinicData_old@vet.com", clinic_json),
        ]);

        let resolution = IdentityResolver::new(&mut store).resolve(&e).unwrap();
        assert!(resolution.is_existing());
        assert_eq!(resolution.into_parts().1.clinic_name, "Vet Sur");
    }

    #[test]
    fn test_profile_under_wrong_key_is_ignored() {
        let other = email("other@vet.com");
        let profile_json = serde_json::to_string(&profile_for(&other)).unwrap();
        let mut store = MemoryStore::with_entries([("profile_me@vet.com", profile_json)]);

        let resolution = IdentityResolver::new(&mut store)
            .resolve(&email("me@vet.com"))
            .unwrap();
        assert!(!resolution.is_existing());
    }

    #[test]
    fn test_resume_and_forget() {
        let mut store = MemoryStore::new();
        let e = email("vet@clinic.com");
        let mut resolver = IdentityResolver::new(&mut store);
        resolver.register(&e, &profile_for(&e), &clinic()).unwrap();

        let (resumed, profile, _) = resolver.resume().unwrap().unwrap();
        assert_eq!(resumed, e);
        assert_eq!(profile.license, "MP 12345");

        assert!(resolver.forget_session().unwrap());
        assert!(resolver.resume().unwrap().is_none());
    }

    #[test]
    fn test_resume_without_profile() {
        let mut store = MemoryStore::with_entries([(LAST_SESSION_EMAIL, "ghost@vet.com")]);
        assert!(IdentityResolver::new(&mut store).resume().unwrap().is_none());
    }
}
