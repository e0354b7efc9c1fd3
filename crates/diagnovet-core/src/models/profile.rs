//! Veterinarian identity models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::{
    is_valid_email, normalize_email, require_fields, ValidationError, ValidationResult,
};

/// Minimum phone length is exclusive: the phone must be longer than this.
pub const MIN_PHONE_LEN: usize = 5;

/// A normalized, validated email address. The identity key of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Email(String);

impl Email {
    /// Normalize (trim, lowercase) and validate a typed email.
    pub fn parse(raw: &str) -> ValidationResult<Self> {
        let normalized = normalize_email(raw);
        if !is_valid_email(&normalized) {
            return Err(ValidationError::InvalidEmail(raw.trim().to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Doctor profile, stored under `profile_<email>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// Normalized email (identity key)
    pub email: String,
    /// Display name, e.g. "Dr. Nicolás Alborno"
    pub full_name: String,
    /// Professional title or specialty
    pub title: String,
    /// Contact phone
    pub phone: String,
    /// Registration number, e.g. "MP 12345"
    pub license: String,
}

impl UserProfile {
    /// A blank profile carrying only the email.
    pub fn blank(email: &Email) -> Self {
        Self {
            email: email.to_string(),
            ..Self::default()
        }
    }

    /// Validate the profile form: name and title required, phone longer
    /// than [`MIN_PHONE_LEN`].
    pub fn validate(&self) -> ValidationResult<()> {
        require_fields(&[
            ("fullName", self.full_name.as_str()),
            ("title", self.title.as_str()),
            ("phone", self.phone.as_str()),
        ])?;
        if self.phone.trim().chars().count() <= MIN_PHONE_LEN {
            return Err(ValidationError::PhoneTooShort { min: MIN_PHONE_LEN });
        }
        Ok(())
    }

    /// Whether this profile belongs to `email`.
    pub fn belongs_to(&self, email: &Email) -> bool {
        normalize_email(&self.email) == email.as_str()
    }
}

/// Clinic details, stored under `clinic_<email>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicRecord {
    pub clinic_name: String,
    pub address: String,
    pub phone: String,
}

impl ClinicRecord {
    /// Validate the clinic form: every field required.
    pub fn validate(&self) -> ValidationResult<()> {
        require_fields(&[
            ("clinicName", self.clinic_name.as_str()),
            ("address", self.address.as_str()),
            ("phone", self.phone.as_str()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> UserProfile {
        UserProfile {
            email: "vet@clinic.com".into(),
            full_name: "Fernanda Barbero".into(),
            title: "Veterinarian".into(),
            phone: "+54 11 5555 0000".into(),
            license: String::new(),
        }
    }

    #[test]
    fn test_email_parse_normalizes() {
        let email = Email::parse("  Vet@Clinic.COM ").unwrap();
        assert_eq!(email.as_str(), "vet@clinic.com");
    }

    #[test]
    fn test_email_parse_rejects() {
        let err = Email::parse(" not-an-email ").unwrap_err();
        assert_eq!(err, ValidationError::InvalidEmail("not-an-email".into()));
    }

    #[test]
    fn test_blank_profile() {
        let email = Email::parse("new@vet.com").unwrap();
        let profile = UserProfile::blank(&email);
        assert_eq!(profile.email, "new@vet.com");
        assert!(profile.full_name.is_empty());
        assert!(profile.belongs_to(&email));
    }

    #[test]
    fn test_profile_validation() {
        assert!(complete_profile().validate().is_ok());

        let mut profile = complete_profile();
        profile.title = " ".into();
        assert_eq!(
            profile.validate().unwrap_err(),
            ValidationError::MissingFields(vec!["title"])
        );

        let mut profile = complete_profile();
        profile.phone = "12345".into();
        assert_eq!(
            profile.validate().unwrap_err(),
            ValidationError::PhoneTooShort { min: 5 }
        );
    }

    #[test]
    fn test_clinic_validation() {
        let clinic = ClinicRecord {
            clinic_name: "Vet Sur".into(),
            address: String::new(),
            phone: "4444-4444".into(),
        };
        assert_eq!(
            clinic.validate().unwrap_err(),
            ValidationError::MissingFields(vec!["address"])
        );
    }

    #[test]
    fn test_profile_json_is_camel_case() {
        let json = serde_json::to_string(&complete_profile()).unwrap();
        assert!(json.contains("\"fullName\":\"Fernanda Barbero\""));

        // Older records may lack fields entirely
        let parsed: UserProfile = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
        assert_eq!(parsed.email, "a@b.co");
        assert!(parsed.license.is_empty());
    }
}
