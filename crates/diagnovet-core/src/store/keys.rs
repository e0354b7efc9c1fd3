//! Storage key layout.
//!
//! Keys mirror the browser local-storage layout so data written by the web
//! prototype stays readable.

/// Email of the last user who completed login or registration.
pub const LAST_SESSION_EMAIL: &str = "lastSessionEmail";

/// Global JSON array of report records, newest first.
pub const REPORTS: &str = "reports";

/// Doctor signature as an image data URL.
pub const DOCTOR_SIGNATURE: &str = "doctorSignature";

/// Interface language ("es" | "en").
pub const APP_LANGUAGE: &str = "appLanguage";

/// Older language key, read when [`APP_LANGUAGE`] is absent.
pub const LEGACY_LANGUAGE: &str = "lang";

/// Key holding the profile for `email`.
pub fn profile_key(email: &str) -> String {
    format!("profile_{}", email)
}

/// Key holding the clinic record for `email`.
pub fn clinic_key(email: &str) -> String {
    format!("clinic_{}", email)
}

/// Older profile key, read when [`profile_key`] is absent.
pub fn legacy_profile_key(email: &str) -> String {
    format!("userProfile_{}", email)
}

/// Older clinic key, read when [`clinic_key`] is absent.
pub fn legacy_clinic_key(email: &str) -> String {
    format!("clinicData_{}", email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_suffixed_by_email() {
        assert_eq!(profile_key("new@vet.com"), "profile_new@vet.com");
        assert_eq!(clinic_key("new@vet.com"), "clinic_new@vet.com");
        assert_eq!(legacy_profile_key("a@b.co"), "userProfile_a@b.co");
        assert_eq!(legacy_clinic_key("a@b.co"), "clinicData_a@b.co");
    }
}
