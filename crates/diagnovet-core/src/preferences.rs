//! Per-browser preferences: interface language and doctor signature.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::store::{KeyValueStore, StoreResult, APP_LANGUAGE, DOCTOR_SIGNATURE, LEGACY_LANGUAGE};
use crate::validation::{ValidationError, ValidationResult};

/// Interface language.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }

    /// Locale tag handed to the dictation engine.
    pub fn locale_tag(&self) -> &'static str {
        match self {
            Language::Es => "es-ES",
            Language::En => "en-US",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::Es => Language::En,
            Language::En => Language::Es,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Language::Es),
            "en" => Ok(Language::En),
            other => Err(format!("Unknown language: {}", other)),
        }
    }
}

/// A doctor signature image as a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(String);

impl Signature {
    pub fn parse(data_url: &str) -> ValidationResult<Self> {
        let data_url = data_url.trim();
        if !data_url.starts_with("data:image/") || !data_url.contains(',') {
            return Err(ValidationError::InvalidSignature);
        }
        Ok(Self(data_url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reads and writes preferences. Values are stored as raw strings.
pub struct Preferences<'a, S: KeyValueStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore + ?Sized> Preferences<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Stored language, then the legacy key, then `default`.
    pub fn language_or(&self, default: Language) -> StoreResult<Language> {
        for key in [APP_LANGUAGE, LEGACY_LANGUAGE] {
            if let Some(raw) = self.store.get(key)? {
                if let Ok(language) = raw.parse::<Language>() {
                    return Ok(language);
                }
            }
        }
        Ok(default)
    }

    pub fn language(&self) -> StoreResult<Language> {
        self.language_or(Language::default())
    }

    pub fn set_language(&mut self, language: Language) -> StoreResult<()> {
        debug!(language = %language, "Setting interface language");
        self.store.set(APP_LANGUAGE, language.code())
    }

    /// Flip between es and en, returning the new language.
    pub fn toggle_language(&mut self, default: Language) -> StoreResult<Language> {
        let next = self.language_or(default)?.toggled();
        self.set_language(next)?;
        Ok(next)
    }

    pub fn signature(&self) -> StoreResult<Option<Signature>> {
        Ok(self
            .store
            .get(DOCTOR_SIGNATURE)?
            .and_then(|raw| Signature::parse(&raw).ok()))
    }

    pub fn set_signature(&mut self, signature: &Signature) -> StoreResult<()> {
        self.store.set(DOCTOR_SIGNATURE, signature.as_str())
    }

    pub fn clear_signature(&mut self) -> StoreResult<bool> {
        self.store.remove(DOCTOR_SIGNATURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_language_defaults_to_spanish() {
        let mut store = MemoryStore::new();
        assert_eq!(Preferences::new(&mut store).language().unwrap(), Language::Es);
    }

    #[test]
    fn test_legacy_language_key() {
        let mut store = MemoryStore::with_entries([(LEGACY_LANGUAGE, "en")]);
        assert_eq!(Preferences::new(&mut store).language().unwrap(), Language::En);
    }

    #[test]
    fn test_app_language_wins_over_legacy() {
        let mut store = MemoryStore::with_entries([(LEGACY_LANGUAGE, "en"), (APP_LANGUAGE, "es")]);
        assert_eq!(Preferences::new(&mut store).language().unwrap(), Language::Es);
    }

    #[test]
    fn test_unknown_language_falls_through() {
        let mut store = MemoryStore::with_entries([(APP_LANGUAGE, "fr")]);
        assert_eq!(
            Preferences::new(&mut store).language_or(Language::En).unwrap(),
            Language::En
        );
    }

    #[test]
    fn test_toggle_persists() {
        let mut store = MemoryStore::new();
        let mut prefs = Preferences::new(&mut store);
        assert_eq!(prefs.toggle_language(Language::Es).unwrap(), Language::En);
        assert_eq!(prefs.toggle_language(Language::Es).unwrap(), Language::Es);
        assert_eq!(store.get(APP_LANGUAGE).unwrap(), Some("es".into()));
    }

    #[test]
    fn test_signature() {
        assert_eq!(
            Signature::parse("https://example.com/sig.png").unwrap_err(),
            ValidationError::InvalidSignature
        );

        let mut store = MemoryStore::new();
        let mut prefs = Preferences::new(&mut store);
        let signature = Signature::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();

        prefs.set_signature(&signature).unwrap();
        assert_eq!(prefs.signature().unwrap(), Some(signature));
        assert!(prefs.clear_signature().unwrap());
        assert!(prefs.signature().unwrap().is_none());
    }

    #[test]
    fn test_locale_tags() {
        assert_eq!(Language::Es.locale_tag(), "es-ES");
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
    }
}
