//! Input validation for wizard forms and image ingestion.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ImageRef;

/// Validation errors. All are recoverable by correcting the input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Phone number must be longer than {min} characters")]
    PhoneTooShort { min: usize },

    #[error("File type not allowed: {file_name} ({media_type})")]
    UnsupportedMediaType { file_name: String, media_type: String },

    #[error("{file_name} exceeds the maximum size of {max_mb} MB")]
    FileTooLarge { file_name: String, max_mb: u64 },

    #[error("Signature must be an image data URL")]
    InvalidSignature,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Trim and lowercase an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Check the basic `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Names of the fields whose value is blank, in the order given.
pub fn missing_fields(fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}

/// Fail with [`ValidationError::MissingFields`] if any field is blank.
pub fn require_fields(fields: &[(&'static str, &str)]) -> ValidationResult<()> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

/// Which image files may be attached to a case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImagePolicy {
    /// Accepted MIME types
    pub allowed_media_types: Vec<String>,
    /// Per-file size limit in megabytes
    pub max_file_mb: u64,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            allowed_media_types: vec![
                "image/png".into(),
                "image/jpeg".into(),
                "application/pdf".into(),
            ],
            max_file_mb: 20,
        }
    }
}

impl ImagePolicy {
    /// Size limit in bytes, saturating for very large configured limits.
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb.saturating_mul(1024 * 1024)
    }

    /// Check an image against the allowed types and size limit.
    pub fn check(&self, image: &ImageRef) -> ValidationResult<()> {
        if !self
            .allowed_media_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&image.media_type))
        {
            return Err(ValidationError::UnsupportedMediaType {
                file_name: image.file_name.clone(),
                media_type: image.media_type.clone(),
            });
        }

        if image.size_bytes > self.max_file_bytes() {
            return Err(ValidationError::FileTooLarge {
                file_name: image.file_name.clone(),
                max_mb: self.max_file_mb,
            });
        }

        Ok(())
    }
}
