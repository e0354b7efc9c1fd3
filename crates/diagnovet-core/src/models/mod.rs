//! Domain models for the report authoring wizard.

mod case;
mod profile;
mod report;

pub use case::*;
pub use profile::*;
pub use report::*;
