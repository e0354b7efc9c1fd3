//! Key-value storage port.
//!
//! Everything the wizard persists goes through [`KeyValueStore`], the same
//! string-keyed blob interface the browser's local storage offers. Adapters:
//! [`SqliteStore`] for durable storage and [`MemoryStore`] for tests.

mod keys;
mod memory;
mod schema;
mod sqlite;

pub use keys::*;
pub use memory::MemoryStore;
pub use schema::*;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported schema version {found} under key '{key}'")]
    UnsupportedSchema { key: String, found: u32 },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// String-keyed blob storage.
pub trait KeyValueStore {
    /// Read the raw value stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Returns whether a value was present.
    fn remove(&mut self, key: &str) -> StoreResult<bool>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StoreResult<bool> {
        (**self).remove(key)
    }
}

/// JSON helpers available on every store.
pub trait JsonStoreExt: KeyValueStore {
    /// Read and deserialize the JSON value under `key`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` as JSON and store it under `key`.
    fn set_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

impl<S: KeyValueStore + ?Sized> JsonStoreExt for S {}
