use crate::{ShiftEntry, ShiftTemplate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Templates plus entries, the unit written to roster files and pulled from
/// the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub templates: Vec<ShiftTemplate>,
    pub entries: Vec<ShiftEntry>,
}

impl RosterSnapshot {
    pub fn new(templates: Vec<ShiftTemplate>, entries: Vec<ShiftEntry>) -> Self {
        Self { templates, entries }
    }

    pub fn validate(&self) -> PersistenceResult<()> {
        validate_templates(&self.templates)?;
        validate_entries(&self.entries)
    }
}

pub fn validate_templates(templates: &[ShiftTemplate]) -> PersistenceResult<()> {
    let mut ids = HashSet::with_capacity(templates.len());
    for template in templates {
        if template.id.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "template '{}' has an empty id",
                template.name
            )));
        }
        if !ids.insert(template.id.as_str()) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate template id {}",
                template.id
            )));
        }
    }
    Ok(())
}

pub fn validate_entries(entries: &[ShiftEntry]) -> PersistenceResult<()> {
    let mut ids = HashSet::with_capacity(entries.len());
    let mut dates = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !ids.insert(entry.id.as_str()) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate entry id {}",
                entry.id
            )));
        }
        if !dates.insert(entry.date) {
            return Err(PersistenceError::InvalidData(format!(
                "more than one entry on {}",
                entry.date
            )));
        }
    }
    Ok(())
}

/// Namespaced JSON key-value storage, local or remote.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> PersistenceResult<Option<Value>>;
    fn put(&self, namespace: &str, key: &str, value: &Value) -> PersistenceResult<()>;
    /// Returns whether a value was present.
    fn delete(&self, namespace: &str, key: &str) -> PersistenceResult<bool>;
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    values: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, namespace: &str, key: &str) -> PersistenceResult<Option<Value>> {
        let values = self.values.read();
        Ok(values
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &Value) -> PersistenceResult<()> {
        self.values
            .write()
            .insert((namespace.to_string(), key.to_string()), value.clone());
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> PersistenceResult<bool> {
        Ok(self
            .values
            .write()
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod sync;

pub use file::{
    JsonDirKvStore, load_entries_from_csv, load_roster_from_json, save_entries_to_csv,
    save_roster_to_json,
};
pub use sync::RosterPersistence;
