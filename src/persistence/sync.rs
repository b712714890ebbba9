//! Local storage plus remote push/pull over the key-value layout.
//!
//! Local writes are the source of truth for the running process. Remote
//! pushes are best effort: a failure is logged and otherwise ignored. A pull
//! replaces local state wholesale; there is no merge and no versioning.

use super::{KeyValueStore, PersistenceError, PersistenceResult, RosterSnapshot};
use crate::config::{DEFAULT_KV_NAMESPACE, RosterConfig};
use crate::store::EntryObserver;
use crate::{ShiftEntry, ShiftTemplate};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

pub const ENTRIES_KEY: &str = "shiftflow_entries_v1";
pub const TEMPLATES_KEY: &str = "shiftflow_templates_v1";
pub const LAST_SYNC_KEY: &str = "shiftflow_last_sync_v1";
pub const LOCAL_NAMESPACE: &str = "local";

#[derive(Clone)]
pub struct RosterPersistence {
    local: Arc<dyn KeyValueStore>,
    remote: Option<Arc<dyn KeyValueStore>>,
    namespace: String,
}

impl RosterPersistence {
    pub fn new(local: Arc<dyn KeyValueStore>) -> Self {
        Self {
            local,
            remote: None,
            namespace: DEFAULT_KV_NAMESPACE.to_string(),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        self.remote = Some(remote);
        self.namespace = namespace.into();
        self
    }

    pub fn from_config(
        config: &RosterConfig,
        local: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        Self {
            local,
            remote,
            namespace: config.kv_namespace.clone(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn save_entries(&self, entries: &[ShiftEntry]) -> PersistenceResult<()> {
        let value = serde_json::to_value(entries)?;
        self.local.put(LOCAL_NAMESPACE, ENTRIES_KEY, &value)?;
        self.push_value(ENTRIES_KEY, &value);
        Ok(())
    }

    pub fn save_templates(&self, templates: &[ShiftTemplate]) -> PersistenceResult<()> {
        let value = serde_json::to_value(templates)?;
        self.local.put(LOCAL_NAMESPACE, TEMPLATES_KEY, &value)?;
        self.push_value(TEMPLATES_KEY, &value);
        Ok(())
    }

    /// Empty when nothing was stored yet.
    pub fn load_entries(&self) -> PersistenceResult<Vec<ShiftEntry>> {
        match self.local.get(LOCAL_NAMESPACE, ENTRIES_KEY)? {
            Some(value) => decode(ENTRIES_KEY, value),
            None => Ok(Vec::new()),
        }
    }

    pub fn load_templates(&self, defaults: &[ShiftTemplate]) -> PersistenceResult<Vec<ShiftTemplate>> {
        match self.local.get(LOCAL_NAMESPACE, TEMPLATES_KEY)? {
            Some(value) => decode(TEMPLATES_KEY, value),
            None => Ok(defaults.to_vec()),
        }
    }

    pub fn last_synced(&self) -> PersistenceResult<Option<String>> {
        Ok(self
            .local
            .get(LOCAL_NAMESPACE, LAST_SYNC_KEY)?
            .and_then(|value| value.as_str().map(ToOwned::to_owned)))
    }

    /// Sends both collections to the remote store and records `now` as the
    /// last sync time. Without a remote this is a no-op.
    pub fn push(
        &self,
        entries: &[ShiftEntry],
        templates: &[ShiftTemplate],
        now: DateTime<Utc>,
    ) -> PersistenceResult<()> {
        if self.remote.is_none() {
            tracing::debug!("push skipped, no remote configured");
            return Ok(());
        }
        self.push_value(ENTRIES_KEY, &serde_json::to_value(entries)?);
        self.push_value(TEMPLATES_KEY, &serde_json::to_value(templates)?);
        self.record_sync(now)
    }

    /// Fetches the remote snapshot and stores it locally.
    ///
    /// Returns `None` when the remote holds neither entries nor templates. An
    /// empty remote template list falls back to `defaults`. Fetch failures are
    /// treated as missing values.
    pub fn pull(
        &self,
        defaults: &[ShiftTemplate],
        now: DateTime<Utc>,
    ) -> PersistenceResult<Option<RosterSnapshot>> {
        let Some(remote) = &self.remote else {
            return Err(PersistenceError::Transport("no remote configured".into()));
        };

        let remote_entries = fetch(remote.as_ref(), &self.namespace, ENTRIES_KEY);
        let remote_templates = fetch(remote.as_ref(), &self.namespace, TEMPLATES_KEY);

        let entries: Vec<ShiftEntry> = match remote_entries {
            Some(value @ Value::Array(_)) => decode(ENTRIES_KEY, value)?,
            _ => Vec::new(),
        };
        let templates: Vec<ShiftTemplate> = match remote_templates {
            Some(value @ Value::Array(_)) => decode(TEMPLATES_KEY, value)?,
            _ => Vec::new(),
        };

        if entries.is_empty() && templates.is_empty() {
            tracing::info!(namespace = %self.namespace, "remote roster is empty");
            return Ok(None);
        }

        let templates = if templates.is_empty() {
            defaults.to_vec()
        } else {
            templates
        };

        self.local
            .put(LOCAL_NAMESPACE, ENTRIES_KEY, &serde_json::to_value(&entries)?)?;
        self.local
            .put(LOCAL_NAMESPACE, TEMPLATES_KEY, &serde_json::to_value(&templates)?)?;
        self.record_sync(now)?;

        tracing::info!(
            entries = entries.len(),
            templates = templates.len(),
            "pulled remote roster"
        );
        Ok(Some(RosterSnapshot::new(templates, entries)))
    }

    /// Clears local state and pushes an empty roster with default templates.
    pub fn reset_all(&self, defaults: &[ShiftTemplate]) -> PersistenceResult<()> {
        for key in [ENTRIES_KEY, TEMPLATES_KEY, LAST_SYNC_KEY] {
            self.local.delete(LOCAL_NAMESPACE, key)?;
        }
        self.push_value(ENTRIES_KEY, &Value::Array(Vec::new()));
        self.push_value(TEMPLATES_KEY, &serde_json::to_value(defaults)?);
        Ok(())
    }

    fn record_sync(&self, now: DateTime<Utc>) -> PersistenceResult<()> {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.local
            .put(LOCAL_NAMESPACE, LAST_SYNC_KEY, &Value::String(stamp))
    }

    fn push_value(&self, key: &str, value: &Value) {
        let Some(remote) = &self.remote else {
            return;
        };
        if let Err(err) = remote.put(&self.namespace, key, value) {
            tracing::warn!(namespace = %self.namespace, key, error = %err, "remote push failed");
        }
    }
}

impl EntryObserver for RosterPersistence {
    fn entries_changed(&self, entries: &[ShiftEntry]) {
        if let Err(err) = self.save_entries(entries) {
            tracing::warn!(error = %err, "saving entries failed");
        }
    }
}

fn fetch(store: &dyn KeyValueStore, namespace: &str, key: &str) -> Option<Value> {
    match store.get(namespace, key) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(namespace, key, error = %err, "remote fetch failed");
            None
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> PersistenceResult<T> {
    serde_json::from_value(value)
        .map_err(|err| PersistenceError::InvalidData(format!("invalid value for {key}: {err}")))
}
