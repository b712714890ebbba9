use crate::error::{Result, RosterError};
use crate::persistence::{PersistenceError, PersistenceResult};
use crate::rest_guard::{DEFAULT_MIN_REST_MINUTES, RestPeriodGuard};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_KV_NAMESPACE: &str = "CAL_KV";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Minimum rest between adjacent-day shifts, in minutes.
    pub min_rest_minutes: i64,
    /// Namespace used on the remote key-value store.
    pub kv_namespace: String,
    /// Directory holding the local key-value files. `None` keeps everything in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub week_starts_on_monday: bool,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            min_rest_minutes: DEFAULT_MIN_REST_MINUTES,
            kv_namespace: DEFAULT_KV_NAMESPACE.to_string(),
            data_dir: None,
            week_starts_on_monday: false,
        }
    }
}

impl RosterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_rest_minutes <= 0 {
            return Err(RosterError::InvalidConfig(format!(
                "min_rest_minutes must be positive (got {})",
                self.min_rest_minutes
            )));
        }
        if self.kv_namespace.trim().is_empty() {
            return Err(RosterError::InvalidConfig(
                "kv_namespace must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn rest_guard(&self) -> RestPeriodGuard {
        RestPeriodGuard::new(self.min_rest_minutes)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: RosterConfig = serde_json::from_str(&raw)?;
        config
            .validate()
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        Ok(config)
    }

    /// Missing files yield the defaults; unreadable or invalid files are still errors.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        if !path.as_ref().exists() {
            tracing::debug!(path = %path.as_ref().display(), "config file missing, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> PersistenceResult<()> {
        let formatted = serde_json::to_string_pretty(self)?;
        fs::write(path, format!("{formatted}\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_fields_take_defaults() {
        let config: RosterConfig = serde_json::from_str(r#"{ "min_rest_minutes": 660 }"#).unwrap();
        assert_eq!(config.min_rest_minutes, 660);
        assert_eq!(config.kv_namespace, DEFAULT_KV_NAMESPACE);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn rejects_non_positive_rest() {
        let config = RosterConfig {
            min_rest_minutes: 0,
            ..RosterConfig::default()
        };
        assert!(matches!(config.validate(), Err(RosterError::InvalidConfig(_))));
    }

    #[test]
    fn load_or_default_handles_missing_file_and_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        assert_eq!(RosterConfig::load_or_default(&path).unwrap(), RosterConfig::default());

        let config = RosterConfig {
            min_rest_minutes: 600,
            kv_namespace: "TEAM_KV".into(),
            data_dir: Some(dir.path().join("data")),
            week_starts_on_monday: true,
        };
        config.save(&path).unwrap();
        assert_eq!(RosterConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        fs::write(&path, r#"{ "kv_namespace": "  " }"#).unwrap();
        assert!(matches!(
            RosterConfig::load(&path),
            Err(PersistenceError::InvalidData(_))
        ));
    }
}
