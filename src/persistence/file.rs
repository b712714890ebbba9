use super::{KeyValueStore, PersistenceError, PersistenceResult, RosterSnapshot};
use crate::{
    entry::{ExtraHours, ShiftEntry},
    error::RosterError,
    resolver,
    template::TemplateLookup,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub fn save_roster_to_json<P: AsRef<Path>>(
    snapshot: &RosterSnapshot,
    path: P,
) -> PersistenceResult<()> {
    snapshot.validate()?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_roster_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<RosterSnapshot> {
    let file = File::open(path)?;
    let snapshot: RosterSnapshot = serde_json::from_reader(file)?;
    snapshot.validate()?;
    Ok(snapshot)
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Default, Serialize, Deserialize)]
struct EntryCsvRecord {
    id: String,
    date: String,
    template_id: String,
    #[serde(default)]
    template_name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
    is_swapped: String,
    swapped_with: String,
    extra_hours: String,
    note: String,
}

impl EntryCsvRecord {
    fn from_entry<L>(entry: &ShiftEntry, templates: &L) -> Self
    where
        L: TemplateLookup + ?Sized,
    {
        let mut record = EntryCsvRecord {
            id: entry.id.clone(),
            date: entry.date.format("%Y-%m-%d").to_string(),
            template_id: entry.template_id.clone(),
            is_swapped: entry.is_swapped.to_string(),
            swapped_with: entry.swapped_with.clone().unwrap_or_default(),
            extra_hours: entry.extra_hours.as_str().to_string(),
            note: entry.note.clone().unwrap_or_default(),
            ..EntryCsvRecord::default()
        };
        if let Some(template) = templates.template(&entry.template_id) {
            record.template_name = template.name.clone();
            record.category = template.category.as_str().to_string();
            if !template.is_leave() {
                if let Some(interval) = resolver::resolve(entry.date, template, entry.extra_hours) {
                    record.start = format_datetime(interval.start);
                    record.end = format_datetime(interval.end);
                }
            }
        }
        record
    }

    fn into_entry(self) -> PersistenceResult<ShiftEntry> {
        if self.id.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "entry on '{}' has an empty id",
                self.date
            )));
        }
        if self.template_id.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "entry {} has an empty template_id",
                self.id
            )));
        }
        let date = parse_date(&self.date)?;
        let is_swapped = parse_bool(&self.is_swapped)?;
        let extra_hours: ExtraHours = self
            .extra_hours
            .parse()
            .map_err(|err: RosterError| PersistenceError::InvalidData(err.to_string()))?;
        Ok(ShiftEntry {
            id: self.id,
            template_id: self.template_id,
            date,
            is_swapped,
            swapped_with: if is_swapped {
                parse_string_option(self.swapped_with)
            } else {
                None
            },
            extra_hours,
            note: parse_string_option(self.note),
        })
    }
}

/// One row per entry; `start`/`end` hold the resolved interval and stay blank
/// for leave days, dangling template references and unrepresentable dates.
pub fn save_entries_to_csv<L, P>(
    entries: &[ShiftEntry],
    templates: &L,
    path: P,
) -> PersistenceResult<()>
where
    L: TemplateLookup + ?Sized,
    P: AsRef<Path>,
{
    super::validate_entries(entries)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for entry in entries {
        writer.serialize(EntryCsvRecord::from_entry(entry, templates))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_entries_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<ShiftEntry>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut entries = Vec::new();
    for record in reader.deserialize::<EntryCsvRecord>() {
        entries.push(record?.into_entry()?);
    }
    super::validate_entries(&entries)?;
    Ok(entries)
}

/// Key-value store keeping one pretty-printed JSON file per key under
/// `<root>/<namespace>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirKvStore {
    root: PathBuf,
}

impl JsonDirKvStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> PersistenceResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, namespace: &str, key: &str) -> PersistenceResult<PathBuf> {
        validate_segment(namespace)?;
        validate_segment(key)?;
        Ok(self.root.join(namespace).join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonDirKvStore {
    fn get(&self, namespace: &str, key: &str) -> PersistenceResult<Option<Value>> {
        let path = self.path_for(namespace, key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn put(&self, namespace: &str, key: &str, value: &Value) -> PersistenceResult<()> {
        let path = self.path_for(namespace, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let formatted = serde_json::to_string_pretty(value)?;
        fs::write(path, format!("{formatted}\n"))?;
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> PersistenceResult<bool> {
        let path = self.path_for(namespace, key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

fn validate_segment(segment: &str) -> PersistenceResult<()> {
    let valid = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidData(format!(
            "invalid key segment '{segment}'"
        )))
    }
}

fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_bool(input: &str) -> PersistenceResult<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "false" => Ok(false),
        "true" => Ok(true),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
