use crate::entry::ShiftEntry;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Receives the full entry collection after every store mutation.
pub trait EntryObserver {
    fn entries_changed(&self, entries: &[ShiftEntry]);
}

/// Date-keyed entry map. Holding at most one entry per date is a property of
/// the map itself; `upsert` is the only way in.
#[derive(Default)]
pub struct ShiftEntryStore {
    entries: BTreeMap<NaiveDate, ShiftEntry>,
    observer: Option<Box<dyn EntryObserver>>,
}

impl ShiftEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: Box<dyn EntryObserver>) -> Self {
        Self {
            entries: BTreeMap::new(),
            observer: Some(observer),
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn EntryObserver>) {
        self.observer = Some(observer);
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ShiftEntry>,
    {
        let mut store = Self::new();
        store.load(entries);
        store
    }

    /// Replaces whatever sits on the entry's date. Returns the replaced entry.
    pub fn upsert(&mut self, entry: ShiftEntry) -> Option<ShiftEntry> {
        tracing::debug!(date = %entry.date, id = %entry.id, template_id = %entry.template_id, "upsert entry");
        let replaced = self.entries.insert(entry.date, entry);
        self.notify();
        replaced
    }

    pub fn remove(&mut self, id: &str) -> Option<ShiftEntry> {
        let date = self
            .entries
            .values()
            .find(|entry| entry.id == id)
            .map(|entry| entry.date)?;
        self.remove_by_date(date)
    }

    pub fn remove_by_date(&mut self, date: NaiveDate) -> Option<ShiftEntry> {
        let removed = self.entries.remove(&date)?;
        tracing::debug!(date = %removed.date, id = %removed.id, "removed entry");
        self.notify();
        Some(removed)
    }

    /// Swaps the whole collection for a remote snapshot. When a snapshot holds
    /// several entries for one date the last one wins.
    pub fn replace_all<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = ShiftEntry>,
    {
        self.entries.clear();
        self.load(entries);
        self.notify();
    }

    pub fn by_date(&self, date: NaiveDate) -> Option<&ShiftEntry> {
        self.entries.get(&date)
    }

    pub fn by_id(&self, id: &str) -> Option<&ShiftEntry> {
        self.entries.values().find(|entry| entry.id == id)
    }

    /// Entries in date order.
    pub fn all(&self) -> impl Iterator<Item = &ShiftEntry> {
        self.entries.values()
    }

    /// Entries dated `start..=end`. Reversed bounds yield nothing.
    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &ShiftEntry> {
        (start <= end)
            .then(|| self.entries.range(start..=end))
            .into_iter()
            .flatten()
            .map(|(_, entry)| entry)
    }

    pub fn entries_vec(&self) -> Vec<ShiftEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn load<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = ShiftEntry>,
    {
        for entry in entries {
            if let Some(previous) = self.entries.insert(entry.date, entry) {
                tracing::warn!(date = %previous.date, dropped = %previous.id, "duplicate date in snapshot");
            }
        }
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            let snapshot = self.entries_vec();
            observer.entries_changed(&snapshot);
        }
    }
}
