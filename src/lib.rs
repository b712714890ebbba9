//! # shift-roster
//!
//! One shift per calendar date, picked from reusable templates, with
//! overnight wrap, extra-hours extension and a minimum-rest warning against
//! the neighboring days.
//!
//! - [`resolver`]: `(date, template, extra hours)` to concrete start/end
//! - [`rest_guard`]: short rest / overlap detection against adjacent days
//! - [`store`]: the date-keyed entry map
//! - [`commit`]: save / overwrite / override state machine
//! - [`persistence`]: roster files, key-value stores, remote sync
//! - [`export`]: iCalendar text and calendar deep links

pub mod commit;
pub mod config;
pub mod entry;
pub mod error;
pub mod export;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod resolver;
pub mod rest_guard;
pub mod store;
pub mod template;

pub use commit::{CommitOutcome, CommitProtocol, CommitState, ComposeContext};
pub use config::RosterConfig;
pub use entry::{ExtraHours, ShiftEntry};
pub use error::RosterError;
pub use export::{generate_ics, google_calendar_link};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteKvStore;
pub use persistence::{
    JsonDirKvStore, KeyValueStore, MemoryKvStore, PersistenceError, RosterPersistence,
    RosterSnapshot, load_entries_from_csv, load_roster_from_json, save_entries_to_csv,
    save_roster_to_json,
};
pub use resolver::{ResolvedInterval, resolve, resolve_entry};
pub use rest_guard::{RestConflict, RestConflictKind, RestPeriodGuard, RestSide};
pub use store::{EntryObserver, ShiftEntryStore};
pub use template::{ShiftCategory, ShiftTemplate, TemplateCatalog, TemplateLookup};
