//! Calendar export: iCalendar text and provider deep links.
//!
//! Leave templates become full-day events spanning the entry's date; timed
//! templates use the resolved interval as floating local date-times.

pub mod ics;
pub mod link;

use crate::{ShiftEntry, ShiftTemplate, resolver};
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub use ics::generate_ics;
pub use link::google_calendar_link;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBounds {
    AllDay {
        start: NaiveDate,
        end_exclusive: NaiveDate,
    },
    Timed {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl EventBounds {
    /// `None` when the event would end past the last representable date.
    pub fn for_entry(entry: &ShiftEntry, template: &ShiftTemplate) -> Option<Self> {
        if template.is_leave() {
            let end_exclusive = entry.date.checked_add_signed(Duration::days(1))?;
            Some(EventBounds::AllDay {
                start: entry.date,
                end_exclusive,
            })
        } else {
            let interval = resolver::resolve(entry.date, template, entry.extra_hours)?;
            Some(EventBounds::Timed {
                start: interval.start,
                end: interval.end,
            })
        }
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub(crate) fn format_local(datetime: NaiveDateTime) -> String {
    datetime.format("%Y%m%dT%H%M%S").to_string()
}
