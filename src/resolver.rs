//! Turns a date, a template and the extra-hours flag into concrete local
//! date-times. Everything here is pure: no clock access, no time zones.

use crate::entry::{ExtraHours, ShiftEntry};
use crate::template::{ShiftTemplate, TemplateLookup};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const EXTRA_HOURS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ResolvedInterval {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Minutes from the end of `self` to the start of `later`; negative when they overlap.
    pub fn gap_until(&self, later: &ResolvedInterval) -> i64 {
        (later.start - self.end).num_minutes()
    }
}

/// The end wraps onto the next day when it is earlier than the start, and the
/// extension is applied to the already-wrapped bounds. `None` when the result
/// falls outside the representable date range.
pub fn resolve(
    date: NaiveDate,
    template: &ShiftTemplate,
    extra_hours: ExtraHours,
) -> Option<ResolvedInterval> {
    let mut start = date.and_time(template.start_time);
    let mut end = date.and_time(template.end_time);

    if template.crosses_midnight() {
        end = end.checked_add_signed(Duration::days(1))?;
    }

    match extra_hours {
        ExtraHours::Before => start = start.checked_sub_signed(Duration::hours(EXTRA_HOURS))?,
        ExtraHours::After => end = end.checked_add_signed(Duration::hours(EXTRA_HOURS))?,
        ExtraHours::None => {}
    }

    Some(ResolvedInterval { start, end })
}

/// `None` when the entry's template is no longer in the catalog or the
/// interval cannot be represented.
pub fn resolve_entry<L>(entry: &ShiftEntry, templates: &L) -> Option<ResolvedInterval>
where
    L: TemplateLookup + ?Sized,
{
    let template = templates.template(&entry.template_id)?;
    resolve(entry.date, template, entry.extra_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ShiftCategory;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn equal_bounds_do_not_wrap() {
        let template =
            ShiftTemplate::from_strings("flat", "Flat", ShiftCategory::Custom, "09:00", "09:00")
                .unwrap();
        let interval = resolve(d(2025, 3, 1), &template, ExtraHours::None).unwrap();
        assert_eq!(interval.duration_minutes(), 0);
        assert_eq!(interval.end.date(), d(2025, 3, 1));
    }

    #[test]
    fn before_extension_can_start_on_previous_day() {
        let template =
            ShiftTemplate::from_strings("early", "Early", ShiftCategory::Am, "02:00", "10:00")
                .unwrap();
        let interval = resolve(d(2025, 3, 1), &template, ExtraHours::Before).unwrap();
        assert_eq!(interval.start, d(2025, 2, 28).and_hms_opt(22, 0, 0).unwrap());
    }

    #[test]
    fn range_edges_resolve_to_none() {
        let night =
            ShiftTemplate::from_strings("n", "Night", ShiftCategory::Night, "22:00", "06:00")
                .unwrap();
        let day = ShiftTemplate::from_strings("a", "Day", ShiftCategory::Am, "02:00", "10:00")
            .unwrap();
        assert!(resolve(NaiveDate::MAX, &night, ExtraHours::None).is_none());
        assert!(resolve(NaiveDate::MAX, &day, ExtraHours::None).is_some());
        assert!(resolve(NaiveDate::MIN, &day, ExtraHours::Before).is_none());
    }
}
