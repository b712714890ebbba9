use crate::entry::{ExtraHours, ShiftEntry};
use crate::error::{Result, RosterError};
use crate::resolver::{self, ResolvedInterval};
use crate::template::TemplateLookup;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_REST_MINUTES: i64 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestSide {
    Previous,
    Next,
}

impl RestSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestSide::Previous => "previous",
            RestSide::Next => "next",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestConflictKind {
    /// The neighbor ends (or starts) less than the minimum rest away.
    ShortRest,
    /// The neighbor's interval actually overlaps the candidate's.
    Overlap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestConflict {
    pub gap_minutes: i64,
    pub side: RestSide,
    pub kind: RestConflictKind,
    pub neighbor: ShiftEntry,
}

impl RestConflict {
    pub fn gap_label(&self) -> String {
        let gap = self.gap_minutes.abs();
        format!("{}h {}m", gap / 60, gap % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestPeriodGuard {
    min_rest_minutes: i64,
}

impl Default for RestPeriodGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REST_MINUTES)
    }
}

impl RestPeriodGuard {
    pub fn new(min_rest_minutes: i64) -> Self {
        Self { min_rest_minutes }
    }

    pub fn min_rest_minutes(&self) -> i64 {
        self.min_rest_minutes
    }

    /// Checks the candidate against the entries on the day before and the day
    /// after. The previous side wins when both are violated.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::DanglingTemplate`] if `template_id` is not in
    /// `templates` and [`RosterError::OutOfRange`] if the candidate cannot be
    /// resolved. Neighbors with either problem are skipped instead.
    pub fn check<'a, L, F>(
        &self,
        date: NaiveDate,
        template_id: &str,
        extra_hours: ExtraHours,
        templates: &L,
        lookup: F,
    ) -> Result<Option<RestConflict>>
    where
        L: TemplateLookup + ?Sized,
        F: Fn(NaiveDate) -> Option<&'a ShiftEntry>,
    {
        let template = templates
            .template(template_id)
            .ok_or_else(|| RosterError::DanglingTemplate(template_id.to_string()))?;
        if template.is_leave() {
            return Ok(None);
        }

        let candidate = resolver::resolve(date, template, extra_hours)
            .ok_or(RosterError::OutOfRange(date))?;

        if let Some(prev_date) = date.checked_sub_signed(Duration::days(1)) {
            if let Some((neighbor, interval)) = Self::timed_neighbor(lookup(prev_date), templates) {
                let gap = interval.gap_until(&candidate);
                if let Some(conflict) = self.classify(gap, RestSide::Previous, neighbor) {
                    return Ok(Some(conflict));
                }
            }
        }

        if let Some(next_date) = date.checked_add_signed(Duration::days(1)) {
            if let Some((neighbor, interval)) = Self::timed_neighbor(lookup(next_date), templates) {
                let gap = candidate.gap_until(&interval);
                if let Some(conflict) = self.classify(gap, RestSide::Next, neighbor) {
                    return Ok(Some(conflict));
                }
            }
        }

        Ok(None)
    }

    fn timed_neighbor<'a, L>(
        entry: Option<&'a ShiftEntry>,
        templates: &L,
    ) -> Option<(&'a ShiftEntry, ResolvedInterval)>
    where
        L: TemplateLookup + ?Sized,
    {
        let entry = entry?;
        let Some(template) = templates.template(&entry.template_id) else {
            tracing::debug!(
                date = %entry.date,
                template_id = %entry.template_id,
                "skipping neighbor with dangling template"
            );
            return None;
        };
        if template.is_leave() {
            return None;
        }
        let Some(interval) = resolver::resolve(entry.date, template, entry.extra_hours) else {
            tracing::debug!(date = %entry.date, "skipping neighbor outside the date range");
            return None;
        };
        Some((entry, interval))
    }

    fn classify(&self, gap: i64, side: RestSide, neighbor: &ShiftEntry) -> Option<RestConflict> {
        let kind = if gap < 0 {
            RestConflictKind::Overlap
        } else if gap < self.min_rest_minutes {
            RestConflictKind::ShortRest
        } else {
            return None;
        };
        Some(RestConflict {
            gap_minutes: gap,
            side,
            kind,
            neighbor: neighbor.clone(),
        })
    }
}
