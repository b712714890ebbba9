use crate::error::RosterError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraHours {
    #[default]
    None,
    Before,
    After,
}

impl ExtraHours {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtraHours::None => "none",
            ExtraHours::Before => "before",
            ExtraHours::After => "after",
        }
    }

    pub fn is_extended(&self) -> bool {
        !matches!(self, ExtraHours::None)
    }
}

impl FromStr for ExtraHours {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ExtraHours::None),
            "before" => Ok(ExtraHours::Before),
            "after" => Ok(ExtraHours::After),
            _ => Err(RosterError::InvalidExtraHours(value.to_string())),
        }
    }
}

/// One calendar assignment. The date is the key; `id` changes on every replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEntry {
    pub id: String,
    pub template_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_swapped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swapped_with: Option<String>,
    #[serde(default)]
    pub extra_hours: ExtraHours,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ShiftEntry {
    pub fn new(template_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Self::fresh_id(),
            template_id: template_id.into(),
            date,
            is_swapped: false,
            swapped_with: None,
            extra_hours: ExtraHours::None,
            note: None,
        }
    }

    pub fn fresh_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn with_extra_hours(mut self, extra_hours: ExtraHours) -> Self {
        self.extra_hours = extra_hours;
        self
    }

    /// `partner` is dropped unless the entry is marked swapped.
    pub fn with_swap(mut self, is_swapped: bool, partner: Option<String>) -> Self {
        self.is_swapped = is_swapped;
        self.swapped_with = if is_swapped { partner } else { None };
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Compares everything a user chooses for a date, ignoring identity.
    pub fn same_payload(&self, other: &ShiftEntry) -> bool {
        self.template_id == other.template_id
            && self.is_swapped == other.is_swapped
            && self.swapped_with == other.swapped_with
            && self.extra_hours == other.extra_hours
            && self.note == other.note
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_hours_parse_ignores_case_and_padding() {
        assert_eq!(" After ".parse::<ExtraHours>(), Ok(ExtraHours::After));
        assert_eq!("BEFORE".parse::<ExtraHours>(), Ok(ExtraHours::Before));
        assert_eq!("none".parse::<ExtraHours>(), Ok(ExtraHours::None));
        assert_eq!(
            "sideways".parse::<ExtraHours>(),
            Err(RosterError::InvalidExtraHours("sideways".into()))
        );
    }
}
