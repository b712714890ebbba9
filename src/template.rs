use crate::error::{Result, RosterError};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftCategory {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
    Night,
    Sick,
    Annual,
    Custom,
}

impl ShiftCategory {
    pub const ALL: [ShiftCategory; 6] = [
        ShiftCategory::Am,
        ShiftCategory::Pm,
        ShiftCategory::Night,
        ShiftCategory::Sick,
        ShiftCategory::Annual,
        ShiftCategory::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftCategory::Am => "AM",
            ShiftCategory::Pm => "PM",
            ShiftCategory::Night => "Night",
            ShiftCategory::Sick => "Sick",
            ShiftCategory::Annual => "Annual",
            ShiftCategory::Custom => "Custom",
        }
    }

    /// Leave days are full-day blocks and carry no rest requirement.
    pub fn is_leave(&self) -> bool {
        matches!(self, ShiftCategory::Sick | ShiftCategory::Annual)
    }
}

impl FromStr for ShiftCategory {
    type Err = RosterError;

    /// Case-insensitive match on the category name.
    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| RosterError::UnknownCategory(value.to_string()))
    }
}

/// Serde adapter for `HH:MM` wall-clock strings.
pub(crate) mod wall_clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

pub fn parse_wall_clock(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), wall_clock::FORMAT)
        .map_err(|_| RosterError::InvalidTime(input.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: ShiftCategory,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

impl ShiftTemplate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ShiftCategory,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            start_time,
            end_time,
            icon: String::new(),
            color: String::new(),
        }
    }

    /// Builds a template from authored `HH:MM` strings, rejecting malformed times.
    pub fn from_strings(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ShiftCategory,
        start: &str,
        end: &str,
    ) -> Result<Self> {
        let start_time = parse_wall_clock(start)?;
        let end_time = parse_wall_clock(end)?;
        Ok(Self::new(id, name, category, start_time, end_time))
    }

    pub fn with_display(mut self, icon: impl Into<String>, color: impl Into<String>) -> Self {
        self.icon = icon.into();
        self.color = color.into();
        self
    }

    pub fn is_leave(&self) -> bool {
        self.category.is_leave()
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end_time < self.start_time
    }

    pub fn time_label(&self) -> String {
        if self.is_leave() {
            "Full Day Block".to_string()
        } else {
            format!(
                "{} - {}",
                self.start_time.format(wall_clock::FORMAT),
                self.end_time.format(wall_clock::FORMAT)
            )
        }
    }
}

/// Found/not-found template lookup by identifier.
pub trait TemplateLookup {
    fn template(&self, id: &str) -> Option<&ShiftTemplate>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    templates: Vec<ShiftTemplate>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new(default_templates())
    }
}

impl TemplateCatalog {
    pub fn new(templates: Vec<ShiftTemplate>) -> Self {
        Self { templates }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn get(&self, id: &str) -> Option<&ShiftTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn add(&mut self, template: ShiftTemplate) -> Result<()> {
        if self.contains(&template.id) {
            return Err(RosterError::DuplicateTemplate(template.id));
        }
        self.templates.push(template);
        Ok(())
    }

    /// Entries still referring to a removed template become dangling; nothing cascades.
    pub fn remove(&mut self, id: &str) -> Option<ShiftTemplate> {
        let idx = self.templates.iter().position(|template| template.id == id)?;
        Some(self.templates.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShiftTemplate> {
        self.templates.iter()
    }

    pub fn templates(&self) -> &[ShiftTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateLookup for TemplateCatalog {
    fn template(&self, id: &str) -> Option<&ShiftTemplate> {
        self.get(id)
    }
}

impl TemplateLookup for [ShiftTemplate] {
    fn template(&self, id: &str) -> Option<&ShiftTemplate> {
        self.iter().find(|template| template.id == id)
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

pub fn default_templates() -> Vec<ShiftTemplate> {
    vec![
        ShiftTemplate::new("t-am", "AM Shift", ShiftCategory::Am, hm(6, 45), hm(15, 15))
            .with_display("🌅", "bg-amber-100 text-amber-700 border-amber-200"),
        ShiftTemplate::new("t-pm", "PM Shift", ShiftCategory::Pm, hm(14, 45), hm(23, 15))
            .with_display("🌇", "bg-indigo-100 text-indigo-700 border-indigo-200"),
        ShiftTemplate::new("t-night", "Night Shift", ShiftCategory::Night, hm(22, 45), hm(6, 15))
            .with_display("🌙", "bg-slate-800 text-slate-100 border-slate-700"),
        ShiftTemplate::new("t-sick", "Sick Leave", ShiftCategory::Sick, hm(0, 0), hm(23, 59))
            .with_display("🤒", "bg-rose-100 text-rose-700 border-rose-200"),
        ShiftTemplate::new("t-annual", "Annual Leave", ShiftCategory::Annual, hm(0, 0), hm(23, 59))
            .with_display("🌴", "bg-emerald-100 text-emerald-700 border-emerald-200"),
    ]
}
