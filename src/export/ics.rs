use super::{EventBounds, format_date, format_local};
use crate::template::TemplateLookup;
use crate::{ShiftEntry, ShiftTemplate};
use chrono::{DateTime, Utc};

const PRODID: &str = "-//ShiftFlow//Calendar Export//EN";
const UID_DOMAIN: &str = "shiftflow.app";
pub const FILE_NAME: &str = "shiftflow_roster.ics";

/// Renders every resolvable entry as a VEVENT. `stamp` becomes each event's
/// DTSTAMP. Entries whose template is missing or whose bounds cannot be
/// represented are left out.
pub fn generate_ics<L>(entries: &[ShiftEntry], templates: &L, stamp: DateTime<Utc>) -> String
where
    L: TemplateLookup + ?Sized,
{
    let stamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
    ];

    for entry in entries {
        let Some(template) = templates.template(&entry.template_id) else {
            tracing::debug!(id = %entry.id, template_id = %entry.template_id, "skipping dangling entry in export");
            continue;
        };
        let Some(bounds) = EventBounds::for_entry(entry, template) else {
            tracing::debug!(id = %entry.id, date = %entry.date, "skipping entry outside the date range");
            continue;
        };
        lines.push("BEGIN:VEVENT".to_string());
        match bounds {
            EventBounds::AllDay {
                start,
                end_exclusive,
            } => {
                lines.push(format!("DTSTART;VALUE=DATE:{}", format_date(start)));
                lines.push(format!("DTEND;VALUE=DATE:{}", format_date(end_exclusive)));
            }
            EventBounds::Timed { start, end } => {
                lines.push(format!("DTSTART:{}", format_local(start)));
                lines.push(format!("DTEND:{}", format_local(end)));
            }
        }
        lines.push(format!("UID:{}@{UID_DOMAIN}", entry.id));
        lines.push(format!("DTSTAMP:{stamp}"));
        lines.push(format!("SUMMARY:{}", escape_text(&summary(entry, template))));
        lines.push(format!("DESCRIPTION:{}", escape_text(&description(entry))));
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());
    let mut out = String::new();
    for line in &lines {
        out.push_str(&fold_line(line));
        out.push_str("\r\n");
    }
    out
}

pub fn summary(entry: &ShiftEntry, template: &ShiftTemplate) -> String {
    let mut text = format!("{} {}", template.icon, template.name)
        .trim_start()
        .to_string();
    if entry.is_swapped {
        text.push_str(" (Swapped)");
    }
    if entry.extra_hours.is_extended() {
        text.push_str(" + Extra");
    }
    text
}

fn description(entry: &ShiftEntry) -> String {
    let mut text = format!(
        "ShiftFlow Entry. Swapped: {}.",
        if entry.is_swapped { "Yes" } else { "No" }
    );
    if let Some(partner) = &entry.swapped_with {
        text.push_str(&format!(" With: {partner}"));
    }
    if let Some(note) = &entry.note {
        text.push_str(&format!(" Note: {note}"));
    }
    text
}

/// RFC 5545 TEXT escaping.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

const MAX_LINE_OCTETS: usize = 75;

/// RFC 5545 line folding: no physical line exceeds 75 octets, continuation
/// lines start with a single space, and UTF-8 sequences are never split.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut used = 0;
    let mut limit = MAX_LINE_OCTETS;
    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > limit {
            out.push_str("\r\n ");
            used = 0;
            // The leading space counts towards the continuation line.
            limit = MAX_LINE_OCTETS - 1;
        }
        out.push(c);
        used += width;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lines_are_not_folded() {
        let line = "X".repeat(MAX_LINE_OCTETS);
        assert_eq!(fold_line(&line), line);
    }

    #[test]
    fn long_lines_fold_on_char_boundaries() {
        let line = format!("SUMMARY:{}", "é".repeat(60));
        let folded = fold_line(&line);
        for (i, physical) in folded.split("\r\n").enumerate() {
            assert!(physical.len() <= MAX_LINE_OCTETS, "line {i} too long: {}", physical.len());
            if i > 0 {
                assert!(physical.starts_with(' '));
            }
        }
        assert_eq!(folded.replace("\r\n ", ""), line);
    }

    #[test]
    fn escapes_separators_and_newlines() {
        assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
    }
}
