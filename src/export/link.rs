use super::{EventBounds, format_date, format_local};
use crate::{ShiftEntry, ShiftTemplate};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

const GOOGLE_RENDER_URL: &str = "https://www.google.com/calendar/render";

// Same set encodeURIComponent leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Google Calendar "create event" link for one entry. Timed shifts carry
/// floating local times so the calendar applies the viewer's own zone.
/// `None` when the entry's bounds cannot be represented.
pub fn google_calendar_link(entry: &ShiftEntry, template: &ShiftTemplate) -> Option<String> {
    let dates = match EventBounds::for_entry(entry, template)? {
        EventBounds::AllDay {
            start,
            end_exclusive,
        } => format!("{}/{}", format_date(start), format_date(end_exclusive)),
        EventBounds::Timed { start, end } => {
            format!("{}/{}", format_local(start), format_local(end))
        }
    };

    let mut text = format!("{} {}", template.icon, template.name)
        .trim_start()
        .to_string();
    if entry.extra_hours.is_extended() {
        text.push_str(" (incl. Extra Hours)");
    }

    let mut details = format!(
        "ShiftFlow recorded shift. Swapped: {}",
        if entry.is_swapped { "Yes" } else { "No" }
    );
    if let Some(partner) = &entry.swapped_with {
        details.push_str(&format!(" with {partner}"));
    }

    Some(format!(
        "{GOOGLE_RENDER_URL}?action=TEMPLATE&text={}&dates={}&details={}",
        utf8_percent_encode(&text, COMPONENT),
        dates,
        utf8_percent_encode(&details, COMPONENT)
    ))
}
