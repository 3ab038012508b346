//! iCalendar export of a single event (RFC 5545).
//!
//! One `VCALENDAR` holding one `VEVENT`. Text values are escaped, content
//! lines are folded at 75 octets, and every line ends with CRLF.

use chrono::{DateTime, Utc};
use eventmingle_core::entities::{Event, EventStatus};

/// Media type of the export.
pub const CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

const PRODID: &str = "-//EventMingle//Events//EN";
const MAX_LINE_OCTETS: usize = 75;

/// Render `event` as an `.ics` document. `stamp` becomes `DTSTAMP`.
#[must_use]
pub fn event_to_ics(event: &Event, stamp: DateTime<Utc>) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@eventmingle", event.id),
        format!("DTSTAMP:{}", timestamp(stamp)),
        format!("DTSTART:{}", timestamp(event.start_time)),
        format!("DTEND:{}", timestamp(event.end_time)),
        format!("SUMMARY:{}", escape_text(&event.title)),
    ];
    if !event.description.is_empty() {
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
    }
    lines.push(format!("LOCATION:{}", escape_text(&event.location)));
    lines.push(format!("CATEGORIES:{}", escape_text(&event.category)));
    lines.push(format!("STATUS:{}", status(event.status)));
    lines.push(format!("LAST-MODIFIED:{}", timestamp(event.updated_at)));
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in &lines {
        fold_into(line, &mut out);
    }
    out
}

/// Download file name for `event`.
#[must_use]
pub fn file_name(event: &Event) -> String {
    format!("event-{}.ics", event.id)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

const fn status(status: EventStatus) -> &'static str {
    match status {
        EventStatus::Draft => "TENTATIVE",
        EventStatus::Cancelled => "CANCELLED",
        EventStatus::Published | EventStatus::Completed => "CONFIRMED",
    }
}

/// Escape a TEXT value: backslash, semicolon, comma and line breaks.
#[must_use]
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
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

/// Append `line` folded at 75 octets, never splitting a UTF-8 sequence.
/// Continuation lines start with a single space.
fn fold_into(line: &str, out: &mut String) {
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(ch);
        width += len;
    }
    out.push_str("\r\n");
}
