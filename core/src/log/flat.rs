//! Line-oriented fallback grammar for multiplayer debriefings.
//!
//! Multiplayer sessions write logs that never resolve into a full table, so
//! only the event region is read, one trimmed line at a time:
//!
//! ```text
//! events =
//! {
//!     [1] =
//!     {
//!         type	=	"crash",
//!         initiatorMissionID	=	"99",
//!     }, -- end of [1]
//! } -- end of events
//! ```

use memchr::{memchr, memchr_iter};

use super::table::{Key, Table, Value};
use crate::error::GrammarError;

const EVENTS_OPEN: &str = "events =";
const EVENTS_CLOSE: &str = "} -- end of events";
const EVENT_CLOSE: &str = "}, -- end of [";

/// Event fields recognised by line prefix.
const FIELDS: [&str; 3] = ["initiator", "initiatorMissionID", "type"];

/// Parse the event region into `{ debriefing = { events = { [0] = {...}, ... } } }`.
pub fn parse_flat(input: &str) -> Result<Table, GrammarError> {
    let mut events = Table::new();
    let mut element: Option<Table> = None;
    let mut in_events = false;
    let mut saw_region = false;
    let mut next_key: i64 = 0;

    for (offset, raw_line) in lines(input) {
        let line = raw_line.trim();

        if line.starts_with(EVENTS_OPEN) {
            in_events = true;
            saw_region = true;
        } else if line.starts_with(EVENTS_CLOSE) {
            in_events = false;
        }

        if !in_events {
            continue;
        }

        if line.starts_with(EVENT_CLOSE) {
            events.insert(Key::Index(next_key), Value::Table(element.take().unwrap_or_default()));
            next_key += 1;
            continue;
        }

        let Some(field) = field_of(line) else {
            continue;
        };
        let value = quoted_value(line).ok_or_else(|| {
            GrammarError::new(offset, format!("field '{field}' has no quoted value"))
        })?;
        element
            .get_or_insert_with(Table::new)
            .insert(field, Value::Str(value.to_string()));
    }

    if !saw_region {
        return Err(GrammarError::new(0, "no 'events =' region found"));
    }

    let mut debriefing = Table::new();
    debriefing.insert("events", Value::Table(events));
    let mut root = Table::new();
    root.insert("debriefing", Value::Table(debriefing));
    Ok(root)
}

/// Iterate lines with their byte offsets.
fn lines(input: &str) -> impl Iterator<Item = (usize, &str)> {
    let bytes = input.as_bytes();
    let mut start = 0;
    let mut ends: Vec<usize> = memchr_iter(b'\n', bytes).collect();
    if ends.last().is_none_or(|&last| last + 1 < bytes.len()) {
        ends.push(bytes.len());
    }
    ends.into_iter().map(move |end| {
        let line = (start, &input[start..end]);
        start = end + 1;
        line
    })
}

/// Match a field name followed by whitespace or `=`.
fn field_of(line: &str) -> Option<&'static str> {
    FIELDS.into_iter().find(|field| {
        line.strip_prefix(field)
            .and_then(|rest| rest.bytes().next())
            .is_some_and(|c| c == b'\t' || c == b' ' || c == b'=')
    })
}

/// Extract `value` from `... = "value",`.
fn quoted_value(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    for eq in memchr_iter(b'=', bytes) {
        let rest = line[eq + 1..].trim_start();
        let Some(body) = rest.strip_prefix('"') else {
            continue;
        };
        let mut search = 0;
        while let Some(quote) = memchr(b'"', &body.as_bytes()[search..]) {
            let end = search + quote;
            if body.as_bytes().get(end + 1) == Some(&b',') {
                return Some(&body[..end]);
            }
            search = end + 1;
        }
    }
    None
}
