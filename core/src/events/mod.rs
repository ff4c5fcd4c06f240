//! Destruction-event extraction from a parsed telemetry log.

mod dead_units;
pub mod lookup;

pub use dead_units::DeadUnitSet;
pub use lookup::{lookup_direct, lookup_nested, resolve_field};

use crate::log::{Key, Table, Value};

/// Event types that report a unit as destroyed.
pub const DESTRUCTION_EVENTS: [&str; 2] = ["crash", "dead"];

const EVENT_TYPE: &str = "type";
const INITIATOR_ID: &str = "initiatorMissionID";

/// The `debriefing.triggers_state` payload, present only when the mission was actually flown.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriggerState(Option<Value>);

impl TriggerState {
    pub fn new(value: Option<Value>) -> Self {
        Self(value)
    }

    /// A non-empty payload means the mission was played rather than resolved instantly.
    pub fn mission_was_played(&self) -> bool {
        match &self.0 {
            Some(Value::Table(t)) => !t.is_empty(),
            Some(Value::Str(s)) => !s.is_empty(),
            _ => false,
        }
    }
}

/// Recoverable problem with a single event; the event is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventIssue {
    /// No `type` field, directly or nested.
    MissingType { key: Key },
    /// No parseable `initiatorMissionID`, directly or nested.
    MissingIdentifier { key: Key },
    /// The identifier was already claimed by an earlier event.
    DuplicateDeathRecord { key: Key, id: i64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedEvents {
    pub dead_units: DeadUnitSet,
    pub trigger_state: TriggerState,
    pub issues: Vec<EventIssue>,
}

/// Resolve the events mapping: `debriefing.events`, or top-level `events` for older logs.
pub fn events_table(root: &Table) -> Option<&Table> {
    match root.get_table("debriefing") {
        Some(debriefing) => debriefing.get_table("events"),
        None => root.get_table("events"),
    }
}

pub fn trigger_state(root: &Table) -> TriggerState {
    TriggerState::new(
        root.get_table("debriefing")
            .and_then(|d| d.get("triggers_state"))
            .cloned(),
    )
}

/// Walk every event and collect destroyed-unit identifiers in event order.
pub fn extract_events(root: &Table) -> ExtractedEvents {
    let mut extracted = ExtractedEvents {
        trigger_state: trigger_state(root),
        ..Default::default()
    };

    let Some(events) = events_table(root) else {
        tracing::debug!("Debriefing carries no events");
        return extracted;
    };

    for (key, event) in events.iter() {
        let Some(record) = event.as_table() else {
            tracing::debug!(%key, "Skipping non-table event entry");
            continue;
        };

        let Some(event_type) = resolve_field(record, EVENT_TYPE).and_then(Value::as_str) else {
            tracing::warn!(%key, "Failed to parse event: no type field");
            extracted.issues.push(EventIssue::MissingType { key: key.clone() });
            continue;
        };

        if !DESTRUCTION_EVENTS.contains(&event_type) {
            continue;
        }

        let Some(id) = lookup::lookup_candidates(record, INITIATOR_ID).find_map(Value::as_identifier)
        else {
            tracing::warn!(%key, event_type, "Destruction event without a usable initiatorMissionID");
            extracted.issues.push(EventIssue::MissingIdentifier { key: key.clone() });
            continue;
        };

        if !extracted.dead_units.insert(id) {
            tracing::warn!(%key, id, "Duplicate death record, already counted");
            extracted
                .issues
                .push(EventIssue::DuplicateDeathRecord { key: key.clone(), id });
        }
    }

    extracted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{parse_flat, parse_structured};

    fn extract(text: &str) -> ExtractedEvents {
        extract_events(&parse_structured(text).unwrap())
    }

    #[test]
    fn test_collects_dead_and_crash_in_order() {
        let x = extract(
            r#"debriefing = { events = {
                [1] = { type = "mission start" },
                [2] = { type = "crash", initiatorMissionID = "12" },
                [3] = { type = "hit", initiatorMissionID = "13" },
                [4] = { type = "dead", initiatorMissionID = "11" },
            } }"#,
        );
        assert_eq!(x.dead_units.into_vec(), vec![12, 11]);
        assert!(x.issues.is_empty());
    }

    #[test]
    fn test_duplicate_death_is_recorded_once() {
        let x = extract(
            r#"debriefing = { events = {
                [1] = { type = "dead", initiatorMissionID = "42" },
                [2] = { type = "dead", initiatorMissionID = "42" },
            } }"#,
        );
        assert_eq!(x.dead_units.len(), 1);
        assert_eq!(
            x.issues,
            vec![EventIssue::DuplicateDeathRecord {
                key: Key::Index(2),
                id: 42
            }]
        );
    }

    #[test]
    fn test_nested_fields_are_found() {
        let x = extract(
            r#"debriefing = { events = {
                [1] = { payload = { type = "dead", initiatorMissionID = "5" } },
            } }"#,
        );
        assert_eq!(x.dead_units.into_vec(), vec![5]);
    }

    #[test]
    fn test_unparseable_direct_id_falls_back_to_nested() {
        let x = extract(
            r#"debriefing = { events = {
                [1] = { type = "dead", initiatorMissionID = "", inner = { initiatorMissionID = "8" } },
            } }"#,
        );
        assert_eq!(x.dead_units.into_vec(), vec![8]);
    }

    #[test]
    fn test_bad_events_are_skipped_individually() {
        let x = extract(
            r#"debriefing = { events = {
                [1] = { initiatorMissionID = "1" },
                [2] = { type = "dead", initiatorMissionID = "n/a" },
                [3] = "garbage",
                [4] = { type = "dead", initiatorMissionID = 4 },
            } }"#,
        );
        assert_eq!(x.dead_units.into_vec(), vec![4]);
        assert_eq!(
            x.issues,
            vec![
                EventIssue::MissingType { key: Key::Index(1) },
                EventIssue::MissingIdentifier { key: Key::Index(2) },
            ]
        );
    }

    #[test]
    fn test_top_level_events_for_older_logs() {
        let x = extract(r#"events = { [1] = { type = "dead", initiatorMissionID = "3" } }"#);
        assert_eq!(x.dead_units.into_vec(), vec![3]);
    }

    #[test]
    fn test_missing_events_yield_empty_set() {
        assert!(extract("callsign = \"PyDCS\"").dead_units.is_empty());
        assert!(extract("debriefing = { result = 0 }").dead_units.is_empty());
    }

    #[test]
    fn test_trigger_state_detection() {
        assert!(extract("debriefing = { triggers_state = { [1] = true } }")
            .trigger_state
            .mission_was_played());
        assert!(!extract("debriefing = { triggers_state = { } }")
            .trigger_state
            .mission_was_played());
        assert!(!extract("events = { }").trigger_state.mission_was_played());
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let root = parse_flat(
            "events =\n\t\ttype\t=\t\"dead\",\n\t\tinitiatorMissionID\t=\t\"9\",\n\t}, -- end of [1]\n\t\ttype\t=\t\"crash\",\n\t\tinitiatorMissionID\t=\t\"2\",\n\t}, -- end of [2]\n} -- end of events\n",
        )
        .unwrap();
        let first = extract_events(&root).dead_units.into_vec();
        let second = extract_events(&root).dead_units.into_vec();
        assert_eq!(first, vec![9, 2]);
        assert_eq!(first, second);
    }
}
