//! End-to-end debriefing pipeline: read, parse, extract, reconcile.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use debrief_types::{Faction, MissionSnapshot};
use encoding_rs::WINDOWS_1252;

use crate::catalog::UnitCatalog;
use crate::census::{build_census, select_snapshot};
use crate::error::{DebriefError, Result, StructuralParseError};
use crate::events::{DeadUnitSet, EventIssue, TriggerState, extract_events};
use crate::log::{SchemaVariant, parse_log};
use crate::reconcile::{Reconciliation, reconcile};

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Everything the reconciler needs besides the log itself.
pub struct MissionInputs {
    /// World-state of the mission as actually flown.
    pub detailed: MissionSnapshot,
    /// Placeholder world-state used when the mission was resolved instantly.
    pub quick: MissionSnapshot,
    pub player: Faction,
    pub enemy: Faction,
    pub catalog: Arc<dyn UnitCatalog>,
}

impl std::fmt::Debug for MissionInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MissionInputs")
            .field("player", &self.player)
            .field("enemy", &self.enemy)
            .finish_non_exhaustive()
    }
}

/// A parsed telemetry log, ready to be reconciled.
#[derive(Debug, Clone)]
pub struct DebriefingLog {
    pub path: Option<PathBuf>,
    pub modified: Option<DateTime<Local>>,
    pub variant: SchemaVariant,
    pub dead_units: DeadUnitSet,
    pub trigger_state: TriggerState,
    pub issues: Vec<EventIssue>,
}

impl DebriefingLog {
    /// Read and parse a debriefing file.
    pub fn parse(path: &Path) -> Result<Self> {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Local>::from)
            .ok();
        let text = read_log_text(path)?;
        let mut log = Self::from_text(&text)?;
        log.path = Some(path.to_path_buf());
        log.modified = modified;
        Ok(log)
    }

    pub fn from_text(text: &str) -> std::result::Result<Self, StructuralParseError> {
        let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
        let parsed = parse_log(text)?;
        let extracted = extract_events(&parsed.table);

        tracing::debug!(
            variant = ?parsed.variant,
            dead = extracted.dead_units.len(),
            skipped = extracted.issues.len(),
            "Parsed debriefing"
        );

        Ok(Self {
            path: None,
            modified: None,
            variant: parsed.variant,
            dead_units: extracted.dead_units,
            trigger_state: extracted.trigger_state,
            issues: extracted.issues,
        })
    }

    /// Build the census and reconcile this log's claims against it.
    pub fn calculate_units(self, inputs: &MissionInputs) -> Reconciliation {
        let snapshot = select_snapshot(&inputs.detailed, &inputs.quick, &self.trigger_state);
        let catalog = inputs.catalog.as_ref();
        let census = build_census(snapshot, &inputs.player, &inputs.enemy, catalog);
        reconcile(
            self.dead_units,
            snapshot,
            &inputs.player,
            &inputs.enemy,
            &census,
            catalog,
        )
    }
}

/// Parse a debriefing file and reconcile it in one step.
pub fn process_debriefing(path: &Path, inputs: &MissionInputs) -> Result<Reconciliation> {
    let log = DebriefingLog::parse(path)?;
    Ok(log.calculate_units(inputs))
}

/// Read a log as text. Bytes that are not valid UTF-8 are decoded as Windows-1252.
pub fn read_log_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| DebriefError::io(path, e))?;
    Ok(decode_log_bytes(bytes))
}

fn decode_log_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("Debriefing is not UTF-8, decoding as Windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(e.as_bytes());
            text.into_owned()
        }
    }
}

/// Load a mission snapshot exported as JSON.
pub fn load_snapshot(path: &Path) -> Result<MissionSnapshot> {
    let contents = fs::read_to_string(path).map_err(|e| DebriefError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| DebriefError::Snapshot {
        path: path.to_path_buf(),
        source: e,
    })
}
