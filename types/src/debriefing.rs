//! Mission outcome handed back to the campaign.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::mission::{Faction, UnitType};

/// Unit-type -> count for a single faction.
pub type UnitCounts = BTreeMap<UnitType, i64>;

/// Per-faction unit counts.
pub type FactionTally = BTreeMap<Faction, UnitCounts>;

/// Authoritative outcome of one reconciled mission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Debriefing {
    /// Destroyed units per faction and unit type.
    pub destroyed: FactionTally,
    /// Surviving units per faction: census minus destroyed, never clamped.
    pub alive: FactionTally,
    /// Display names of destroyed static objects, in detection order.
    pub destroyed_objects: Vec<String>,
}

impl Debriefing {
    pub fn destroyed_count(&self, faction: &Faction, unit_type: &UnitType) -> i64 {
        lookup(&self.destroyed, faction, unit_type)
    }

    pub fn alive_count(&self, faction: &Faction, unit_type: &UnitType) -> i64 {
        lookup(&self.alive, faction, unit_type)
    }

    /// Total destroyed units across all types for a faction.
    pub fn total_destroyed(&self, faction: &Faction) -> i64 {
        self.destroyed
            .get(faction)
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }
}

fn lookup(tally: &FactionTally, faction: &Faction, unit_type: &UnitType) -> i64 {
    tally
        .get(faction)
        .and_then(|counts| counts.get(unit_type))
        .copied()
        .unwrap_or(0)
}
