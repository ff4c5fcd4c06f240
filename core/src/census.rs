//! Pre-mission unit census.
//!
//! Counts the live units of each faction by canonical type before any
//! destruction claim is applied. Auxiliary types are left out.

use std::collections::BTreeMap;

use debrief_types::{Faction, FactionForces, MissionSnapshot, UnitCategory, UnitCounts, UnitType};

use crate::catalog::UnitCatalog;
use crate::events::TriggerState;

/// Categories counted by the census. Helicopters are included so every unit the
/// reconciler can credit also has a baseline.
pub const CENSUS_CATEGORIES: [UnitCategory; 4] = UnitCategory::MOBILE;

/// Per-faction live counts taken before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitCensus {
    factions: BTreeMap<Faction, UnitCounts>,
}

impl UnitCensus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, faction: Faction, counts: UnitCounts) {
        self.factions.insert(faction, counts);
    }

    pub fn faction(&self, faction: &Faction) -> Option<&UnitCounts> {
        self.factions.get(faction)
    }

    pub fn count(&self, faction: &Faction, unit_type: &UnitType) -> i64 {
        self.factions
            .get(faction)
            .and_then(|counts| counts.get(unit_type))
            .copied()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Faction, &UnitCounts)> {
        self.factions.iter()
    }
}

/// Pick the world-state the census and reconciliation should read.
///
/// A played mission leaves a trigger-state payload in its log; an instantly
/// resolved one does not, and only the placeholder world-state applies.
pub fn select_snapshot<'a>(
    detailed: &'a MissionSnapshot,
    quick: &'a MissionSnapshot,
    trigger_state: &TriggerState,
) -> &'a MissionSnapshot {
    if trigger_state.mission_was_played() {
        detailed
    } else {
        tracing::debug!("No trigger state in debriefing, using quick mission snapshot");
        quick
    }
}

/// Count one faction's non-auxiliary units by type.
pub fn count_units(forces: &FactionForces, catalog: &dyn UnitCatalog) -> UnitCounts {
    let mut counts = UnitCounts::new();

    for (category, unit) in forces.units(&CENSUS_CATEGORIES) {
        let Some(unit_type) = catalog.resolve(category, unit) else {
            tracing::warn!(
                unit_id = unit.id,
                raw_type = %unit.raw_type,
                "Unit type not in catalog, left out of census"
            );
            continue;
        };
        if catalog.is_auxiliary(&unit_type) {
            continue;
        }
        *counts.entry(unit_type).or_insert(0) += 1;
    }

    counts
}

/// Build the census for both sides of a mission.
pub fn build_census(
    snapshot: &MissionSnapshot,
    player: &Faction,
    enemy: &Faction,
    catalog: &dyn UnitCatalog,
) -> UnitCensus {
    let mut census = UnitCensus::new();

    for faction in [player, enemy] {
        let counts = match snapshot.faction(faction) {
            Some(forces) => count_units(forces, catalog),
            None => {
                tracing::warn!(%faction, "Faction missing from mission snapshot, census is empty");
                UnitCounts::new()
            }
        };
        census.insert(faction.clone(), counts);
    }

    census
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableCatalog;
    use crate::log::{Table, Value};
    use debrief_types::{Group, SimUnit};

    fn russia() -> FactionForces {
        let mut forces = FactionForces::new("Russia");
        forces.vehicle_groups.push(Group::new(
            "Armor",
            vec![
                SimUnit::new(1, "T-55", "Armor-1"),
                SimUnit::new(2, "T-55", "Armor-2"),
                SimUnit::new(3, "SAM_SA_19_Tunguska_2S6", "Escort-1"),
            ],
        ));
        forces
            .helicopter_groups
            .push(Group::new("Rotary", vec![SimUnit::new(4, "Mi-24V", "Rotary-1")]));
        forces
            .static_groups
            .push(Group::new("Warehouse|04", vec![SimUnit::new(5, "Warehouse", "Warehouse|04")]));
        forces
    }

    #[test]
    fn test_counts_by_type_and_skips_auxiliary() {
        let catalog = TableCatalog::builtin().with_alias("T-55", "MBT_T_55");
        let counts = count_units(&russia(), &catalog);

        assert_eq!(counts.get(&UnitType::new("MBT_T_55")), Some(&2));
        assert_eq!(counts.get(&UnitType::new("Mi-24V")), Some(&1));
        assert!(!counts.contains_key(&UnitType::new("SAM_SA_19_Tunguska_2S6")));
        assert!(!counts.contains_key(&UnitType::new("Warehouse")));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_missing_faction_has_empty_census() {
        let snapshot = MissionSnapshot::new(vec![russia()]);
        let census = build_census(
            &snapshot,
            &Faction::new("USA"),
            &Faction::new("Russia"),
            &TableCatalog::builtin(),
        );

        assert_eq!(census.faction(&Faction::new("USA")), Some(&UnitCounts::new()));
        assert_eq!(census.count(&Faction::new("Russia"), &UnitType::new("T-55")), 2);
    }

    #[test]
    fn test_snapshot_selection_follows_trigger_state() {
        let detailed = MissionSnapshot::new(vec![russia()]);
        let quick = MissionSnapshot::default();

        let mut payload = Table::new();
        payload.insert(1i64, Value::Bool(true));
        let played = TriggerState::new(Some(Value::Table(payload)));
        let instant = TriggerState::new(Some(Value::Table(Table::new())));

        assert!(std::ptr::eq(select_snapshot(&detailed, &quick, &played), &detailed));
        assert!(std::ptr::eq(select_snapshot(&detailed, &quick, &instant), &quick));
        assert!(std::ptr::eq(
            select_snapshot(&detailed, &quick, &TriggerState::default()),
            &quick
        ));
    }
}
