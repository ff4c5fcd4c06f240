//! Reconciliation of destruction claims against the mission world-state.
//!
//! The reconciler owns the claimed identifiers for the whole run. Each unit or
//! static object that matches a claim consumes it, so no identifier is ever
//! credited twice. Claims nobody matches are reported as orphans.

use debrief_types::{Debriefing, Faction, FactionTally, MissionSnapshot, UnitCategory, UnitCounts};

use crate::catalog::UnitCatalog;
use crate::census::UnitCensus;
use crate::events::DeadUnitSet;

/// Cosmetic smoke marker placed next to strike targets; never counts as a destroyed object.
pub const SMOKE_MARKER_TYPE: &str = "big_smoke";

/// Categories scanned for destroyed mobile units, in scan order.
pub const RECONCILED_CATEGORIES: [UnitCategory; 4] = UnitCategory::MOBILE;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    pub debriefing: Debriefing,
    /// Claims that matched no unit or static object, in claim order.
    pub orphans: Vec<i64>,
}

/// Apply destruction claims to both factions and the enemy's static objects.
pub fn reconcile(
    mut dead_units: DeadUnitSet,
    snapshot: &MissionSnapshot,
    player: &Faction,
    enemy: &Faction,
    census: &UnitCensus,
    catalog: &dyn UnitCatalog,
) -> Reconciliation {
    let mut destroyed = FactionTally::new();

    for faction in [player, enemy] {
        // Accumulate: player and enemy may name the same faction.
        let counts = destroyed.entry(faction.clone()).or_default();
        let Some(forces) = snapshot.faction(faction) else {
            continue;
        };
        for (category, unit) in forces.units(&RECONCILED_CATEGORIES) {
            if !dead_units.take(unit.id) {
                continue;
            }
            match catalog.resolve(category, unit) {
                Some(unit_type) => {
                    tracing::info!(
                        name = %unit.name,
                        id = unit.id,
                        %unit_type,
                        "Found dead unit"
                    );
                    *counts.entry(unit_type).or_insert(0) += 1;
                }
                None => {
                    tracing::warn!(
                        name = %unit.name,
                        id = unit.id,
                        raw_type = %unit.raw_type,
                        "Dead unit has no catalog type, not tallied"
                    );
                }
            }
        }
    }

    let mut destroyed_objects = Vec::new();
    if let Some(forces) = snapshot.faction(enemy) {
        for group in &forces.static_groups {
            let Some(leader) = group.leader() else {
                continue;
            };
            if leader.raw_type == SMOKE_MARKER_TYPE || !dead_units.contains(leader.id) {
                continue;
            }
            dead_units.take(leader.id);
            tracing::info!(name = %group.name, id = leader.id, "Found dead static");
            destroyed_objects.push(group.name.clone());
        }
    }

    let orphans = dead_units.into_vec();
    if !orphans.is_empty() {
        tracing::info!(?orphans, "Unsatisfied destroyed identifiers");
    }

    let alive = alive_tally(census, &destroyed);

    Reconciliation {
        debriefing: Debriefing {
            destroyed,
            alive,
            destroyed_objects,
        },
        orphans,
    }
}

/// Census minus destroyed, for every type present in the census.
///
/// Counts are not clamped: a negative value means more units were credited
/// than the census knew about.
pub fn alive_tally(census: &UnitCensus, destroyed: &FactionTally) -> FactionTally {
    census
        .iter()
        .map(|(faction, counts)| {
            let lost = destroyed.get(faction);
            let alive: UnitCounts = counts
                .iter()
                .map(|(unit_type, &count)| {
                    let dead = lost.and_then(|l| l.get(unit_type)).copied().unwrap_or(0);
                    let remaining = count - dead;
                    if remaining < 0 {
                        tracing::warn!(
                            %faction,
                            %unit_type,
                            census = count,
                            destroyed = dead,
                            "More units destroyed than the census counted"
                        );
                    }
                    (unit_type.clone(), remaining)
                })
                .collect();
            (faction.clone(), alive)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableCatalog;
    use crate::census::build_census;
    use debrief_types::{FactionForces, Group, SimUnit, UnitType};

    fn snapshot() -> MissionSnapshot {
        let mut usa = FactionForces::new("USA");
        usa.plane_groups
            .push(Group::new("Strike", vec![SimUnit::new(10, "A-10C", "Strike-1")]));

        let mut russia = FactionForces::new("Russia");
        russia.vehicle_groups.push(Group::new(
            "Armor",
            vec![
                SimUnit::new(42, "T-55", "Armor-1"),
                SimUnit::new(43, "T-55", "Armor-2"),
                SimUnit::new(44, "T-55", "Armor-3"),
            ],
        ));
        russia.static_groups.push(Group::new(
            "Ammo depot|01",
            vec![SimUnit::new(70, "Warehouse", "Ammo depot|01"), SimUnit::new(71, "Tent", "x")],
        ));
        russia.static_groups.push(Group::new(
            "Warehouse|04",
            vec![SimUnit::new(77, SMOKE_MARKER_TYPE, "Warehouse|04")],
        ));
        MissionSnapshot::new(vec![usa, russia])
    }

    fn run(ids: &[i64]) -> Reconciliation {
        let snapshot = snapshot();
        let catalog = TableCatalog::builtin().with_alias("T-55", "MBT_T_55");
        let usa = Faction::new("USA");
        let russia = Faction::new("Russia");
        let census = build_census(&snapshot, &usa, &russia, &catalog);
        reconcile(
            ids.iter().copied().collect(),
            &snapshot,
            &usa,
            &russia,
            &census,
            &catalog,
        )
    }

    #[test]
    fn test_destroyed_unit_reduces_alive() {
        let result = run(&[42]);
        let russia = Faction::new("Russia");
        let t55 = UnitType::new("MBT_T_55");

        assert_eq!(result.debriefing.destroyed_count(&russia, &t55), 1);
        assert_eq!(result.debriefing.alive_count(&russia, &t55), 2);
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_both_factions_have_destroyed_entries() {
        let result = run(&[]);
        assert_eq!(result.debriefing.destroyed.len(), 2);
        assert!(result.debriefing.destroyed.values().all(|c| c.is_empty()));
    }

    #[test]
    fn test_static_matched_by_first_member_only() {
        let result = run(&[71]);
        assert!(result.debriefing.destroyed_objects.is_empty());
        assert_eq!(result.orphans, vec![71]);

        let result = run(&[70]);
        assert_eq!(result.debriefing.destroyed_objects, vec!["Ammo depot|01"]);
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_smoke_markers_are_not_objects() {
        let result = run(&[77]);
        assert!(result.debriefing.destroyed_objects.is_empty());
        assert_eq!(result.orphans, vec![77]);
    }

    #[test]
    fn test_orphans_leave_tallies_untouched() {
        let baseline = run(&[]);
        let result = run(&[9999]);
        assert_eq!(result.orphans, vec![9999]);
        assert_eq!(result.debriefing, baseline.debriefing);
    }

    #[test]
    fn test_player_losses_are_tallied() {
        let result = run(&[10, 43]);
        assert_eq!(
            result
                .debriefing
                .destroyed_count(&Faction::new("USA"), &UnitType::new("A-10C")),
            1
        );
        assert_eq!(
            result
                .debriefing
                .alive_count(&Faction::new("USA"), &UnitType::new("A-10C")),
            0
        );
    }

    #[test]
    fn test_same_faction_on_both_sides_keeps_kills() {
        let snapshot = snapshot();
        let catalog = TableCatalog::builtin();
        let usa = Faction::new("USA");
        let census = build_census(&snapshot, &usa, &usa, &catalog);
        let result = reconcile(
            [10].into_iter().collect(),
            &snapshot,
            &usa,
            &usa,
            &census,
            &catalog,
        );

        let a10 = UnitType::new("A-10C");
        assert_eq!(result.debriefing.destroyed_count(&usa, &a10), 1);
        assert_eq!(result.debriefing.alive_count(&usa, &a10), 0);
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_alive_is_not_clamped() {
        let mut census = UnitCensus::new();
        let russia = Faction::new("Russia");
        let t55 = UnitType::new("MBT_T_55");
        census.insert(russia.clone(), [(t55.clone(), 1)].into_iter().collect());

        let mut destroyed = FactionTally::new();
        destroyed.insert(russia.clone(), [(t55.clone(), 3)].into_iter().collect());

        let alive = alive_tally(&census, &destroyed);
        assert_eq!(alive[&russia][&t55], -2);
    }

    #[test]
    fn test_alive_only_covers_census_types() {
        let mut census = UnitCensus::new();
        let russia = Faction::new("Russia");
        census.insert(russia.clone(), UnitCounts::new());

        let mut destroyed = FactionTally::new();
        destroyed.insert(
            russia.clone(),
            [(UnitType::new("Mi-24V"), 1)].into_iter().collect(),
        );

        let alive = alive_tally(&census, &destroyed);
        assert!(alive[&russia].is_empty());
    }
}
