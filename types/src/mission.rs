//! Mission world-state snapshot.
//!
//! A snapshot is produced by the mission generator before a mission is flown.
//! Each faction owns its groups split by category; every unit carries the
//! simulator identifier that telemetry events refer to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of one of the two opposing sides in a mission (e.g. "USA", "Russia").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Faction(pub String);

impl Faction {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Faction {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Faction {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Canonical unit-type identity as resolved by a unit catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitType(pub String);

impl UnitType {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Closed set of group categories a faction can field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    Plane,
    Helicopter,
    Vehicle,
    Ship,
    Static,
}

impl UnitCategory {
    /// Categories that are counted and tallied by unit type.
    pub const MOBILE: [UnitCategory; 4] = [
        UnitCategory::Plane,
        UnitCategory::Helicopter,
        UnitCategory::Vehicle,
        UnitCategory::Ship,
    ];

    pub const fn is_mobile(self) -> bool {
        !matches!(self, UnitCategory::Static)
    }
}

/// A single unit as placed in the mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimUnit {
    /// Simulator mission identifier, referenced by `initiatorMissionID`.
    pub id: i64,
    /// Raw simulator type string (e.g. "T-55", "big_smoke").
    pub raw_type: String,
    /// Display name as placed in the mission editor.
    pub name: String,
    /// Set on the unit flown by the human player.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub player_controlled: bool,
}

impl SimUnit {
    pub fn new(id: i64, raw_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            raw_type: raw_type.into(),
            name: name.into(),
            player_controlled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub units: Vec<SimUnit>,
}

impl Group {
    pub fn new(name: impl Into<String>, units: Vec<SimUnit>) -> Self {
        Self {
            name: name.into(),
            units,
        }
    }

    /// Static groups stand for a single named object, represented by their first member.
    pub fn leader(&self) -> Option<&SimUnit> {
        self.units.first()
    }
}

/// Everything one faction has placed in the mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionForces {
    pub name: Faction,
    #[serde(default)]
    pub plane_groups: Vec<Group>,
    #[serde(default)]
    pub helicopter_groups: Vec<Group>,
    #[serde(default)]
    pub vehicle_groups: Vec<Group>,
    #[serde(default)]
    pub ship_groups: Vec<Group>,
    #[serde(default)]
    pub static_groups: Vec<Group>,
}

impl FactionForces {
    pub fn new(name: impl Into<Faction>) -> Self {
        Self {
            name: name.into(),
            plane_groups: Vec::new(),
            helicopter_groups: Vec::new(),
            vehicle_groups: Vec::new(),
            ship_groups: Vec::new(),
            static_groups: Vec::new(),
        }
    }

    pub fn groups(&self, category: UnitCategory) -> &[Group] {
        match category {
            UnitCategory::Plane => &self.plane_groups,
            UnitCategory::Helicopter => &self.helicopter_groups,
            UnitCategory::Vehicle => &self.vehicle_groups,
            UnitCategory::Ship => &self.ship_groups,
            UnitCategory::Static => &self.static_groups,
        }
    }

    /// Iterate every unit of the given categories, in category order then group order.
    pub fn units<'a>(
        &'a self,
        categories: &'a [UnitCategory],
    ) -> impl Iterator<Item = (UnitCategory, &'a SimUnit)> + 'a {
        categories.iter().flat_map(move |&category| {
            self.groups(category)
                .iter()
                .flat_map(move |group| group.units.iter().map(move |unit| (category, unit)))
        })
    }
}

/// World-state of one mission: the forces of every participating faction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MissionSnapshot {
    #[serde(default)]
    pub factions: Vec<FactionForces>,
}

impl MissionSnapshot {
    pub fn new(factions: Vec<FactionForces>) -> Self {
        Self { factions }
    }

    pub fn faction(&self, name: &Faction) -> Option<&FactionForces> {
        self.factions.iter().find(|f| &f.name == name)
    }
}
