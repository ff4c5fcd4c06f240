//! Shared types for debrief.
//!
//! The mission snapshot types describe the world-state handed over by the
//! mission generator; the debriefing types are the tallies handed back to the
//! campaign once a mission has been reconciled.

pub mod debriefing;
pub mod mission;

pub use debriefing::{Debriefing, FactionTally, UnitCounts};
pub use mission::{Faction, FactionForces, Group, MissionSnapshot, SimUnit, UnitCategory, UnitType};
