//! Synthetic mission outcomes for exercising the pipeline without flying.
//!
//! Writes a telemetry log in which the first player-controlled plane takes
//! control and then every enemy ground target dies.

use debrief_types::{Faction, MissionSnapshot, SimUnit};

use crate::error::{DebriefError, Result};
use crate::reconcile::SMOKE_MARKER_TYPE;

/// Mission clock at which the synthetic mission starts, in seconds.
const START_TIME: i64 = 57_600;
const CALLSIGN: &str = "debrief";

/// Generate a log reporting every enemy vehicle and strike target destroyed.
pub fn synthesize_outcome(
    snapshot: &MissionSnapshot,
    player: &Faction,
    enemy: &Faction,
) -> Result<String> {
    let pilot = snapshot
        .faction(player)
        .and_then(|forces| {
            forces
                .plane_groups
                .iter()
                .flat_map(|group| &group.units)
                .find(|unit| unit.player_controlled)
        })
        .ok_or_else(|| {
            DebriefError::Synthesis(format!("no player-controlled plane in faction {player}"))
        })?;

    let targets = enemy_targets(snapshot, enemy);
    if targets.is_empty() {
        return Err(DebriefError::Synthesis(format!(
            "no vehicles or strike targets in faction {enemy}"
        )));
    }

    tracing::info!(
        pilot = %pilot.name,
        pilot_id = pilot.id,
        targets = targets.len(),
        "Synthesizing mission outcome"
    );

    Ok(render_log(pilot, &targets))
}

/// Enemy vehicles plus named static targets, smoke markers excluded.
fn enemy_targets<'a>(snapshot: &'a MissionSnapshot, enemy: &Faction) -> Vec<&'a SimUnit> {
    let Some(forces) = snapshot.faction(enemy) else {
        return Vec::new();
    };

    let vehicles = forces.vehicle_groups.iter().flat_map(|g| &g.units);
    let statics = forces
        .static_groups
        .iter()
        .flat_map(|g| &g.units)
        .filter(|unit| unit.name.contains('|') && unit.raw_type != SMOKE_MARKER_TYPE);

    vehicles.chain(statics).collect()
}

fn render_log(pilot: &SimUnit, targets: &[&SimUnit]) -> String {
    let mut lines: Vec<String> = vec![
        "events =".into(),
        "{".into(),
        "\t[1] =".into(),
        "\t{".into(),
        "\t\ttype\t=\t\"mission start\",".into(),
        format!("\t\tt\t=\t{START_TIME},"),
        "\t}, -- end of [1]".into(),
        "\t[2] =".into(),
        "\t{".into(),
        "\t\ttype\t=\t\"under control\",".into(),
        format!("\t\tinitiatorPilotName\t=\t\"{}\",", quote(CALLSIGN)),
        format!("\t\ttarget\t=\t\"{}\",", quote(&pilot.name)),
        format!("\t\tt\t=\t{START_TIME},"),
        format!("\t\ttargetMissionID\t=\t\"{}\",", pilot.id),
        "\t}, -- end of [2]".into(),
    ];

    for (index, target) in (3..).zip(targets) {
        lines.push(format!("\t[{index}] ="));
        lines.push("\t{".into());
        lines.push(format!("\t\tt\t=\t{},", START_TIME + 1));
        lines.push("\t\ttype\t=\t\"dead\",".into());
        lines.push(format!("\t\tinitiatorMissionID\t=\t\"{}\",", target.id));
        lines.push(format!("\t}}, -- end of [{index}]"));
    }

    lines.extend([
        "} -- end of events".into(),
        format!("callsign\t=\t\"{}\"", quote(CALLSIGN)),
        "result\t=\t0".into(),
        "world_state =".into(),
        "{".into(),
        "\t[1] =".into(),
        "\t{".into(),
        "\t\ty\t=\t1,".into(),
        "\t\tx\t=\t1,".into(),
        "\t\theading\t=\t0,".into(),
        format!("\t\tunitId\t=\t{},", pilot.id),
        "\t\tspeed\t=\t0,".into(),
        format!("\t\ttype\t=\t\"{}\",", quote(&pilot.raw_type)),
        "\t}, -- end of [1]".into(),
        "} -- end of world_state".into(),
        String::new(),
    ]);

    lines.join("\n")
}

fn quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
