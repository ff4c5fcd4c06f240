use std::path::{Path, PathBuf};
use std::sync::Arc;

use debrief_core::catalog::default_catalog_path;
use debrief_core::context::AppConfig;
use debrief_core::{
    DebriefingLog, DebriefingOutcome, DebriefingWatcher, MissionInputs, Reconciliation,
    TableCatalog, UnitCatalog, load_snapshot, process_debriefing, synthesize_outcome,
};
use debrief_types::Faction;
use tokio::sync::oneshot;

use crate::MissionArgs;

pub fn parse(path: &Path) -> Result<(), String> {
    let log = DebriefingLog::parse(path).map_err(|e| e.to_string())?;

    println!("Format: {:?}", log.variant);
    if let Some(modified) = log.modified {
        println!("Modified: {}", modified.format("%Y-%m-%d %H:%M:%S"));
    }
    println!(
        "Mission played: {}",
        if log.trigger_state.mission_was_played() { "yes" } else { "no" }
    );
    println!("Destroyed identifiers ({}):", log.dead_units.len());
    for id in log.dead_units.iter() {
        println!("  {id}");
    }
    if !log.issues.is_empty() {
        println!("Skipped events: {}", log.issues.len());
    }
    Ok(())
}

pub fn reconcile(log: &Path, inputs: &MissionInputs) -> Result<(), String> {
    let result = process_debriefing(log, inputs).map_err(|e| e.to_string())?;
    print_reconciliation(&result)
}

pub async fn watch(dir: Option<PathBuf>, inputs: MissionInputs) -> Result<(), String> {
    let config = AppConfig::load();
    let watcher = match dir {
        Some(dir) => DebriefingWatcher::new(dir).with_poll_interval(config.poll_interval()),
        None => DebriefingWatcher::from_config(&config)
            .ok_or("Could not determine the debriefing directory, pass --dir")?,
    };
    println!("Watching {}", watcher.directory().display());

    let (tx, rx) = oneshot::channel::<DebriefingOutcome>();
    let handle = watcher
        .start(Arc::new(inputs), move |outcome| {
            let _ = tx.send(outcome);
        })
        .await
        .map_err(|e| e.to_string())?;

    tokio::select! {
        outcome = rx => {
            let outcome = outcome.map_err(|_| "Watcher ended without a debriefing".to_string())?;
            println!("Debriefing: {}", outcome.path.display());
            let result = outcome.result.map_err(|e| e.to_string())?;
            print_reconciliation(&result)
        }
        _ = tokio::signal::ctrl_c() => {
            let state = handle.stop_and_join().await;
            tracing::debug!(?state, "Watcher stopped");
            println!("Stopped");
            Ok(())
        }
    }
}

pub fn synth(
    mission: &Path,
    player: &str,
    enemy: &str,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let snapshot = load_snapshot(mission).map_err(|e| e.to_string())?;
    let text = synthesize_outcome(&snapshot, &Faction::new(player), &Faction::new(enemy))
        .map_err(|e| e.to_string())?;

    let out = match out {
        Some(path) => path,
        None => AppConfig::load()
            .debriefing_directory()
            .map(|dir| dir.join("debrief.log"))
            .ok_or("Could not determine the debriefing directory, pass --out")?,
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(&out, text).map_err(|e| e.to_string())?;

    println!("Wrote {}", out.display());
    Ok(())
}

pub fn config(set_root: Option<PathBuf>, set_catalog: Option<PathBuf>) -> Result<(), String> {
    let mut config = AppConfig::load();

    if set_root.is_some() || set_catalog.is_some() {
        if let Some(root) = set_root {
            config.user_data_root = Some(root);
        }
        if let Some(catalog) = set_catalog {
            config.catalog_path = Some(catalog);
        }
        config.save().map_err(|e| e.to_string())?;
        println!("Configuration saved");
    }

    match AppConfig::config_path() {
        Ok(path) => println!("Config file: {}", path.display()),
        Err(e) => println!("Config file: unavailable ({e})"),
    }
    let rendered = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
    println!("{rendered}");

    match config.debriefing_directory() {
        Some(dir) => println!("Debriefing directory: {}", dir.display()),
        None => println!("Debriefing directory: not found"),
    }
    Ok(())
}

pub fn mission_inputs(args: &MissionArgs) -> Result<MissionInputs, String> {
    let detailed = load_snapshot(&args.mission).map_err(|e| e.to_string())?;
    let quick = match &args.quick {
        Some(path) => load_snapshot(path).map_err(|e| e.to_string())?,
        None => detailed.clone(),
    };

    Ok(MissionInputs {
        detailed,
        quick,
        player: Faction::new(args.player.as_str()),
        enemy: Faction::new(args.enemy.as_str()),
        catalog: load_catalog(args.catalog.as_deref())?,
    })
}

/// Explicit path, then the configured one, then the default location, then the built-in table.
fn load_catalog(explicit: Option<&Path>) -> Result<Arc<dyn UnitCatalog>, String> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| AppConfig::load().catalog_path)
        .or_else(|| default_catalog_path().filter(|p| p.exists()));

    let catalog = match path {
        Some(path) => TableCatalog::load(&path).map_err(|e| e.to_string())?,
        None => TableCatalog::builtin(),
    };
    Ok(Arc::new(catalog))
}

fn print_reconciliation(result: &Reconciliation) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(&result.debriefing).map_err(|e| e.to_string())?;
    println!("{rendered}");
    if !result.orphans.is_empty() {
        println!("Unmatched identifiers: {:?}", result.orphans);
    }
    Ok(())
}
