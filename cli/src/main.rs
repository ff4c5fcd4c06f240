mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Reconcile simulator debriefings against the mission plan")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a debriefing and list the destroyed identifiers
    Parse {
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Reconcile a debriefing against a mission snapshot
    Reconcile {
        #[arg(short, long)]
        log: PathBuf,
        #[command(flatten)]
        mission: MissionArgs,
    },
    /// Wait for the next debriefing and reconcile it
    Watch {
        /// Directory to watch instead of the configured one
        #[arg(short, long)]
        dir: Option<PathBuf>,
        #[command(flatten)]
        mission: MissionArgs,
    },
    /// Write a debriefing in which every enemy ground target was destroyed
    Synth {
        #[arg(short, long)]
        mission: PathBuf,
        #[arg(long)]
        player: String,
        #[arg(long)]
        enemy: String,
        /// Output file; defaults to debrief.log in the debriefing directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show the effective configuration, optionally updating it first
    Config {
        /// Simulator user-data root containing the debriefing directory
        #[arg(long)]
        set_root: Option<PathBuf>,
        /// Unit catalog (TOML) used when none is given on the command line
        #[arg(long)]
        set_catalog: Option<PathBuf>,
    },
}

#[derive(Args)]
struct MissionArgs {
    /// Mission snapshot (JSON) as flown
    #[arg(short, long)]
    mission: PathBuf,
    /// Snapshot used for instantly resolved missions; defaults to --mission
    #[arg(short, long)]
    quick: Option<PathBuf>,
    #[arg(long)]
    player: String,
    #[arg(long)]
    enemy: String,
    /// Unit catalog (TOML)
    #[arg(short, long)]
    catalog: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // If DEBRIEF_LOG_PATH is set, append to that file
    if let Ok(path) = std::env::var("DEBRIEF_LOG_PATH") {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(file)
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { path } => commands::parse(&path),
        Commands::Reconcile { log, mission } => {
            let inputs = commands::mission_inputs(&mission)?;
            commands::reconcile(&log, &inputs)
        }
        Commands::Watch { dir, mission } => {
            let inputs = commands::mission_inputs(&mission)?;
            commands::watch(dir, inputs).await
        }
        Commands::Synth {
            mission,
            player,
            enemy,
            out,
        } => commands::synth(&mission, &player, &enemy, out),
        Commands::Config {
            set_root,
            set_catalog,
        } => commands::config(set_root, set_catalog),
    }
}
