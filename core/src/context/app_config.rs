//! Application configuration and user-data locations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const APP_NAME: &str = "debrief";

/// Directory under the user-data root that the simulator writes debriefings to.
pub const DEFAULT_DEBRIEFING_DIR: &str = "liberation_debriefings";

/// Fixed delay between directory scans while waiting for a debriefing.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Simulator user-data root; detected from the home directory when unset.
    pub user_data_root: Option<PathBuf>,
    pub debriefing_dir_name: String,
    pub poll_interval_ms: u64,
    /// Unit catalog TOML; the builtin catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_data_root: None,
            debriefing_dir_name: DEFAULT_DEBRIEFING_DIR.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            catalog_path: None,
        }
    }
}

impl AppConfig {
    /// Load from the platform config directory, falling back to defaults.
    pub fn load() -> Self {
        match confy::load(APP_NAME, None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, self)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, None)?)
    }

    pub fn user_data_root(&self) -> Option<PathBuf> {
        self.user_data_root.clone().or_else(default_user_data_root)
    }

    /// Where the simulator drops debriefing logs.
    pub fn debriefing_directory(&self) -> Option<PathBuf> {
        self.user_data_root()
            .map(|root| root.join(&self.debriefing_dir_name))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// `~/Saved Games/DCS.openbeta` when present, otherwise `~/Saved Games/DCS`.
pub fn default_user_data_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| user_data_root_in(&home))
}

fn user_data_root_in(home: &Path) -> PathBuf {
    let saved_games = home.join("Saved Games");
    let openbeta = saved_games.join("DCS.openbeta");
    if openbeta.exists() {
        openbeta
    } else {
        saved_games.join("DCS")
    }
}

/// Errors that can occur during config loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config store error: {0}")]
    Store(#[from] confy::ConfyError),

    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
