//! Unit-type catalog.
//!
//! Maps raw simulator unit records onto canonical unit types and names the
//! auxiliary types that decorate the battlefield but are never scored.
//!
//! [`TableCatalog`] is a data-driven implementation loaded from TOML:
//!
//! ```toml
//! auxiliary = ["SAM_SA_19_Tunguska_2S6", "SAM_Linebacker_M6"]
//!
//! [aliases]
//! "T-55" = "MBT_T_55"
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use debrief_types::{SimUnit, UnitCategory, UnitType};
use serde::Deserialize;

use crate::context::ConfigError;

/// Air-defence escorts attached to every front line for decoration only.
pub const DEFAULT_AUXILIARY: [&str; 2] = ["SAM_SA_19_Tunguska_2S6", "SAM_Linebacker_M6"];

pub trait UnitCatalog: Send + Sync {
    /// Canonical type of a unit, or `None` when the unit is not tracked by type.
    fn resolve(&self, category: UnitCategory, unit: &SimUnit) -> Option<UnitType>;

    /// Types excluded from the pre-mission census.
    fn auxiliary_types(&self) -> &HashSet<UnitType>;

    fn is_auxiliary(&self, unit_type: &UnitType) -> bool {
        self.auxiliary_types().contains(unit_type)
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    auxiliary: Vec<String>,
    #[serde(default)]
    aliases: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    aliases: HashMap<String, UnitType>,
    auxiliary: HashSet<UnitType>,
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the stock auxiliary types and no aliases.
    pub fn builtin() -> Self {
        Self::new().with_auxiliary(DEFAULT_AUXILIARY)
    }

    pub fn with_alias(mut self, raw_type: impl Into<String>, unit_type: impl Into<UnitType>) -> Self {
        self.aliases.insert(raw_type.into(), unit_type.into());
        self
    }

    pub fn with_auxiliary<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<UnitType>,
    {
        self.auxiliary.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let file: CatalogFile = toml::from_str(contents)?;
        Ok(Self {
            aliases: file
                .aliases
                .into_iter()
                .map(|(raw, canonical)| (raw, UnitType(canonical)))
                .collect(),
            auxiliary: file.auxiliary.into_iter().map(UnitType).collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_toml_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn resolve_mobile(&self, raw_type: &str) -> UnitType {
        self.aliases
            .get(raw_type)
            .cloned()
            .unwrap_or_else(|| UnitType::new(raw_type))
    }
}

impl UnitCatalog for TableCatalog {
    fn resolve(&self, category: UnitCategory, unit: &SimUnit) -> Option<UnitType> {
        match category {
            UnitCategory::Plane
            | UnitCategory::Helicopter
            | UnitCategory::Vehicle
            | UnitCategory::Ship => Some(self.resolve_mobile(&unit.raw_type)),
            // Statics are tracked by group name, not by type.
            UnitCategory::Static => None,
        }
    }

    fn auxiliary_types(&self) -> &HashSet<UnitType> {
        &self.auxiliary
    }
}

/// Get the default catalog file location
pub fn default_catalog_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("debrief").join("catalog.toml"))
}
