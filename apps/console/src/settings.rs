//! # Settings
//!
//! Startup configuration for the console machine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (highest priority)                                    │
//! │     --db ./vendo.db                                                    │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     VENDO_DB_PATH=./vendo.db                                           │
//! │     VENDO_DENOMINATIONS=10,20,50,100,200                               │
//! │     VENDO_RESERVE=10                                                   │
//! │     VENDO_SLOT_LIMIT=20                                                │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     --config <path>, or vendo.toml in the platform config directory    │
//! │     ~/.config/vendo/vendo.toml (Linux)                                 │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     MachineConfig::default(), database in the platform data directory  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/vendo/vendo.db"
//!
//! [machine]
//! denominations = [10, 20, 50, 100, 200]
//! reserve_threshold = 10
//! slot_limit = 20
//! max_product_quantity = 10
//!
//! [[machine.reserve_overrides]]
//! denomination = 10
//! reserve = 25
//! ```
//!
//! Settings are read once; the machine never sees them change.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use vendo_core::{CoreError, Denominations, MachineConfig};

pub const ENV_DB_PATH: &str = "VENDO_DB_PATH";
pub const ENV_DENOMINATIONS: &str = "VENDO_DENOMINATIONS";
pub const ENV_RESERVE: &str = "VENDO_RESERVE";
pub const ENV_SLOT_LIMIT: &str = "VENDO_SLOT_LIMIT";

const CONFIG_FILE: &str = "vendo.toml";
const DATABASE_FILE: &str = "vendo.db";

// =============================================================================
// Errors
// =============================================================================

/// Why settings could not be loaded.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Could not determine the platform data directory")]
    NoDataDir,

    #[error("Failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The machine section is unusable.
    #[error(transparent)]
    Machine(#[from] CoreError),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

// =============================================================================
// Settings
// =============================================================================

/// Database location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `vendo.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Complete console settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub machine: MachineConfig,
}

impl Settings {
    /// Loads settings from file and environment, then validates them.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform default if present)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SettingsResult<Self> {
        let mut settings = Settings::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading settings from file");
                settings = Self::from_file(&path)?;
            } else {
                debug!(?path, "Settings file not found, using defaults");
            }
        }

        settings.apply_env_overrides()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Parses a TOML settings file.
    pub fn from_file(path: &Path) -> SettingsResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses settings from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Applies `VENDO_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> SettingsResult<()> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides from any variable source.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> SettingsResult<()> {
        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(%path, "Database path overridden by environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup(ENV_DENOMINATIONS) {
            let values = value
                .split(',')
                .map(|v| v.trim().parse::<u32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| invalid(ENV_DENOMINATIONS, &value, e))?;
            self.machine.denominations =
                Denominations::new(values).map_err(|e| invalid(ENV_DENOMINATIONS, &value, e))?;
        }

        if let Some(value) = lookup(ENV_RESERVE) {
            self.machine.reserve_threshold = value
                .trim()
                .parse()
                .map_err(|e| invalid(ENV_RESERVE, &value, e))?;
        }

        if let Some(value) = lookup(ENV_SLOT_LIMIT) {
            self.machine.slot_limit = value
                .trim()
                .parse()
                .map_err(|e| invalid(ENV_SLOT_LIMIT, &value, e))?;
        }

        Ok(())
    }

    /// Validates the machine section.
    pub fn validate(&self) -> SettingsResult<()> {
        self.machine.validate()?;
        Ok(())
    }

    /// Database file to open, creating the platform data directory when
    /// no explicit path is configured.
    pub fn database_path(&self) -> SettingsResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(SettingsError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| SettingsError::CreateDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    /// `vendo.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "vendo", "vendo")
    }
}

fn invalid(var: &'static str, value: &str, reason: impl std::fmt::Display) -> SettingsError {
    SettingsError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
