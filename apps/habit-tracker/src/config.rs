//! Configuration for habit tracker.

use habit_core::{Goal, NewHabit, WeekStart};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Defaults for new habits.
    #[serde(default)]
    pub defaults: HabitDefaults,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from default path.
    ///
    /// A missing file gives the defaults; an unreadable one is logged and
    /// also gives the defaults.
    pub fn load() -> Self {
        Self::config_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&content).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "ignoring invalid config file");
            Self::default()
        })
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("", "", "habit-tracker")
    }

    /// Get configuration file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|d| d.config_dir().join("config.toml"))
    }

    /// Directory for the database, log file and exports.
    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|d| d.data_dir().to_path_buf())
    }

    /// Get database path, honouring `storage.path`.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.storage
            .path
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("habits.db")))
    }

    /// Get export/import file path.
    pub fn export_path(&self) -> Option<PathBuf> {
        self.storage
            .export_path
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("habits-export.json")))
    }

    /// Get log file path.
    pub fn log_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("habit-tracker.log"))
    }
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// First day of week.
    #[serde(default)]
    pub week_start: WeekStart,
    /// Date format string for the header.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Monday,
            date_format: default_date_format(),
        }
    }
}

fn default_date_format() -> String {
    "%A, %B %d, %Y".to_string()
}

/// Defaults applied to habits created from the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitDefaults {
    /// Goal in days.
    #[serde(default)]
    pub goal: Goal,
    /// Fixed color; cycles through the palette when unset.
    #[serde(default)]
    pub color: Option<String>,
    /// Fixed icon; cycles through the palette when unset.
    #[serde(default)]
    pub icon: Option<String>,
}

impl HabitDefaults {
    /// Creation request for `name` with these defaults and the given goal.
    pub fn request(&self, name: &str, goal: Goal) -> NewHabit {
        NewHabit {
            name: name.to_string(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            goal: Some(goal),
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// JSON export/import file.
    #[serde(default)]
    pub export_path: Option<PathBuf>,
}
