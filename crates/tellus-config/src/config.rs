//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tellus_subdivide::SubdivisionParams;

use crate::error::ConfigError;

/// Top-level configuration for the subdivision system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Subdivision falloff settings.
    pub subdivision: SubdivisionConfig,
    /// Parallel pipeline settings.
    pub pipeline: PipelineConfig,
    /// Frustum pre-filter settings.
    pub culling: CullingConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Subdivision falloff configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubdivisionConfig {
    /// Maximum subdivision depth. Practically 1..=7; each level
    /// quadruples triangle count near the target.
    pub max_level: u32,
    /// World-space distance at which detail falls to zero.
    pub range: f32,
}

impl SubdivisionConfig {
    /// Bridge into the pass parameters the subdivision crates consume.
    pub fn params(&self) -> SubdivisionParams {
        SubdivisionParams::new(self.max_level, self.range)
    }
}

/// Parallel pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker thread count (0 = derive from CPU count, leaving headroom
    /// for the main and render threads).
    pub worker_threads: usize,
}

/// Frustum pre-filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CullingConfig {
    /// Enable the frustum pre-filter in the subdivide stage.
    pub enabled: bool,
    /// Triangles whose centroid is within this distance of the camera
    /// are never culled, whatever the planes say.
    pub near_override: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for SubdivisionConfig {
    fn default() -> Self {
        Self {
            max_level: 5,
            range: 64.0,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { worker_threads: 0 }
    }
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            near_override: 8.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Persistence ---

/// Name of the settings file inside the config directory.
const SETTINGS_FILE: &str = "tellus.ron";

impl Config {
    fn settings_path(config_dir: &Path) -> PathBuf {
        config_dir.join(SETTINGS_FILE)
    }

    /// Load settings from `config_dir`, writing a default file on first run.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::settings_path(config_dir);
        if !path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("wrote default settings to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        log::info!("loaded settings from {}", path.display());
        Ok(config)
    }

    /// Persist the settings into `config_dir`, creating it if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let serialized = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        let path = Self::settings_path(config_dir);
        std::fs::write(&path, serialized).map_err(|source| ConfigError::Write { path, source })?;
        Ok(())
    }

    /// Pick up external edits: `Some(updated)` when the file on disk
    /// differs from `self`, `None` when it matches.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = Self::settings_path(config_dir);
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let on_disk: Config =
            ron::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;

        if on_disk == *self {
            return Ok(None);
        }
        log::info!("settings changed on disk, reloading");
        Ok(Some(on_disk))
    }
}
