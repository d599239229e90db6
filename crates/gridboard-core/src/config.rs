//! Dashboard configuration file.

use crate::cell_size::GridParams;
use crate::geometry::GridSize;
use crate::lazy::LazyOptions;
use crate::scheduler::Duration;
use crate::spring::{SpringConfig, SpringPreset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("Failed to write config: {0}")]
    Write(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Spring tuning: a named preset or explicit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpringSetting {
    Preset(SpringPreset),
    Custom(SpringConfig),
}

impl Default for SpringSetting {
    fn default() -> Self {
        SpringSetting::Preset(SpringPreset::Default)
    }
}

impl SpringSetting {
    pub fn config(&self) -> SpringConfig {
        match self {
            SpringSetting::Preset(preset) => SpringConfig::from_preset(*preset),
            SpringSetting::Custom(config) => *config,
        }
    }
}

/// Primary dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// `"2x2"` to `"5x5"`. Anything else means 3 columns. When unset, a
    /// layout keeps the grid size it was saved with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<String>,
    pub gap: f64,
    pub padding: f64,
    /// Padding while edit mode is on, leaving room for resize handles.
    pub edit_padding: f64,
    pub announce_delay_ms: u64,
    pub spring: SpringSetting,
    pub lazy: LazyOptions,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            grid_size: None,
            gap: 16.0,
            padding: 16.0,
            edit_padding: 24.0,
            announce_delay_ms: 100,
            spring: SpringSetting::default(),
            lazy: LazyOptions::default(),
        }
    }
}

impl DashboardConfig {
    /// Load a configuration from disk.
    ///
    /// A missing or empty file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        if content.trim().is_empty() {
            log::debug!("No dashboard config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let mut config: DashboardConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.sanitize();
        Ok(config)
    }

    /// Save the configuration to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Clamp negative spacing to zero.
    pub fn sanitize(&mut self) {
        for (name, value) in [
            ("gap", &mut self.gap),
            ("padding", &mut self.padding),
            ("edit_padding", &mut self.edit_padding),
        ] {
            if !(*value >= 0.0) {
                log::warn!("Dashboard {} {} is invalid, using 0", name, value);
                *value = 0.0;
            }
        }
    }

    /// Parsed grid size; unset or unknown values mean 3x3.
    pub fn grid(&self) -> GridSize {
        self.grid_override().unwrap_or_default()
    }

    /// Grid size explicitly requested by this config, if any.
    pub fn grid_override(&self) -> Option<GridSize> {
        self.grid_size.as_deref().map(GridSize::parse_lossy)
    }

    /// Padding for the current mode.
    pub fn padding_for(&self, is_edit_mode: bool) -> f64 {
        if is_edit_mode {
            self.edit_padding
        } else {
            self.padding
        }
    }

    pub fn grid_params(&self, is_edit_mode: bool) -> GridParams {
        GridParams {
            grid_size: self.grid(),
            gap: self.gap,
            padding: self.padding_for(is_edit_mode),
        }
    }

    pub fn announce_delay(&self) -> Duration {
        Duration::from_millis(self.announce_delay_ms)
    }

    pub fn spring_config(&self) -> SpringConfig {
        self.spring.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load(dir.path().join("dashboard.json")).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.announce_delay(), Duration::from_millis(100));
        assert_eq!(config.spring_config(), SpringConfig::default());
    }

    #[test]
    fn test_partial_file_and_preset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        fs::write(&path, r#"{ "grid_size": "4x4", "gap": -3, "spring": "wobbly" }"#).unwrap();
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.grid(), GridSize::FourByFour);
        assert_eq!(config.gap, 0.0);
        assert!((config.padding - 16.0).abs() < 1e-9);
        let spring = config.spring_config();
        assert!((spring.stiffness - 180.0).abs() < 1e-9);
        assert!((spring.damping - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_spring_and_unknown_grid() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{ "grid_size": "8x8", "spring": { "stiffness": 500, "damping": 40 } }"#,
        )
        .unwrap();
        assert_eq!(config.grid(), GridSize::ThreeByThree);
        let spring = config.spring_config();
        assert!((spring.stiffness - 500.0).abs() < 1e-9);
        assert!((spring.mass - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_size_is_unset_by_default() {
        let config = DashboardConfig::default();
        assert_eq!(config.grid_override(), None);
        assert_eq!(config.grid(), GridSize::ThreeByThree);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("grid_size"));
    }

    #[test]
    fn test_edit_mode_padding() {
        let config = DashboardConfig::default();
        assert_eq!(config.grid_params(false).padding, 16.0);
        assert_eq!(config.grid_params(true).padding, 24.0);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        let mut config = DashboardConfig::default();
        config.grid_size = Some("5x5".to_string());
        config.spring = SpringSetting::Preset(SpringPreset::Stiff);
        config.save(&path).unwrap();
        assert_eq!(DashboardConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(DashboardConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
