//! Editor settings.
//!
//! Settings are plain data with defaults for every field, so a config file
//! only has to mention what it changes.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Upper bound for the merge window. Anything larger would fold unrelated
/// edits into one undo step.
const MAX_MERGE_WINDOW_MS: u64 = 10_000;

/// Kernel configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Consecutive updatable edits closer than this merge into one entry
    pub merge_window_ms: u64,
    /// Serialize each command as soon as it executes
    pub eager_snapshots: bool,
    /// Root name for a fresh scene
    pub scene_name: String,
    /// Name of the default camera node
    pub camera_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            merge_window_ms: 500,
            eager_snapshots: true,
            scene_name: "Untitled".to_string(),
            camera_name: "Camera".to_string(),
        }
    }
}

impl EditorConfig {
    /// The merge window as a [`Duration`]
    pub fn merge_window(&self) -> Duration {
        Duration::from_millis(self.merge_window_ms)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    /// Save to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?)?;
        log::info!("Saved editor config to {:?}", path);
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.merge_window_ms > MAX_MERGE_WINDOW_MS {
            return Err(ConfigError::Invalid {
                field: "merge_window_ms",
                reason: format!(
                    "{} exceeds the maximum of {} ms",
                    self.merge_window_ms, MAX_MERGE_WINDOW_MS
                ),
            });
        }
        if self.scene_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "scene_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.merge_window(), Duration::from_millis(500));
        assert!(config.eager_snapshots);
        assert_eq!(config.scene_name, "Untitled");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EditorConfig::from_toml_str("merge_window_ms = 250\n").unwrap();
        assert_eq!(config.merge_window_ms, 250);
        assert_eq!(config.camera_name, "Camera");
    }

    #[test]
    fn test_rejects_huge_merge_window() {
        let err = EditorConfig::from_toml_str("merge_window_ms = 60000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "merge_window_ms", .. }));
    }

    #[test]
    fn test_rejects_empty_scene_name() {
        let err = EditorConfig::from_toml_str("scene_name = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "scene_name", .. }));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EditorConfig {
            merge_window_ms: 120,
            eager_snapshots: false,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(EditorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_and_save() {
        let dir = std::env::temp_dir().join(format!("atelier_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("editor.toml");

        let config = EditorConfig {
            scene_name: "Gallery".to_string(),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
