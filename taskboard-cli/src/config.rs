/// Configuration for the taskboard CLI.
/// Reads config.json from ~/.config/taskboard/config.json (or platform equivalent).
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use taskboard_core::search::DEFAULT_FUZZY_THRESHOLD;
use taskboard_core::storage::local::DEFAULT_SLOT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_slot")]
    pub slot: String,
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
}

fn default_slot() -> String {
    DEFAULT_SLOT.to_string()
}

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            slot: default_slot(),
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

/// Default config path: ~/.config/taskboard/config.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("config.json")
}

/// Load config from path. Returns defaults if the file is missing or unparseable.
pub fn load_config(path: &Path) -> BoardConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config {}: {}", path.display(), e);
            BoardConfig::default()
        }),
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            BoardConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("config.json"));
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.slot, "todo-board-state");
        assert_eq!(config.fuzzy_threshold, 0.3);
    }

    #[test]
    fn test_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "dataDir": "/srv/boards", "fuzzyThreshold": 0.5 }"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.data_dir, PathBuf::from("/srv/boards"));
        assert_eq!(config.fuzzy_threshold, 0.5);
        assert_eq!(config.slot, "todo-board-state");
    }

    #[test]
    fn test_invalid_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "slot = 'toml?'").unwrap();
        assert_eq!(load_config(&path), BoardConfig::default());
    }
}
