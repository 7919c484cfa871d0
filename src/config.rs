use crate::list_model::GroupBy;
use crate::search::engine::EngineOptions;
use crate::search::matcher::DEFAULT_REGEX_SIZE_LIMIT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub pinned_only: bool,
    #[serde(default)]
    pub group_by: GroupBy,
    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,
    #[serde(default = "default_pattern_cache_size")]
    pub pattern_cache_size: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_regex_size_limit() -> usize {
    DEFAULT_REGEX_SIZE_LIMIT
}
fn default_pattern_cache_size() -> usize {
    64
}
fn default_debounce_ms() -> u64 {
    300
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pinned_only: false,
            group_by: GroupBy::default(),
            regex_size_limit: default_regex_size_limit(),
            pattern_cache_size: default_pattern_cache_size(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            regex_size_limit: self.regex_size_limit,
            pattern_cache_size: self.pattern_cache_size,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub show_timing: bool,
    #[serde(default = "default_true")]
    pub show_summary: bool,
    #[serde(default)]
    pub max_items_per_group: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_timing: true,
            show_summary: true,
            max_items_per_group: None,
        }
    }
}

impl Config {
    /// Loads the first config file found, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("feedseek/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".feedseek.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(".feedseek.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search]\ngroup_by = \"date\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.search.group_by, GroupBy::Date);
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.search.regex_size_limit, DEFAULT_REGEX_SIZE_LIMIT);
        assert!(config.display.show_summary);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = Config::default();
        config.search.pinned_only = true;
        config.display.max_items_per_group = Some(5);
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.search.pinned_only);
        assert_eq!(loaded.display.max_items_per_group, Some(5));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
