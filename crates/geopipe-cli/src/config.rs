//! Configuration loading from TOML files

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for geopipe
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root directory for raw/interim/processed artifacts
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        let dir = std::env::var_os("GEOPIPE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));
        Self { dir }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the ogr2ogr binary
    pub ogr2ogr: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ogr2ogr: PathBuf::from("ogr2ogr"),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./geopipe.toml (current directory)
    /// 2. ~/.config/geopipe/config.toml
    ///
    /// If no config file is found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("geopipe.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "geopipe") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[data]
dir = "/srv/geodata"

[engine]
ogr2ogr = "/opt/gdal/bin/ogr2ogr"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.data.dir, PathBuf::from("/srv/geodata"));
        assert_eq!(config.engine.ogr2ogr, PathBuf::from("/opt/gdal/bin/ogr2ogr"));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[data]\ndir = \"/srv/geodata\"\n").unwrap();
        assert_eq!(config.engine.ogr2ogr, PathBuf::from("ogr2ogr"));
    }
}
