use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::connection::Connection;

const APP_NAME: &str = "lms-seed";
const CONFIG_FILE: &str = "config.yaml";

/// The database container the reference loader execs into.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub name: String,
    /// Container runtime binary, e.g. `docker` or `podman`.
    pub program: String,
    pub superuser: String,
    pub maintenance_database: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "lms-slncity-postgres".to_string(),
            program: "docker".to_string(),
            superuser: "postgres".to_string(),
            maintenance_database: "postgres".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Overwritten on every run and left in place afterwards.
    pub staging_path: PathBuf,
    pub startup_delay_secs: u64,
    pub fixtures: Option<PathBuf>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            staging_path: PathBuf::from("/tmp/seed.sql"),
            startup_delay_secs: 3,
            fixtures: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: Connection,
    pub container: ContainerConfig,
    pub reference: ReferenceConfig,
}

impl Config {
    /// Read `path` when given, else the per-user config file if one exists,
    /// else the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = get_app_config_path()?.join(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };
        let data = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_yaml(&data).with_context(|| format!("failed to parse YAML at {}", path.display()))
    }

    pub fn from_yaml(data: &[u8]) -> Result<Self> {
        Ok(serde_yaml::from_slice(data)?)
    }
}

/// Return the application config directory path, creating it if missing.
pub fn get_app_config_path() -> Result<PathBuf> {
    let mut path = if cfg!(target_os = "macos") {
        dirs_next::home_dir().map(|h| h.join(".config"))
    } else {
        dirs_next::config_dir()
    }
    .ok_or_else(|| anyhow::anyhow!("failed to find os config dir."))?;

    path.push(APP_NAME);
    fs::create_dir_all(&path)?;
    Ok(path)
}
