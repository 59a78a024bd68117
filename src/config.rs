use crate::calendar::WeekStart;
use crate::chat::DEFAULT_MODEL;
use directories::ProjectDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "daymark";
const CONFIG_FILE: &str = "config.yml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not locate a home directory")]
    NoHomeDir,
    #[error("{action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("parsing {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("serializing config: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub week_start: WeekStart,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini_api_key: None,
            week_start: WeekStart::default(),
            model: default_model(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// The stored key, or `None` when unset or blank.
    pub fn api_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Stores a trimmed key. Returns false and leaves the config untouched
    /// when `key` is blank.
    pub fn set_api_key(&mut self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        self.gemini_api_key = Some(key.to_string());
        true
    }

    pub fn clear_api_key(&mut self) {
        self.gemini_api_key = None;
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLocation {
    pub path: PathBuf,
}

impl ConfigLocation {
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path,
            None => project_dirs()?.config_dir().join(CONFIG_FILE),
        };
        Ok(ConfigLocation { path })
    }
}

/// Missing file means defaults; nothing is written until [`save_config`].
pub fn load_config(location: &ConfigLocation) -> Result<Config, ConfigError> {
    if !location.path.exists() {
        return Ok(Config::default());
    }
    let data = fs::read_to_string(&location.path).map_err(|source| ConfigError::Io {
        action: "reading",
        path: location.path.clone(),
        source,
    })?;
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: location.path.clone(),
        source,
    })
}

pub fn save_config(location: &ConfigLocation, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            action: "creating",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let serialized = serde_yaml::to_string(config)?;
    fs::write(&location.path, serialized).map_err(|source| ConfigError::Io {
        action: "writing",
        path: location.path.clone(),
        source,
    })?;
    info!(
        "event=config_save path={} has_key={}",
        location.path.display(),
        config.api_key().is_some()
    );
    Ok(())
}

pub fn log_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_dir().join("logs"))
}

pub fn describe(path: &Path) -> String {
    match home_relative(path) {
        Some(rel) => format!("~/{}", rel.display()),
        None => path.display().to_string(),
    }
}

fn home_relative(path: &Path) -> Option<PathBuf> {
    let home = directories::BaseDirs::new()?.home_dir().to_path_buf();
    path.strip_prefix(home).ok().map(Path::to_path_buf)
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoHomeDir)
}
