// Configuration - data directory resolution

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DigestError, Result};

const APP_DIR: &str = "sales-digest";
const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable overriding the configured data directory
pub const DATA_DIR_ENV: &str = "SALES_DIGEST_DATA_DIR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the spreadsheet store
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve configuration: `cli_data_dir` > env > config file > default
    pub fn load(cli_data_dir: Option<PathBuf>) -> Result<Self> {
        let file = match default_config_path() {
            Some(path) => read_config_file(&path)?,
            None => ConfigFile::default(),
        };
        let env_dir = std::env::var_os(DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::resolve(cli_data_dir, env_dir, file)
    }

    /// Load from an explicit config file, ignoring the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::resolve(None, None, read_config_file(path)?)
    }

    fn resolve(cli: Option<PathBuf>, env: Option<PathBuf>, file: ConfigFile) -> Result<Self> {
        let data_dir = match cli.or(env).or(file.data_dir) {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        debug!("Using data directory {:?}", data_dir);
        Ok(Self { data_dir })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

/// Default store root (`<data home>/sales-digest/uploads`, else `~/.sales-digest/uploads`)
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = dir_spec::data_home() {
        return Ok(dir.join(APP_DIR).join("uploads"));
    }
    let home = std::env::var_os("HOME")
        .ok_or_else(|| DigestError::Config("HOME environment variable not set".to_string()))?;
    Ok(PathBuf::from(home).join(".sales-digest").join("uploads"))
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| DigestError::Config(format!("cannot read {:?}: {}", path, e)))?;
    toml::from_str(&text).map_err(|e| DigestError::Config(format!("{:?}: {}", path, e)))
}
