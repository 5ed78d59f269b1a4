//! Runtime configuration.
//!
//! Resolved once at startup from an optional JSON config file under the
//! platform config directory, with environment variables taking precedence.
//! Remote settings are optional: without them every session is a guest
//! session and nothing ever leaves the device.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::db::models::Priority;
use crate::error::Result;

pub const ENV_DATA_DIR: &str = "GOREV_DATA_DIR";
pub const ENV_REMOTE_URL: &str = "GOREV_REMOTE_URL";
pub const ENV_REMOTE_KEY: &str = "GOREV_REMOTE_KEY";

const APP_DIR: &str = "gorev";
const DB_FILE: &str = "gorev.db";
const CONFIG_FILE: &str = "config.json";

/// Endpoint of the remote record/identity service plus its publishable key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub remote: Option<RemoteConfig>,
    /// Priority applied to drafts that do not choose one. The entry form and
    /// the edit dialog historically disagreed on this value; it is a single
    /// explicit setting now, and `medium` is the documented default.
    pub default_priority: Priority,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    remote: Option<RemoteConfig>,
    default_priority: Option<Priority>,
}

impl Config {
    /// Resolve configuration from file, environment and platform defaults,
    /// creating the data directory if it does not exist yet.
    pub fn load() -> Result<Self> {
        let file = read_config_file()?;
        let env_data_dir = env::var(ENV_DATA_DIR).ok().map(PathBuf::from);
        Self::from_parts(file, env_remote(), env_data_dir)
    }

    fn from_parts(
        file: ConfigFile,
        env_remote: Option<RemoteConfig>,
        env_data_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let data_dir = env_data_dir
            .or(file.data_dir)
            .unwrap_or_else(default_data_dir);

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self {
            data_dir,
            remote: env_remote.or(file.remote),
            default_priority: file.default_priority.unwrap_or_default(),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

fn read_config_file() -> Result<ConfigFile> {
    let Some(path) = config_file_path() else {
        return Ok(ConfigFile::default());
    };
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn env_remote() -> Option<RemoteConfig> {
    let base_url = env::var(ENV_REMOTE_URL).ok()?;
    let anon_key = env::var(ENV_REMOTE_KEY).ok()?;
    Some(RemoteConfig { base_url, anon_key })
}
