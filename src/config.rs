use crate::storage::Storage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub default_minutes: u32,
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_minutes: 25,
            tick_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Countdown sampling period, kept between 1 ms and one minute.
    pub fn tick_interval(&self) -> chrono::Duration {
        let ms = i64::try_from(self.tick_interval_ms).unwrap_or(i64::MAX);
        chrono::Duration::milliseconds(ms.clamp(1, 60_000))
    }
}

pub fn load_config() -> Result<Config> {
    let path = Storage::get_base_dir()?.join("config.json");
    load_config_from(&path)
}

/// Reads the config at `path`, writing the defaults there first if it is missing.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(path, data)?;
        return Ok(config);
    }

    let data = fs::read_to_string(path)?;
    let config = serde_json::from_str(&data)?;
    Ok(config)
}
