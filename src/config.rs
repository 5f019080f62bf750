use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    #[serde(default)]
    pub preferences: Preferences,
    pub http: HttpConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }

    /// Everything in memory, nothing touches the disk
    pub fn ephemeral() -> Config {
        Config {
            version: 1,
            database: Database {
                in_memory: true,
                path: None,
            },
            preferences: Preferences::default(),
            http: HttpConfig {
                bind_addr: "127.0.0.1".to_string(),
                port: 8080,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

/// Blob store location
#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

/// Preference store location. No path keeps preferences in memory.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Preferences {
    pub path: Option<PathBuf>,
}
