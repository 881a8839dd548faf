//! CLI configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default location of the config file
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tendril")
        .join("config.toml")
}

/// Settings for batch application, read from `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Items the backing store accepts per bulk-write request
    pub max_items_per_request: usize,
    /// Attempts per request, the first one included
    pub max_attempts: u32,
    /// Base of the exponential backoff in milliseconds
    pub starting_delay_ms: u64,
    /// Share of each request the simulated store leaves unprocessed
    pub unprocessed_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items_per_request: 25,
            max_attempts: 5,
            starting_delay_ms: 50,
            unprocessed_rate: 0.0,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file is missing
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &[
            "max_items_per_request",
            "max_attempts",
            "starting_delay_ms",
            "unprocessed_rate",
        ]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "max_items_per_request" => Some(self.max_items_per_request.to_string()),
            "max_attempts" => Some(self.max_attempts.to_string()),
            "starting_delay_ms" => Some(self.starting_delay_ms.to_string()),
            "unprocessed_rate" => Some(self.unprocessed_rate.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "max_items_per_request" => {
                let parsed: usize = value.parse()?;
                if parsed == 0 {
                    anyhow::bail!("max_items_per_request must be at least 1");
                }
                self.max_items_per_request = parsed;
            }
            "max_attempts" => self.max_attempts = value.parse()?,
            "starting_delay_ms" => self.starting_delay_ms = value.parse()?,
            "unprocessed_rate" => {
                let parsed: f64 = value.parse()?;
                if !(0.0..=1.0).contains(&parsed) {
                    anyhow::bail!("unprocessed_rate must be between 0 and 1");
                }
                self.unprocessed_rate = parsed;
            }
            _ => anyhow::bail!(
                "Unknown config key: {} (available: {})",
                key,
                Self::keys().join(", ")
            ),
        }
        Ok(())
    }
}
