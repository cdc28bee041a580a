use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_FILE: &str = "shroud.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub vault_dir: PathBuf,
    pub owner: String,
    pub concurrency: usize,
    pub detector_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_dir: PathBuf::from("./vault"),
            owner: std::env::var("USER").unwrap_or_else(|_| "default".to_string()),
            concurrency: 4,
            detector_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn exists() -> bool {
        PathBuf::from(CONFIG_FILE).exists()
    }

    pub fn load() -> Result<Self> {
        let content = std::fs::read_to_string(CONFIG_FILE)
            .with_context(|| format!("Failed to read {CONFIG_FILE}"))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {CONFIG_FILE}"))
    }

    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(CONFIG_FILE, content)?;
        Ok(())
    }

    pub fn load_or_default() -> Result<Self> {
        if Self::exists() {
            Self::load()
        } else {
            Ok(Self::default())
        }
    }
}
