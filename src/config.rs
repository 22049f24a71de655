use crate::view::SortKey;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// winget executable
    pub program: String,
    /// Run through `pwsh` with UTF-8 output forced
    pub use_powershell: bool,
    /// Source passed to `winget list --source`
    pub list_source: String,
    /// Pass `--include-unknown` to bulk upgrades
    pub include_unknown: bool,
    pub audit_log: PathBuf,
    pub default_sort: SortKey,
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program: "winget".to_string(),
            use_powershell: cfg!(windows),
            list_source: "winget".to_string(),
            include_unknown: true,
            audit_log: home_dir().join(".winget-desk/logs/audit.log"),
            default_sort: SortKey::Name,
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        home_dir().join(".config/winget-desk/config.toml")
    }

    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
